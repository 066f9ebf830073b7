/* Copyright 2020 @TwoCookingMice */

use crate::math::bitmap::Bitmap;
use crate::math::constants::Vector3f;

use exr::prelude::*;

// Read the first RGBA layer of an EXR image, alpha is dropped.
pub fn read_exr_from_file(file_path: &str) -> std::result::Result<Bitmap, exr::error::Error> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read_first_rgba_layer_from_file(
        file_path,
        |resolution, _| Bitmap::new(resolution.width(), resolution.height()),
        |bitmap: &mut Bitmap, pos, (r, g, b, _a): (f32, f32, f32, f32)| {
            bitmap[(pos.x(), pos.y())] = Vector3f::new(r, g, b);
        },
    )?;

    let bitmap = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", bitmap.width(), bitmap.height());
    Ok(bitmap)
}

// Write EXR Image to file
pub fn write_exr_to_file(image: &Bitmap, file_path: &str) -> std::result::Result<(), exr::error::Error> {
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgb_file(file_path, image.width(), image.height(), |x, y| {
        let texel = image[(x, y)];
        (texel.x, texel.y, texel.z)
    })?;
    log::info!("EXR written to: {}.", file_path);
    Ok(())
}
