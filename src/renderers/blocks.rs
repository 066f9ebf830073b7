// Copyright @yucwang 2021

use indicatif::{ProgressBar, ProgressStyle};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

/// Lanes per block handed to one worker at a time.
pub const BLOCK_LANES: usize = 4096;

/// Splits `0..total_lanes` into blocks of `block_lanes`, runs `work` on every
/// block from a pool of scoped threads and returns the results in block
/// order, so that any reduction over them is deterministic.
pub fn run_blocks<T, F>(total_lanes: usize, block_lanes: usize, work: F) -> Vec<T>
where
    T: Send,
    F: Fn(Range<usize>) -> T + Sync,
{
    let block_lanes = block_lanes.max(1);
    let total_blocks = (total_lanes + block_lanes - 1) / block_lanes;
    if total_blocks == 0 {
        return Vec::new();
    }

    let progress = ProgressBar::new(total_blocks as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let next_block = Arc::new(AtomicUsize::new(0));
    let thread_count = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(total_blocks);
    let (tx, rx) = mpsc::channel::<(usize, T)>();
    let mut results: Vec<Option<T>> = (0..total_blocks).map(|_| None).collect();
    let work = &work;

    thread::scope(|scope| {
        for _ in 0..thread_count {
            let next_block = Arc::clone(&next_block);
            let tx = tx.clone();
            scope.spawn(move || {
                loop {
                    let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                    if block_index >= total_blocks {
                        break;
                    }
                    let start = block_index * block_lanes;
                    let end = (start + block_lanes).min(total_lanes);
                    if tx.send((block_index, work(start..end))).is_err() {
                        break;
                    }
                }
            });
        }

        drop(tx);
        for (block_index, result) in rx.iter() {
            results[block_index] = Some(result);
            progress.inc(1);
        }
    });
    progress.finish_and_clear();

    results.into_iter().flatten().collect()
}
