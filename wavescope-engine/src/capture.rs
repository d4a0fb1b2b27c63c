//! Single-slot latest-wins capture handoff.
//!
//! The input audio callback produces blocks; the analysis consumer pulls
//! them on its own cadence. Capacity is exactly one block and a new block
//! unconditionally replaces an unread one: real-time correctness means the
//! producer never stalls, even with a slow or absent consumer. This is
//! deliberately not a FIFO.
//!
//! Implementation: a `try_lock` single-slot exchange. The consumer holds
//! the lock only long enough to `take()` the block, so the producer almost
//! always wins its `try_lock`; on the rare contended push the new block is
//! dropped and counted instead of blocking the audio thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One captured block of mono samples.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureBlock {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Non-blocking single-producer/single-consumer overwrite slot of depth 1.
pub struct CaptureSlot {
    slot: Mutex<Option<CaptureBlock>>,
    dropped: AtomicUsize,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Producer side, called from the input callback. Copies `samples` into
    /// the slot, overwriting any unread block (latest-wins). Never blocks:
    /// if the consumer happens to hold the lock, the block is dropped and
    /// the drop counter bumped. The slot's allocation is reused when its
    /// capacity suffices, so steady-state pushes do not allocate.
    pub fn push(&self, samples: &[f32], sample_rate: u32) {
        match self.slot.try_lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(block) if block.samples.capacity() >= samples.len() => {
                    block.samples.clear();
                    block.samples.extend_from_slice(samples);
                    block.sample_rate = sample_rate;
                }
                _ => {
                    *guard = Some(CaptureBlock {
                        samples: samples.to_vec(),
                        sample_rate,
                    });
                }
            },
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Consumer side. Removes and returns the held block, or `None` when
    /// the slot is empty. Returns immediately either way.
    pub fn try_pop(&self) -> Option<CaptureBlock> {
        match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Discard any in-flight block (used when the input stream is
    /// reconfigured and stale data must not reach the display).
    pub fn clear(&self) {
        match self.slot.lock() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    /// Number of blocks dropped because the producer found the slot busy.
    pub fn dropped_blocks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for CaptureSlot {
    fn default() -> Self {
        Self::new()
    }
}
