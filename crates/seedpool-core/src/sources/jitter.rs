//! Timing-jitter noise source.
//!
//! Measures nanosecond deltas between short busy-wait loops and keeps the
//! LSB of each delta. Jitter comes from scheduler preemption, frequency
//! scaling, cache and TLB state, and interrupt arrival. The raw bytes are
//! biased, so only one bit per byte is credited; conditioning is the
//! generator's job.

use std::hint::black_box;
use std::time::Instant;

use log::debug;

use crate::source::{EntropySink, NoiseSource};

const SAMPLES_PER_POLL: usize = 32;

// Spin iterations per sample; long enough for timer resolution to matter.
const SPIN_ITERS: u32 = 200;

/// Noise source that harvests LSBs of busy-loop timing deltas.
pub struct TimingJitterSource;

impl NoiseSource for TimingJitterSource {
    fn added(&mut self) {
        debug!("timing jitter source registered");
    }

    fn poll(&mut self, sink: &mut dyn EntropySink) {
        let mut raw = [0u8; SAMPLES_PER_POLL];
        let mut prev_ns: u64 = 0;

        for (i, byte) in raw.iter_mut().enumerate() {
            let t0 = Instant::now();
            let mut acc: u32 = i as u32;
            for step in 0..SPIN_ITERS {
                acc = black_box(acc.wrapping_mul(31).wrapping_add(step));
            }
            black_box(acc);
            let elapsed_ns = t0.elapsed().as_nanos() as u64;
            *byte = elapsed_ns.wrapping_sub(prev_ns) as u8;
            prev_ns = elapsed_ns;
        }

        // Conservative self-assessment: one bit of entropy per delta byte.
        sink.stir(&raw, raw.len() as u16);
    }
}
