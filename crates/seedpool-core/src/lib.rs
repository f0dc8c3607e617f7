//! # seedpool-core
//!
//! A cryptographically-seeded pseudo-random number generator for devices
//! without an operating-system entropy source.
//!
//! The generator hashes an evolving 64-byte state block through the one-way
//! ChaCha20 block function and manages everything around that primitive:
//!
//! - **Entropy accounting** — noise sources stir in samples with a
//!   self-assessed credit (bits); `rand()` debits credits but never blocks,
//!   and `available()` tells callers whether a request is fully covered.
//! - **Forward secrecy** — every output-producing operation ends in a rekey
//!   that overwrites the secret region with one-way output, so a captured
//!   state cannot be wound backwards.
//! - **Persistence** — a 49-byte seed record carries accumulated entropy
//!   across power loss; the record is always one one-way step behind the
//!   live state, so a storage snapshot reveals nothing already emitted.
//!
//! ## Quick start
//!
//! ```no_run
//! use seedpool_core::{FileStorage, Rng, SEED_SIZE};
//! use seedpool_core::sources::TimingJitterSource;
//!
//! let storage = FileStorage::open("seed.bin", SEED_SIZE as u64)?;
//! let mut rng = Rng::new(Box::new(storage));
//! rng.begin("MyApp 1.0", 0);
//! rng.add_noise_source(Box::new(TimingJitterSource));
//!
//! loop {
//!     rng.loop_once();
//!
//!     let mut nonce = [0u8; 12];
//!     if rng.available(nonce.len()) {
//!         rng.rand(&mut nonce);
//!         // use nonce ...
//!     }
//! #   break;
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! The generator is single-threaded by design: one logical owner, `&mut self`
//! everywhere, no locks. Known limitation: the persisted record carries no
//! integrity tag, so bit corruption that spares the marker byte is accepted
//! silently (indistinguishable from a different seed).

pub mod block;
pub mod chacha;
pub mod clock;
pub mod rng;
pub mod source;
pub mod sources;
pub mod storage;

pub use block::{BLOCK_SIZE, SECRET_SIZE, TAG_SIZE};
pub use clock::{Clock, ManualClock, SystemClock};
pub use rng::{MAX_CREDITS, Rng, SEED_SIZE};
pub use source::{EntropySink, MAX_NOISE_SOURCES, NoiseSource};
pub use storage::{FileStorage, MemoryStorage, SeedStorage};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
