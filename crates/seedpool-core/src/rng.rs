//! The generator engine: rand / stir / rekey, persistence, housekeeping.
//!
//! All randomness derives from repeatedly hashing an evolving 64-byte state
//! block through the one-way ChaCha block function. The engine's job is the
//! bookkeeping around that primitive: entropy-credit accounting, the rekey
//! schedule that gives forward secrecy, and a persisted seed record that
//! carries accumulated entropy across power loss without ever letting a
//! storage snapshot reconstruct live state.

use log::debug;
use zeroize::Zeroize;

use crate::block::{BLOCK_SIZE, SECRET_SIZE, StateBlock};
use crate::chacha;
use crate::clock::{Clock, SystemClock};
use crate::source::{EntropySink, MAX_NOISE_SOURCES, NoiseSource};
use crate::storage::SeedStorage;

/// Size of a saved seed record in storage: one marker byte plus the payload.
pub const SEED_SIZE: u32 = SECRET_SIZE as u32 + 1;

/// Maximum entropy credit the pool can hold, in bits (the secret region is
/// 48 bytes, so more than 384 bits of claimed entropy cannot fit).
pub const MAX_CREDITS: u16 = 384;

// ChaCha hash rounds for every block-hash invocation.
const ROUNDS: u8 = 20;

// Force a rekey after this many keystream blocks within one rand() call.
const REKEY_BLOCKS: u8 = 16;

// Marker byte indicating a valid persisted seed.
const SEED_MARKER: u8 = b'S';

// Pattern written over the seed record by destroy().
const ERASE_BYTE: u8 = 0xFF;

// Default auto-save interval: one hour.
const DEFAULT_AUTOSAVE_MS: u32 = 3_600_000;

/// Cryptographically-seeded pseudo-random number generator.
///
/// Single-threaded by construction: every mutating operation takes
/// `&mut self`, so the single-logical-owner discipline the design relies on
/// is enforced at compile time. Create one with [`Rng::new`], call
/// [`begin`](Rng::begin) once, then [`loop_once`](Rng::loop_once) from the
/// application's main loop and [`rand`](Rng::rand) whenever random bytes
/// are needed.
///
/// ```no_run
/// use seedpool_core::{FileStorage, Rng, SEED_SIZE};
///
/// let storage = FileStorage::open("seed.bin", SEED_SIZE as u64)?;
/// let mut rng = Rng::new(Box::new(storage));
/// rng.begin("MyApp 1.0", 0);
///
/// let mut key = [0u8; 32];
/// if rng.available(key.len()) {
///     rng.rand(&mut key);
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Rng {
    block: StateBlock,
    stream: [u8; BLOCK_SIZE],
    storage: Box<dyn SeedStorage>,
    clock: Box<dyn Clock>,
    sources: [Option<Box<dyn NoiseSource>>; MAX_NOISE_SOURCES],
    source_count: usize,
    address: u32,
    credits: u16,
    first_save: bool,
    timer: u32,
    timeout: u32,
    initialized: bool,
}

impl Rng {
    /// Create a generator over the given storage, using the system clock.
    /// Must be followed by a call to [`begin`](Rng::begin).
    pub fn new(storage: Box<dyn SeedStorage>) -> Self {
        Self::with_clock(storage, Box::new(SystemClock::new()))
    }

    /// Create a generator with an explicit clock. Tests use this with
    /// [`ManualClock`](crate::clock::ManualClock) for deterministic output.
    pub fn with_clock(storage: Box<dyn SeedStorage>, clock: Box<dyn Clock>) -> Self {
        let timer = clock.millis();
        Self {
            block: StateBlock::new(),
            stream: [0u8; BLOCK_SIZE],
            storage,
            clock,
            sources: [None, None, None, None],
            source_count: 0,
            address: 0,
            credits: 0,
            first_save: true,
            timer,
            timeout: DEFAULT_AUTOSAVE_MS,
            initialized: false,
        }
    }

    /// Initialize the generator.
    ///
    /// Installs the constant tag and initializer, XORs in a previously
    /// persisted seed if storage holds a valid record at `address` (mixing
    /// the old entropy without crediting it), rekeys, stirs in the
    /// application `tag` with zero credit so different applications sharing
    /// a device diverge, and immediately re-saves so the old persisted value
    /// is obliterated even if the device resets before the next scheduled
    /// save.
    ///
    /// `tag` should be unique to the application and version, e.g.
    /// `"MyApp 1.0"`. Storage must have [`SEED_SIZE`] bytes free at
    /// `address`.
    pub fn begin(&mut self, tag: &str, address: u32) {
        self.address = address;

        self.block.reset();
        if self.storage.read_byte(address) == SEED_MARKER {
            let mut seed = [0u8; SECRET_SIZE];
            self.storage.read_block(address + 1, &mut seed);
            for (byte, stored) in self.block.secret_mut().iter_mut().zip(seed.iter()) {
                *byte ^= stored;
            }
            seed.zeroize();
            debug!("mixed persisted seed from address {address}");
        } else {
            debug!("no persisted seed at address {address}, starting from initializer");
        }

        // The persisted seed earns no credits: it is old entropy, not new.
        self.credits = 0;

        // Arm the one-shot save that fires the first time credits max out.
        self.first_save = true;

        self.initialized = true;
        self.rekey();

        if !tag.is_empty() {
            self.stir(tag.as_bytes(), 0);
        }

        // Obliterate the previous persisted value so a reset without a later
        // save() cannot replay this session's starting point.
        self.save();
    }

    /// Register a noise source, up to a maximum of [`MAX_NOISE_SOURCES`].
    /// Registrations beyond capacity are silently ignored.
    pub fn add_noise_source(&mut self, mut source: Box<dyn NoiseSource>) {
        if self.source_count < MAX_NOISE_SOURCES {
            source.added();
            self.sources[self.source_count] = Some(source);
            self.source_count += 1;
        }
    }

    /// Set the interval between automatic seed saves. Zero is coerced to one
    /// minute. The default is one hour; saving more often wears out EEPROM
    /// class storage faster.
    pub fn set_auto_save_time(&mut self, minutes: u16) {
        let minutes = if minutes == 0 { 1 } else { minutes };
        self.timeout = u32::from(minutes) * 60_000;
    }

    /// Fill `data` with pseudorandom bytes.
    ///
    /// Debits `8 * data.len()` bits of entropy credit, flooring at zero.
    /// Never blocks: credits are advisory, and output is produced from
    /// whatever state the pool has. Callers that need an entropy guarantee
    /// must check [`available`](Rng::available) first.
    ///
    /// The state block is rekeyed after every 16 keystream blocks within
    /// this call and unconditionally once more before returning, so no two
    /// calls can ever be produced from a replayable pre-rekey state.
    pub fn rand(&mut self, data: &mut [u8]) {
        debug_assert!(self.initialized, "rand() called before begin()");

        let debit = data.len().saturating_mul(8);
        self.credits = if debit >= usize::from(self.credits) {
            0
        } else {
            self.credits - debit as u16
        };

        let mut blocks: u8 = 0;
        for chunk in data.chunks_mut(BLOCK_SIZE) {
            if blocks >= REKEY_BLOCKS {
                self.rekey();
                blocks = 1;
            } else {
                blocks += 1;
            }

            self.block.increment_counter();
            chacha::hash_core(&mut self.stream, self.block.as_bytes(), ROUNDS);
            chunk.copy_from_slice(&self.stream[..chunk.len()]);
        }

        self.rekey();
    }

    /// True if the pool's entropy credits cover a [`rand`](Rng::rand)
    /// request of `len` bytes.
    ///
    /// Requests of 48 bytes or more are judged only against whether the pool
    /// is fully saturated, since the pool cannot hold more than 384 bits
    /// regardless of request size. Applications with stricter requirements
    /// should split large requests and let the pool refill between chunks.
    pub fn available(&self, len: usize) -> bool {
        if len >= usize::from(MAX_CREDITS) / 8 {
            self.credits >= MAX_CREDITS
        } else {
            len * 8 <= usize::from(self.credits)
        }
    }

    /// Current entropy credit, in bits.
    pub fn credits(&self) -> u16 {
        self.credits
    }

    /// Number of registered noise sources.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Generate a fresh seed record, write it to storage, and rekey.
    ///
    /// The record is one block-hash output derived from the current state;
    /// the trailing rekey makes the live state diverge from it immediately,
    /// so a captured storage snapshot cannot be used to recompute anything
    /// this session has emitted or will emit. Also resets the auto-save
    /// timer.
    pub fn save(&mut self) {
        self.block.increment_counter();
        chacha::hash_core(&mut self.stream, self.block.as_bytes(), ROUNDS);
        self.storage
            .write_block(self.address + 1, &self.stream[..SECRET_SIZE]);
        self.storage.write_byte(self.address, SEED_MARKER);
        self.rekey();
        self.timer = self.clock.millis();
        debug!("seed record saved at address {}", self.address);
    }

    /// Run one housekeeping pass: poll every registered noise source, then
    /// save the seed if the auto-save interval has elapsed. Call this once
    /// per iteration of the application's main loop.
    pub fn loop_once(&mut self) {
        for i in 0..self.source_count {
            // Detach the source for the duration of its callback so it can
            // stir into this generator without aliasing it.
            if let Some(mut source) = self.sources[i].take() {
                source.poll(self);
                self.sources[i] = Some(source);
            }
        }

        if self.clock.millis().wrapping_sub(self.timer) >= self.timeout {
            self.save();
        }
    }

    /// Destroy the pool: zero the state block and output buffer and
    /// overwrite the full persisted record with the erase pattern.
    ///
    /// After this call the generator is unusable until [`begin`](Rng::begin)
    /// is called again.
    pub fn destroy(&mut self) {
        self.block.zeroize();
        self.stream.zeroize();
        for i in 0..SEED_SIZE {
            self.storage.write_byte(self.address + i, ERASE_BYTE);
        }
        self.credits = 0;
        self.initialized = false;
        debug!("pool destroyed, seed record erased");
    }

    /// Advance the state through one one-way step.
    ///
    /// Increments the counter, hashes the block, and overwrites the secret
    /// region with the output (tag untouched). The pre-rekey secret becomes
    /// unrecoverable from anything derived afterwards, which is the forward
    /// secrecy primitive every other operation leans on. The jitter word is
    /// then perturbed with a microsecond timer sample; that helps only when
    /// requests arrive on an unpredictable schedule, so regular stir() calls
    /// with real noise remain necessary.
    fn rekey(&mut self) {
        self.block.increment_counter();
        chacha::hash_core(&mut self.stream, self.block.as_bytes(), ROUNDS);
        self.block.set_secret(&self.stream[..SECRET_SIZE]);
        self.block.xor_jitter(self.clock.micros());
    }
}

impl EntropySink for Rng {
    /// Stir external bytes into the pool.
    ///
    /// `credit_bits` is clamped to `8 * data.len()` (a source cannot claim
    /// more entropy than it supplied) and added to the pool's credits,
    /// saturating at [`MAX_CREDITS`]. The data is XORed into the secret
    /// region in 48-byte chunks with a rekey between chunks, diffusing each
    /// chunk through the one-way permutation before the next is folded in;
    /// chosen input therefore cannot cancel earlier contributions. Empty
    /// input still forces one rekey.
    ///
    /// The first time credits reach the maximum after `begin()`, an implicit
    /// [`save`](Rng::save) captures the fully-seeded pool before any power
    /// loss can discard it. The latch is one-shot: later re-saturations do
    /// not save again (storage wear), and only `begin()` re-arms it.
    fn stir(&mut self, data: &[u8], credit_bits: u16) {
        let credit = usize::from(credit_bits).min(data.len().saturating_mul(8));
        self.credits = (usize::from(self.credits) + credit).min(usize::from(MAX_CREDITS)) as u16;

        if data.is_empty() {
            self.rekey();
        } else {
            for chunk in data.chunks(SECRET_SIZE) {
                for (byte, input) in self.block.secret_mut().iter_mut().zip(chunk.iter()) {
                    *byte ^= input;
                }
                self.rekey();
            }
        }

        if self.first_save && self.credits >= MAX_CREDITS {
            self.first_save = false;
            self.save();
        }
    }
}

impl Rng {
    /// Inherent forwarding of [`EntropySink::stir`] so applications can call
    /// `rng.stir(..)` without importing the trait.
    pub fn stir(&mut self, data: &[u8], credit_bits: u16) {
        EntropySink::stir(self, data, credit_bits);
    }
}

impl Drop for Rng {
    fn drop(&mut self) {
        self.block.zeroize();
        self.stream.zeroize();
    }
}
