//! Noise source collaborators.
//!
//! A noise source is an external, possibly low-quality entropy producer. The
//! generator polls every registered source once per housekeeping pass; the
//! source responds by stirring whatever samples it has accumulated into the
//! pool, together with a self-assessed entropy credit. Quality is the
//! source's responsibility; the generator only does the accounting.

/// Maximum number of noise sources the generator will track. Registration
/// beyond this capacity silently no-ops; a fixed small registry is a
/// deliberate memory trade-off for constrained targets.
pub const MAX_NOISE_SOURCES: usize = 4;

/// The stirring half of the generator, as seen by a noise source.
///
/// Sources receive this narrowed view during polling rather than the whole
/// generator, which keeps the callback re-entrancy pattern of the design
/// compatible with the borrow checker.
pub trait EntropySink {
    /// Mix `data` into the pool, crediting at most `credit_bits` bits of
    /// entropy for it (clamped to `8 * data.len()`).
    fn stir(&mut self, data: &[u8], credit_bits: u16);
}

/// An external entropy producer polled by the housekeeping pass.
pub trait NoiseSource {
    /// Called exactly once when the source is registered with a generator.
    fn added(&mut self) {}

    /// Called once per housekeeping pass. The source should stir in any
    /// samples accumulated since the last poll, with a conservative
    /// self-assessed credit, or do nothing if it has none ready.
    fn poll(&mut self, sink: &mut dyn EntropySink);
}
