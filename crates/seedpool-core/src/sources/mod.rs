//! Host-side example noise sources.
//!
//! Real deployments on constrained hardware feed the generator from thermal
//! or oscillator samplers; those live with the board support code, not here.
//! These two sources exist so that hosted applications (and the CLI) can
//! exercise the full stir/credit path with something real behind it.

pub mod jitter;
pub mod os;

pub use jitter::TimingJitterSource;
pub use os::OsEntropySource;
