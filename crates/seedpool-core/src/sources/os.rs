//! OS entropy bridge.
//!
//! On hosted platforms the operating system already runs a CSPRNG; this
//! source pipes a block of it into the pool each poll with full credit,
//! which saturates the pool quickly and fires the one-shot first-save. On
//! targets without an OS entropy source this module simply goes unused.

use log::{debug, warn};

use crate::block::SECRET_SIZE;
use crate::source::{EntropySink, NoiseSource};

/// Noise source backed by the operating system CSPRNG.
pub struct OsEntropySource;

impl NoiseSource for OsEntropySource {
    fn added(&mut self) {
        debug!("OS entropy source registered");
    }

    fn poll(&mut self, sink: &mut dyn EntropySink) {
        let mut buf = [0u8; SECRET_SIZE];
        match getrandom::fill(&mut buf) {
            Ok(()) => sink.stir(&buf, (buf.len() * 8) as u16),
            Err(err) => warn!("OS entropy unavailable: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSink {
        bytes: usize,
        credit: u16,
    }

    impl EntropySink for RecordingSink {
        fn stir(&mut self, data: &[u8], credit_bits: u16) {
            self.bytes += data.len();
            self.credit += credit_bits;
        }
    }

    #[test]
    fn poll_supplies_full_credit_block() {
        let mut source = OsEntropySource;
        let mut sink = RecordingSink {
            bytes: 0,
            credit: 0,
        };
        source.poll(&mut sink);
        assert_eq!(sink.bytes, SECRET_SIZE);
        assert_eq!(sink.credit, (SECRET_SIZE * 8) as u16);
    }
}
