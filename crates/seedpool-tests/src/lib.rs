//! NIST SP 800-22 inspired checks for generator output.
//!
//! A small battery — monobit frequency, runs, and byte-frequency
//! chi-squared — for sanity-checking that the generator's keystream is
//! statistically indistinguishable from uniform noise. Each check returns a
//! [`TestResult`] with a p-value and a pass/fail determination at the 0.01
//! significance level.
//!
//! These are distinguisher checks, not proofs: a generator that fails them
//! is broken, one that passes is merely not obviously broken.

use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::erf::erfc;

/// Significance threshold shared by all checks.
pub const ALPHA: f64 = 0.01;

/// Result of a single randomness check.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub details: String,
}

impl TestResult {
    fn from_p(name: &str, p: f64, statistic: f64, details: String) -> Self {
        Self {
            name: name.to_string(),
            passed: p >= ALPHA,
            p_value: Some(p),
            statistic,
            details,
        }
    }

    fn insufficient(name: &str, needed: usize, got: usize) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            p_value: None,
            statistic: 0.0,
            details: format!("Insufficient data: need {needed}, got {got}"),
        }
    }
}

/// Unpack a byte slice into individual bits (MSB first per byte).
fn to_bits(data: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for &byte in data {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Monobit frequency — proportion of 1s vs 0s should be ~50%.
pub fn monobit_frequency(data: &[u8]) -> TestResult {
    let name = "Monobit Frequency";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return TestResult::insufficient(name, 100, n);
    }
    let s: i64 = bits.iter().map(|&b| if b == 1 { 1i64 } else { -1i64 }).sum();
    let s_obs = (s as f64).abs() / (n as f64).sqrt();
    let p = erfc(s_obs / 2.0_f64.sqrt());
    TestResult::from_p(name, p, s_obs, format!("S={s}, n={n}"))
}

/// Runs — number of uninterrupted runs of identical bits should match the
/// expectation for independent fair bits.
pub fn runs(data: &[u8]) -> TestResult {
    let name = "Runs";
    let bits = to_bits(data);
    let n = bits.len();
    if n < 100 {
        return TestResult::insufficient(name, 100, n);
    }

    let ones: usize = bits.iter().map(|&b| b as usize).sum();
    let pi = ones as f64 / n as f64;

    // Prerequisite: the monobit proportion must be plausible, otherwise the
    // runs statistic is meaningless.
    if (pi - 0.5).abs() >= 2.0 / (n as f64).sqrt() {
        return TestResult {
            name: name.to_string(),
            passed: false,
            p_value: None,
            statistic: pi,
            details: format!("Monobit prerequisite failed: pi={pi:.4}"),
        };
    }

    let v_obs = 1 + bits.windows(2).filter(|w| w[0] != w[1]).count();
    let numerator = (v_obs as f64 - 2.0 * n as f64 * pi * (1.0 - pi)).abs();
    let denominator = 2.0 * (2.0 * n as f64).sqrt() * pi * (1.0 - pi);
    let p = erfc(numerator / denominator);
    TestResult::from_p(name, p, v_obs as f64, format!("runs={v_obs}, pi={pi:.4}"))
}

/// Byte-frequency chi-squared — all 256 byte values should occur with
/// uniform frequency.
pub fn byte_chi_squared(data: &[u8]) -> TestResult {
    let name = "Byte Chi-Squared";
    let n = data.len();
    // Expected count per bin should be at least ~5 for the test to be valid.
    if n < 256 * 5 {
        return TestResult::insufficient(name, 256 * 5, n);
    }

    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }
    let expected = n as f64 / 256.0;
    let chi2: f64 = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum();

    let dist = ChiSquared::new(255.0).expect("valid degrees of freedom");
    let p = 1.0 - dist.cdf(chi2);
    TestResult::from_p(name, p, chi2, format!("chi2={chi2:.1}, n={n}"))
}

/// Run the full battery over one byte sequence.
pub fn run_battery(data: &[u8]) -> Vec<TestResult> {
    vec![monobit_frequency(data), runs(data), byte_chi_squared(data)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedpool_core::{ManualClock, MemoryStorage, Rng, SEED_SIZE};

    fn generator_output(tag: &str, len: usize) -> Vec<u8> {
        let mut rng = Rng::with_clock(
            Box::new(MemoryStorage::new(SEED_SIZE as usize)),
            Box::new(ManualClock::new()),
        );
        rng.begin(tag, 0);
        let mut out = vec![0u8; len];
        rng.rand(&mut out);
        out
    }

    #[test]
    fn generator_output_passes_battery() {
        let data = generator_output("battery", 32 * 1024);
        for result in run_battery(&data) {
            assert!(
                result.passed,
                "{} failed: p={:?} ({})",
                result.name, result.p_value, result.details
            );
        }
    }

    #[test]
    fn battery_rejects_constant_data() {
        let data = vec![0xAAu8; 32 * 1024];
        let results = run_battery(&data);
        assert!(results.iter().any(|r| !r.passed));
    }

    #[test]
    fn battery_rejects_alternating_bits() {
        // 0x55 keeps the monobit proportion at exactly 0.5, but every bit
        // flips, so the run structure is maximally wrong.
        let data = vec![0x55u8; 32 * 1024];
        assert!(monobit_frequency(&data).passed);
        assert!(!runs(&data).passed);
    }

    #[test]
    fn monobit_needs_enough_data() {
        let result = monobit_frequency(&[0xFF; 4]);
        assert!(!result.passed);
        assert!(result.p_value.is_none());
    }

    #[test]
    fn distinct_tags_both_pass() {
        for tag in ["alpha", "beta"] {
            let data = generator_output(tag, 16 * 1024);
            assert!(monobit_frequency(&data).passed, "tag {tag}");
        }
    }
}
