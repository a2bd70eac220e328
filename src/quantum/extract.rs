//! Turning measurement histograms into packed entropy and digests.

use super::backend::BackendError;
use super::Histogram;
use sha2::{Digest, Sha256};

/// Smallest bit count a caller may request.
pub const MIN_BITS: usize = 1;
/// Largest bit count a caller may request.
pub const MAX_BITS: usize = 4096;
/// Widest circuit run per shot; every supported backend has at least this many qubits.
pub const MAX_QUBITS: usize = 5;

/// Qubits used per shot for a request of `bits` bits.
#[inline]
pub fn qubit_width(bits: usize) -> usize {
    bits.min(MAX_QUBITS)
}

/// Shots needed to collect at least `bits` bits.
#[inline]
pub fn shot_count(bits: usize) -> u32 {
    (bits / qubit_width(bits).max(1) + 1) as u32
}

/// Exactly `n` measured bits from one execution.
#[derive(Clone)]
pub struct EntropyBatch {
    bits: Vec<u8>,
}

impl EntropyBatch {
    /// Flattens a histogram into exactly `n` bits.
    ///
    /// Entries are walked in histogram order, each bitstring emitted
    /// `count` times. Only as many bits of the final shot as are needed
    /// are taken, so nothing is counted twice.
    pub fn from_histogram(histogram: &Histogram, n: usize) -> Result<Self, BackendError> {
        let mut bits = Vec::with_capacity(n);

        'outer: for (outcome, count) in histogram.iter() {
            let shot = parse_outcome(outcome)?;
            let remaining = n - bits.len();
            let repeats = count.min(remaining.div_ceil(shot.len()) as u64);
            for _ in 0..repeats {
                let take = (n - bits.len()).min(shot.len());
                bits.extend_from_slice(&shot[..take]);
                if bits.len() == n {
                    break 'outer;
                }
            }
        }

        if bits.len() < n {
            return Err(BackendError::InsufficientShots {
                got: histogram.total_bits(),
                need: n,
            });
        }
        Ok(Self { bits })
    }

    /// The measured bits, one per element, each 0 or 1.
    #[inline]
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if the batch holds no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Deviation of the ones-fraction from 0.5.
    pub fn bit_bias(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let ones = self.bits.iter().filter(|&&b| b == 1).count() as f64;
        ones / self.bits.len() as f64 - 0.5
    }

    /// Packs the bits into bytes, most significant bit first.
    pub fn to_bytes(&self) -> Vec<u8> {
        pack_msb_first(&self.bits)
    }
}

impl std::fmt::Debug for EntropyBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyBatch")
            .field("bits", &self.bits.len())
            .field("bit_bias", &format!("{:.4}", self.bit_bias()))
            .finish()
    }
}

/// Parses a measured bitstring; an outcome must carry at least one bit.
fn parse_outcome(outcome: &str) -> Result<Vec<u8>, BackendError> {
    let bits = outcome
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(BackendError::MalformedOutcome(outcome.to_string())),
        })
        .collect::<Result<Vec<u8>, _>>()?;
    if bits.is_empty() {
        return Err(BackendError::MalformedOutcome(outcome.to_string()));
    }
    Ok(bits)
}

/// Packs 0/1 values into bytes, MSB first; unused low bits of the last byte stay zero.
pub fn pack_msb_first(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (j, &bit)| byte | ((bit & 1) << (7 - j)))
        })
        .collect()
}

/// SHA-256 of the raw entropy, as 64 lowercase hex characters.
pub fn digest_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
