use std::fmt;

use crate::error::{AmqError, Result};
use crate::fingerprint::{Fingerprint, FINGERPRINT_BITS};

/// A fingerprint split into the slot index it belongs to and the bits kept in
/// that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuotientAndRemainder {
    pub quotient: u32,
    pub remainder: u32,
}

impl QuotientAndRemainder {
    pub fn new(quotient: u32, remainder: u32) -> Self {
        QuotientAndRemainder {
            quotient,
            remainder,
        }
    }
}

impl fmt::Display for QuotientAndRemainder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.quotient, self.remainder)
    }
}

#[inline]
pub(crate) fn mask(bits: u32) -> u32 {
    if bits >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Splits element fingerprints into quotient and remainder.
///
/// The base split takes the high `base_quotient_bits` of the fingerprint as the
/// quotient and the low `base_remainder_bits` as the remainder. Each doubling
/// moves the top bit of the remainder to the bottom of the quotient, so a
/// filter built with [`doubled`](Self::doubled) agrees with one rebuilt from the
/// pairs of the original filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuotientingStrategy {
    base_quotient_bits: u32,
    base_remainder_bits: u32,
    doublings: u32,
}

impl QuotientingStrategy {
    pub fn new(quotient_bits: u32, remainder_bits: u32) -> Result<Self> {
        if quotient_bits == 0 {
            return Err(AmqError::invalid("quotient bits must be positive"));
        }
        if remainder_bits == 0 {
            return Err(AmqError::invalid("remainder bits must be positive"));
        }
        if quotient_bits + remainder_bits > FINGERPRINT_BITS {
            return Err(AmqError::invalid(format!(
                "quotient plus remainder bits must be {FINGERPRINT_BITS} or less, got {}",
                quotient_bits + remainder_bits
            )));
        }
        Ok(QuotientingStrategy {
            base_quotient_bits: quotient_bits,
            base_remainder_bits: remainder_bits,
            doublings: 0,
        })
    }

    /// Uses every fingerprint bit not in the quotient as remainder.
    pub fn with_quotient_bits(quotient_bits: u32) -> Result<Self> {
        if quotient_bits >= FINGERPRINT_BITS {
            return Err(AmqError::invalid(format!(
                "quotient bits must be in [1, {}], got {quotient_bits}",
                FINGERPRINT_BITS - 1
            )));
        }
        Self::new(quotient_bits, FINGERPRINT_BITS - quotient_bits)
    }

    pub fn quotient_bits(&self) -> u32 {
        self.base_quotient_bits + self.doublings
    }

    pub fn remainder_bits(&self) -> u32 {
        self.base_remainder_bits - self.doublings
    }

    pub fn doublings(&self) -> u32 {
        self.doublings
    }

    pub fn split<T: Fingerprint + ?Sized>(&self, x: &T) -> QuotientAndRemainder {
        self.split_fingerprint(x.fingerprint())
    }

    pub fn split_fingerprint(&self, fingerprint: u32) -> QuotientAndRemainder {
        let base = QuotientAndRemainder {
            quotient: fingerprint >> (FINGERPRINT_BITS - self.base_quotient_bits),
            remainder: fingerprint & mask(self.base_remainder_bits),
        };
        if self.doublings == 0 {
            base
        } else {
            shift_into_quotient(base, self.base_remainder_bits, self.doublings)
        }
    }

    /// Returns a strategy with `k` more quotient bits and `k` fewer remainder
    /// bits.
    pub fn doubled(&self, k: u32) -> Result<Self> {
        self.check_doublings(k)?;
        if self.base_quotient_bits + self.base_remainder_bits == FINGERPRINT_BITS {
            // Every fingerprint bit is already in use, so moving the split point
            // is the same function as shifting bits over.
            return Self::new(self.quotient_bits() + k, self.remainder_bits() - k);
        }
        Ok(QuotientingStrategy {
            doublings: self.doublings + k,
            ..*self
        })
    }

    /// Re-expresses a pair produced by this strategy as the pair that
    /// `self.doubled(k)` produces for the same element.
    pub fn double_pair(&self, qr: QuotientAndRemainder, k: u32) -> Result<QuotientAndRemainder> {
        self.check_doublings(k)?;
        Ok(shift_into_quotient(qr, self.remainder_bits(), k))
    }

    fn check_doublings(&self, k: u32) -> Result<()> {
        if k == 0 {
            return Err(AmqError::invalid("number of doublings must be strictly positive"));
        }
        if k >= self.remainder_bits() {
            return Err(AmqError::invalid(format!(
                "not enough remainder bits ({}) to do {k} doublings",
                self.remainder_bits()
            )));
        }
        Ok(())
    }
}

fn shift_into_quotient(
    qr: QuotientAndRemainder,
    remainder_bits: u32,
    k: u32,
) -> QuotientAndRemainder {
    let kept = remainder_bits - k;
    QuotientAndRemainder {
        quotient: (qr.quotient << k) | (qr.remainder >> kept),
        remainder: qr.remainder & mask(kept),
    }
}
