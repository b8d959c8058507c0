use crate::error::Result;
use crate::fingerprint::FINGERPRINT_BITS;
use crate::quotient_filter::QuotientFilter;
use crate::quotienting::QuotientingStrategy;

/// Builder for [`QuotientFilter`] geometry.
///
/// ```
/// # use quotient_amq::builder::QuotientFilterBuilder;
/// let filter = QuotientFilterBuilder::new(10)
///     .remainder_bits(12)
///     .build::<str>()
///     .unwrap();
/// assert_eq!(filter.capacity(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct QuotientFilterBuilder {
    quotient_bits: u32,
    remainder_bits: Option<u32>,
    doublings: u32,
}

impl QuotientFilterBuilder {
    pub fn new(quotient_bits: u32) -> Self {
        QuotientFilterBuilder {
            quotient_bits,
            remainder_bits: None,
            doublings: 0,
        }
    }

    /// Remainder width before any doubling. Defaults to every fingerprint bit
    /// left over by the quotient.
    pub fn remainder_bits(mut self, remainder_bits: u32) -> Self {
        self.remainder_bits = Some(remainder_bits);
        self
    }

    /// Starts from a strategy that has already been doubled `doublings` times.
    pub fn doublings(mut self, doublings: u32) -> Self {
        self.doublings = doublings;
        self
    }

    pub fn strategy(&self) -> Result<QuotientingStrategy> {
        let remainder_bits = self
            .remainder_bits
            .unwrap_or_else(|| FINGERPRINT_BITS.saturating_sub(self.quotient_bits));
        let base = QuotientingStrategy::new(self.quotient_bits, remainder_bits)?;
        if self.doublings == 0 {
            Ok(base)
        } else {
            base.doubled(self.doublings)
        }
    }

    pub fn build<T: ?Sized>(&self) -> Result<QuotientFilter<T>> {
        Ok(QuotientFilter::with_strategy(self.strategy()?))
    }
}
