//! Approximate membership queries: a quotient filter that can be doubled and
//! merged, plus a plain Bloom filter behind the same trait.

pub mod amq;
pub mod bloom_filter;
pub mod builder;
pub mod error;
pub mod fingerprint;
pub mod fingerprint_iter;
pub mod log;
pub mod quotient_filter;
pub mod quotienting;
pub(crate) mod slot_store;
pub mod stats;

pub use amq::ApproxMemQuery;
pub use error::{AmqError, Result};
pub use fingerprint::Fingerprint;
pub use quotient_filter::QuotientFilter;
pub use quotienting::{QuotientAndRemainder, QuotientingStrategy};
