use std::marker::PhantomData;

use bitvec::prelude::BitVec;
use murmurhash3::murmurhash3_x86_32 as mmh3;

use crate::amq::ApproxMemQuery;
use crate::error::{AmqError, Result};
use crate::fingerprint::Fingerprint;

/// Produces several hash values for one element.
pub trait MultiHash<T: ?Sized> {
    fn hashes(&self, x: &T, num: usize) -> Vec<u32>;
}

/// Stretches a single fingerprint into many hashes by rotating and mixing it.
/// The hashes are not independent, which is fine when each one only picks a
/// bit out of a large array.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashExtender;

const EXTENDER_ROTATION: u32 = 19;
const EXTENDER_MIX: u32 = 0x8088_AAFF;

impl<T: Fingerprint + ?Sized> MultiHash<T> for HashExtender {
    fn hashes(&self, x: &T, num: usize) -> Vec<u32> {
        let mut buf = x.fingerprint();
        (0..num)
            .map(|_| {
                let hash = buf;
                buf = buf.rotate_right(EXTENDER_ROTATION) ^ EXTENDER_MIX;
                hash
            })
            .collect()
    }
}

/// One MurmurHash3 pass per hash, seeded with the hash index.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededMurmur;

impl<T: AsRef<[u8]> + ?Sized> MultiHash<T> for SeededMurmur {
    fn hashes(&self, x: &T, num: usize) -> Vec<u32> {
        (0..num as u32).map(|seed| mmh3(x.as_ref(), seed)).collect()
    }
}

/// Returns `(m, k)`: bits and hash count for `n` elements at rate `f`.
pub fn calc_parameters(n: usize, f: f64) -> Result<(usize, usize)> {
    if n == 0 {
        return Err(AmqError::invalid("expected element count must be positive"));
    }
    if !(f > 0.0 && f < 1.0) {
        return Err(AmqError::invalid(format!(
            "false positive rate must be in (0, 1), got {f}"
        )));
    }
    let ln2 = std::f64::consts::LN_2;
    let m = ((-f.ln() * n as f64 / ln2.powi(2)) as usize).max(1);
    let k = ((m as f64 * ln2 / n as f64) as usize).max(1);
    Ok((m, k))
}

pub struct BloomFilter<T: ?Sized, H = HashExtender> {
    num_bits: usize,
    num_hashes: usize,
    num_adds: usize,
    hasher: H,
    bit_array: BitVec,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> BloomFilter<T, HashExtender> {
    pub fn new(num_bits: usize, num_hashes: usize) -> Result<Self> {
        Self::with_hasher(num_bits, num_hashes, HashExtender)
    }

    /// Sizes the filter for `n` elements at false positive rate `f`.
    pub fn with_accuracy(n: usize, f: f64) -> Result<Self> {
        let (m, k) = calc_parameters(n, f)?;
        Self::new(m, k)
    }
}

impl<T: ?Sized, H> BloomFilter<T, H> {
    pub fn with_hasher(num_bits: usize, num_hashes: usize, hasher: H) -> Result<Self> {
        if num_bits == 0 {
            return Err(AmqError::invalid("number of bits must be positive"));
        }
        if num_hashes == 0 {
            return Err(AmqError::invalid("number of hashes must be positive"));
        }
        let mut bit_array = BitVec::new();
        bit_array.resize(num_bits, false);
        Ok(BloomFilter {
            num_bits,
            num_hashes,
            num_adds: 0,
            hasher,
            bit_array,
            _marker: PhantomData,
        })
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Adds that set at least one new bit. Repeated elements and elements the
    /// filter already reported as present are not counted.
    pub fn num_adds(&self) -> usize {
        self.num_adds
    }

    fn index(&self, hash: u32) -> usize {
        hash as usize % self.num_bits
    }

    fn contains_hashes(&self, hashes: &[u32]) -> bool {
        hashes.iter().all(|&h| self.bit_array[self.index(h)])
    }
}

impl<T: ?Sized, H: MultiHash<T>> BloomFilter<T, H> {
    pub fn insert(&mut self, item: &T) {
        let hashes = self.hasher.hashes(item, self.num_hashes);
        if self.contains_hashes(&hashes) {
            return;
        }
        for h in hashes {
            let index = self.index(h);
            self.bit_array.set(index, true);
        }
        self.num_adds += 1;
    }

    pub fn lookup(&self, item: &T) -> bool {
        let hashes = self.hasher.hashes(item, self.num_hashes);
        self.contains_hashes(&hashes)
    }
}

impl<T: ?Sized, H: MultiHash<T>> ApproxMemQuery<T> for BloomFilter<T, H> {
    fn add(&mut self, x: &T) -> Result<()> {
        self.insert(x);
        Ok(())
    }

    fn contains(&self, x: &T) -> bool {
        self.lookup(x)
    }
}
