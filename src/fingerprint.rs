//! Native 32-bit fingerprints for filter elements.
//!
//! Small integers fingerprint to themselves so a caller can place an exact
//! quotient and remainder into a filter. Everything byte-shaped goes through
//! MurmurHash3.

use murmurhash3::murmurhash3_x86_32 as mmh3;

/// Width in bits of every fingerprint.
pub const FINGERPRINT_BITS: u32 = u32::BITS;

const MURMUR_SEED: u32 = 0;

pub trait Fingerprint {
    fn fingerprint(&self) -> u32;
}

macro_rules! identity_fingerprint {
    ($($t:ty),*) => {
        $(
            impl Fingerprint for $t {
                #[inline]
                fn fingerprint(&self) -> u32 {
                    *self as u32
                }
            }
        )*
    };
}

identity_fingerprint!(u8, u16, u32, i8, i16, i32, char);

impl Fingerprint for bool {
    #[inline]
    fn fingerprint(&self) -> u32 {
        u32::from(*self)
    }
}

impl Fingerprint for u64 {
    #[inline]
    fn fingerprint(&self) -> u32 {
        (*self ^ (*self >> 32)) as u32
    }
}

impl Fingerprint for i64 {
    #[inline]
    fn fingerprint(&self) -> u32 {
        (*self as u64).fingerprint()
    }
}

impl Fingerprint for [u8] {
    #[inline]
    fn fingerprint(&self) -> u32 {
        mmh3(self, MURMUR_SEED)
    }
}

impl Fingerprint for Vec<u8> {
    #[inline]
    fn fingerprint(&self) -> u32 {
        self.as_slice().fingerprint()
    }
}

impl Fingerprint for str {
    #[inline]
    fn fingerprint(&self) -> u32 {
        self.as_bytes().fingerprint()
    }
}

impl Fingerprint for String {
    #[inline]
    fn fingerprint(&self) -> u32 {
        self.as_bytes().fingerprint()
    }
}

impl<T: Fingerprint + ?Sized> Fingerprint for &T {
    #[inline]
    fn fingerprint(&self) -> u32 {
        (**self).fingerprint()
    }
}
