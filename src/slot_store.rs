use std::fmt;

use bitvec::prelude::*;

use crate::quotienting::mask;

const OCCUPIED: usize = 0;
const CONTINUATION: usize = 1;
const SHIFTED: usize = 2;
const CONTROL_BITS: usize = 3;

/// Packed slot table: each slot is three control bits followed by the
/// remainder, most significant bit first, and slots follow each other with no
/// padding.
#[derive(Clone, PartialEq, Eq)]
pub struct SlotStore {
    bits: BitVec<u64, Msb0>,
    n_slots: usize,
    remainder_bits: u32,
    slot_bits: usize,
}

impl SlotStore {
    /// Allocates `n_slots` empty slots. Callers keep `n_slots` non-zero and
    /// `remainder_bits` in `1..=31`.
    pub fn new(n_slots: usize, remainder_bits: u32) -> Self {
        let slot_bits = remainder_bits as usize + CONTROL_BITS;
        SlotStore {
            bits: bitvec![u64, Msb0; 0; n_slots * slot_bits],
            n_slots,
            remainder_bits,
            slot_bits,
        }
    }

    pub fn len(&self) -> usize {
        self.n_slots
    }

    #[cfg(test)]
    fn is_empty_table(&self) -> bool {
        self.bits.not_any()
    }

    #[cfg(test)]
    fn slot_bits(&self) -> usize {
        self.slot_bits
    }

    #[cfg(test)]
    fn as_bitslice(&self) -> &BitSlice<u64, Msb0> {
        &self.bits
    }

    #[inline]
    fn start(&self, slot: usize) -> usize {
        slot * self.slot_bits
    }

    #[inline]
    pub fn next(&self, slot: usize) -> usize {
        let next = slot + 1;
        if next == self.n_slots {
            0
        } else {
            next
        }
    }

    #[inline]
    pub fn prev(&self, slot: usize) -> usize {
        if slot == 0 {
            self.n_slots - 1
        } else {
            slot - 1
        }
    }

    #[inline]
    pub fn is_occupied(&self, slot: usize) -> bool {
        self.bits[self.start(slot) + OCCUPIED]
    }

    #[inline]
    pub fn set_occupied(&mut self, slot: usize, value: bool) {
        let idx = self.start(slot) + OCCUPIED;
        self.bits.set(idx, value);
    }

    #[inline]
    pub fn is_continuation(&self, slot: usize) -> bool {
        self.bits[self.start(slot) + CONTINUATION]
    }

    #[inline]
    pub fn set_continuation(&mut self, slot: usize, value: bool) {
        let idx = self.start(slot) + CONTINUATION;
        self.bits.set(idx, value);
    }

    #[inline]
    pub fn is_shifted(&self, slot: usize) -> bool {
        self.bits[self.start(slot) + SHIFTED]
    }

    #[inline]
    pub fn set_shifted(&mut self, slot: usize, value: bool) {
        let idx = self.start(slot) + SHIFTED;
        self.bits.set(idx, value);
    }

    /// A slot is empty when none of its control bits are set. The remainder
    /// bits of an empty slot are meaningless.
    #[inline]
    pub fn is_empty(&self, slot: usize) -> bool {
        let start = self.start(slot);
        self.bits[start..start + CONTROL_BITS].not_any()
    }

    #[inline]
    pub fn remainder(&self, slot: usize) -> u32 {
        let start = self.start(slot);
        self.bits[start + CONTROL_BITS..start + self.slot_bits].load_be::<u32>()
    }

    /// Overwrites every bit of a slot. Remainder bits above the slot width are
    /// dropped.
    pub fn fill(
        &mut self,
        slot: usize,
        occupied: bool,
        continuation: bool,
        shifted: bool,
        remainder: u32,
    ) {
        let start = self.start(slot);
        self.bits.set(start + OCCUPIED, occupied);
        self.bits.set(start + CONTINUATION, continuation);
        self.bits.set(start + SHIFTED, shifted);
        self.bits[start + CONTROL_BITS..start + self.slot_bits]
            .store_be::<u32>(remainder & mask(self.remainder_bits));
    }

    /// Copies continuation, shifted and remainder from one slot to another.
    /// The occupied bit belongs to the slot position and is left alone.
    pub fn copy_payload(&mut self, from: usize, to: usize) {
        let from_start = self.start(from);
        let to_start = self.start(to);
        self.bits.copy_within(
            from_start + CONTINUATION..from_start + self.slot_bits,
            to_start + CONTINUATION,
        );
    }

    pub(crate) fn fmt_slot(&self, f: &mut fmt::Formatter<'_>, slot: usize) -> fmt::Result {
        write!(
            f,
            "[o={},c={},s={}: {}]",
            u8::from(self.is_occupied(slot)),
            u8::from(self.is_continuation(slot)),
            u8::from(self.is_shifted(slot)),
            self.remainder(slot)
        )
    }
}

impl fmt::Debug for SlotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotStore")
            .field("n_slots", &self.n_slots)
            .field("remainder_bits", &self.remainder_bits)
            .finish()
    }
}
