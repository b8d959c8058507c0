//! Quotient filter over a packed slot table.
//!
//! Every element is reduced to a fingerprint and split into a quotient, the
//! index of its canonical slot, and a remainder, the bits actually stored.
//! Remainders that share a quotient form a sorted *run*. Runs that collide are
//! pushed to the right and form a *cluster*, whose first slot is the only one
//! not marked `shifted`. The three control bits per slot are enough to find
//! the run of any quotient by walking back to the start of its cluster and
//! counting forward.
//!
//! A filter is not safe to share between threads without external locking.

use std::fmt;
use std::marker::PhantomData;

use log::{debug, trace, warn};

use crate::amq::ApproxMemQuery;
use crate::error::{AmqError, Result};
use crate::fingerprint::Fingerprint;
use crate::fingerprint_iter::FingerprintIter;
use crate::quotienting::{QuotientAndRemainder, QuotientingStrategy};
use crate::slot_store::SlotStore;
use crate::stats::Stats;

/// Filters up to this many slots print every slot in `Display`.
const DISPLAY_ALL_SLOTS: usize = 8;

pub struct QuotientFilter<T: ?Sized> {
    strategy: QuotientingStrategy,
    slots: SlotStore,
    n_occupied: usize,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> QuotientFilter<T> {
    /// Creates a filter with `2^quotient_bits` slots whose remainder takes
    /// every fingerprint bit the quotient does not.
    pub fn new(quotient_bits: u32) -> Result<Self> {
        Ok(Self::with_strategy(QuotientingStrategy::with_quotient_bits(
            quotient_bits,
        )?))
    }

    pub fn with_strategy(strategy: QuotientingStrategy) -> Self {
        let n_slots = 1usize << strategy.quotient_bits();
        debug!(
            "new quotient filter: {} slots, {} remainder bits",
            n_slots,
            strategy.remainder_bits()
        );
        QuotientFilter {
            strategy,
            slots: SlotStore::new(n_slots, strategy.remainder_bits()),
            n_occupied: 0,
            _marker: PhantomData,
        }
    }

    pub fn strategy(&self) -> &QuotientingStrategy {
        &self.strategy
    }

    /// Number of stored fingerprints. Elements that collide on both quotient
    /// and remainder are counted once.
    pub fn len(&self) -> usize {
        self.n_occupied
    }

    pub fn is_empty(&self) -> bool {
        self.n_occupied == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.n_occupied == self.slots.len()
    }

    pub fn add(&mut self, x: &T) -> Result<()>
    where
        T: Fingerprint,
    {
        if self.is_full() {
            warn!("refusing insert: filter is full ({} slots)", self.capacity());
            return Err(AmqError::FilterFull {
                capacity: self.capacity(),
            });
        }
        let qr = self.strategy.split(x);
        self.add_qr(qr);
        Ok(())
    }

    pub fn contains(&self, x: &T) -> bool
    where
        T: Fingerprint,
    {
        self.contains_qr(self.strategy.split(x))
    }

    /// Iterates over every stored fingerprint as a (quotient, remainder) pair.
    pub fn fingerprints(&self) -> FingerprintIter<'_> {
        FingerprintIter::new(&self.slots, self.n_occupied)
    }

    pub fn stats(&self) -> Stats {
        Stats::scan(&self.slots, self.n_occupied)
    }

    /// Builds a filter with `2^k` times the slots holding the same
    /// fingerprints, by moving `k` bits of every remainder into its quotient.
    /// `self` is left untouched.
    pub fn doubled(&self, k: u32) -> Result<Self> {
        let strategy = self.strategy.doubled(k)?;
        let mut ret = Self::with_strategy(strategy);
        for qr in self.fingerprints() {
            ret.add_qr(self.strategy.double_pair(qr, k)?);
        }
        debug!(
            "doubled filter {} times: {} -> {} slots, {} fingerprints",
            k,
            self.capacity(),
            ret.capacity(),
            ret.len()
        );
        Ok(ret)
    }

    /// Same as `doubled(1)`.
    pub fn double(&self) -> Result<Self> {
        self.doubled(1)
    }

    /// Adds every fingerprint of `other` to `self`.
    ///
    /// Both filters must use the same strategy and `self` must have room for
    /// all of `other`'s fingerprints; otherwise nothing is changed.
    pub fn merge(&mut self, other: &QuotientFilter<T>) -> Result<()> {
        if other.capacity() != self.capacity() {
            return Err(AmqError::invalid(format!(
                "cannot merge a filter of {} slots into one of {}",
                other.capacity(),
                self.capacity()
            )));
        }
        if other.strategy != self.strategy {
            return Err(AmqError::invalid(
                "cannot merge filters with different quotienting strategies",
            ));
        }
        if self.n_occupied + other.n_occupied > self.capacity() {
            return Err(AmqError::invalid(format!(
                "merge would overfill the filter: {} + {} > {}",
                self.n_occupied,
                other.n_occupied,
                self.capacity()
            )));
        }

        let before = self.n_occupied;
        for qr in other.fingerprints() {
            self.add_qr(qr);
        }
        debug!(
            "merged {} fingerprints, {} were new",
            other.n_occupied,
            self.n_occupied - before
        );
        Ok(())
    }

    /// Inserts a pair, returning `false` when it was already present. The
    /// caller guarantees a free slot.
    fn add_qr(&mut self, qr: QuotientAndRemainder) -> bool {
        let quotient = qr.quotient as usize;
        let remainder = qr.remainder;
        let slots = &mut self.slots;

        if slots.is_empty(quotient) {
            trace!("insert {qr}: canonical slot free");
            slots.fill(quotient, true, false, false, remainder);
            self.n_occupied += 1;
            return true;
        }

        if !slots.is_occupied(quotient) {
            // Another cluster runs through our home. Marking it occupied first
            // makes find_run land where the new run belongs.
            trace!("insert {qr}: new shifted run");
            slots.set_occupied(quotient, true);
            let start_of_cluster = find_start_of_cluster(slots, quotient);
            let start_of_run = find_run(slots, start_of_cluster, quotient);
            insert_into_slot(slots, start_of_run, false, true, remainder);
            self.n_occupied += 1;
            return true;
        }

        let start_of_cluster = find_start_of_cluster(slots, quotient);
        let start_of_run = find_run(slots, start_of_cluster, quotient);
        let inserted = insert_into_run(slots, start_of_run, remainder, start_of_run != quotient);
        trace!(
            "insert {qr}: existing run at slot {start_of_run}, inserted={inserted}"
        );
        if inserted {
            self.n_occupied += 1;
        }
        inserted
    }

    fn contains_qr(&self, qr: QuotientAndRemainder) -> bool {
        let quotient = qr.quotient as usize;
        if !self.slots.is_occupied(quotient) {
            return false;
        }
        let start_of_cluster = find_start_of_cluster(&self.slots, quotient);
        let start_of_run = find_run(&self.slots, start_of_cluster, quotient);
        find_in_run(&self.slots, start_of_run, qr.remainder)
    }
}

/// Walks back to the first slot of the cluster holding `slot`.
fn find_start_of_cluster(slots: &SlotStore, mut slot: usize) -> usize {
    while slots.is_shifted(slot) {
        slot = slots.prev(slot);
    }
    slot
}

/// Finds where the run for `canonical` starts, or where it would be inserted
/// if that quotient has no run yet.
///
/// Each occupied slot from the cluster start up to `canonical` owns exactly
/// one run, in the same order, so the run for `canonical` starts at the run
/// head whose count matches the number of occupied slots seen.
fn find_run(slots: &SlotStore, start_of_cluster: usize, canonical: usize) -> usize {
    let mut n_occupied = 0usize;
    let mut n_run_starts = 0usize;
    // slot <= canonical does not work once the cluster wraps
    let mut passed_canonical = false;

    let mut slot = start_of_cluster;
    loop {
        if !passed_canonical && slots.is_occupied(slot) {
            n_occupied += 1;
        }
        if !slots.is_continuation(slot) {
            n_run_starts += 1;
        }
        if slot == canonical {
            passed_canonical = true;
        }
        if passed_canonical && n_run_starts == n_occupied {
            return slot;
        }
        slot = slots.next(slot);
    }
}

fn find_in_run(slots: &SlotStore, start_of_run: usize, remainder: u32) -> bool {
    if slots.remainder(start_of_run) == remainder {
        return true;
    }
    let mut slot = slots.next(start_of_run);
    while slots.is_continuation(slot) {
        if slots.remainder(slot) == remainder {
            return true;
        }
        slot = slots.next(slot);
    }
    false
}

/// Places a payload at `slot`, moving everything up to the next empty slot
/// one position right. Moved slots become shifted; occupied bits stay put.
fn insert_into_slot(
    slots: &mut SlotStore,
    slot: usize,
    continuation: bool,
    shifted: bool,
    remainder: u32,
) {
    let mut empty = slot;
    while !slots.is_empty(empty) {
        empty = slots.next(empty);
    }

    let mut to = empty;
    while to != slot {
        let from = slots.prev(to);
        slots.copy_payload(from, to);
        slots.set_shifted(to, true);
        to = from;
    }

    let occupied = slots.is_occupied(slot);
    slots.fill(slot, occupied, continuation, shifted, remainder);
}

/// Inserts `remainder` into the sorted run starting at `start_of_run`.
/// Returns `false` if the remainder is already there.
fn insert_into_run(
    slots: &mut SlotStore,
    start_of_run: usize,
    remainder: u32,
    shifted: bool,
) -> bool {
    let head = slots.remainder(start_of_run);
    if head == remainder {
        return false;
    }
    if head > remainder {
        // the old head moves right and becomes part of the run body
        slots.set_continuation(start_of_run, true);
        insert_into_slot(slots, start_of_run, false, shifted, remainder);
        return true;
    }

    let mut slot = slots.next(start_of_run);
    while slots.is_continuation(slot) {
        let current = slots.remainder(slot);
        if current == remainder {
            return false;
        }
        if current > remainder {
            break;
        }
        slot = slots.next(slot);
    }
    insert_into_slot(slots, slot, true, true, remainder);
    true
}

impl<T: ?Sized> Clone for QuotientFilter<T> {
    fn clone(&self) -> Self {
        QuotientFilter {
            strategy: self.strategy,
            slots: self.slots.clone(),
            n_occupied: self.n_occupied,
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for QuotientFilter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.strategy == other.strategy
            && self.n_occupied == other.n_occupied
            && self.slots == other.slots
    }
}

impl<T: ?Sized> Eq for QuotientFilter<T> {}

impl<T: Fingerprint + ?Sized> ApproxMemQuery<T> for QuotientFilter<T> {
    fn add(&mut self, x: &T) -> Result<()> {
        QuotientFilter::add(self, x)
    }

    fn contains(&self, x: &T) -> bool {
        QuotientFilter::contains(self, x)
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a QuotientFilter<T> {
    type Item = QuotientAndRemainder;
    type IntoIter = FingerprintIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.fingerprints()
    }
}

impl<T: ?Sized> fmt::Display for QuotientFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.capacity() > DISPLAY_ALL_SLOTS {
            return write!(
                f,
                "QuotientFilter<nSlots={},nOccupied={}>",
                self.capacity(),
                self.n_occupied
            );
        }
        writeln!(f, "QuotientFilter<")?;
        for slot in 0..self.capacity() {
            write!(f, "{slot}: ")?;
            self.slots.fmt_slot(f, slot)?;
            writeln!(f)?;
        }
        write!(f, ">")
    }
}

impl<T: ?Sized> fmt::Debug for QuotientFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotientFilter")
            .field("strategy", &self.strategy)
            .field("n_slots", &self.capacity())
            .field("n_occupied", &self.n_occupied)
            .finish()
    }
}
