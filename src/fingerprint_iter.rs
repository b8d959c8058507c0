use std::iter::FusedIterator;

use crate::quotienting::QuotientAndRemainder;
use crate::slot_store::SlotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AtClusterStart,
    Scanning,
    Done,
}

/// Walks the slot table once, yielding every stored (quotient, remainder)
/// pair in physical slot order.
///
/// The walk starts at the beginning of a cluster, where the slot index is
/// also the quotient of the first run. From there the quotient of each run is
/// found by stepping to the next occupied slot whenever a run ends.
#[derive(Debug, Clone)]
pub struct FingerprintIter<'a> {
    slots: &'a SlotStore,
    start: usize,
    cur: usize,
    quotient: usize,
    state: State,
}

impl<'a> FingerprintIter<'a> {
    pub(crate) fn new(slots: &'a SlotStore, n_occupied: usize) -> Self {
        if n_occupied == 0 {
            return FingerprintIter {
                slots,
                start: 0,
                cur: 0,
                quotient: 0,
                state: State::Done,
            };
        }

        let mut first = 0;
        while slots.is_empty(first) {
            first = slots.next(first);
        }
        let mut start = first;
        while slots.is_shifted(start) {
            start = slots.prev(start);
        }
        debug_assert!(slots.is_occupied(start) && !slots.is_continuation(start));

        FingerprintIter {
            slots,
            start,
            cur: start,
            quotient: start,
            state: State::AtClusterStart,
        }
    }

    fn advance_quotient(&mut self) {
        loop {
            self.quotient = self.slots.next(self.quotient);
            if self.slots.is_occupied(self.quotient) {
                break;
            }
        }
    }
}

impl Iterator for FingerprintIter<'_> {
    type Item = QuotientAndRemainder;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => return None,
            State::Scanning if self.cur == self.start => {
                self.state = State::Done;
                return None;
            }
            _ => {}
        }

        // skip the gap between two clusters
        while self.slots.is_empty(self.cur) {
            self.cur = self.slots.next(self.cur);
            if self.cur == self.start {
                self.state = State::Done;
                return None;
            }
        }

        let item = QuotientAndRemainder::new(self.quotient as u32, self.slots.remainder(self.cur));
        self.state = State::Scanning;
        self.cur = self.slots.next(self.cur);
        if !self.slots.is_continuation(self.cur) {
            self.advance_quotient();
        }
        Some(item)
    }
}

impl FusedIterator for FingerprintIter<'_> {}
