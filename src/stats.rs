use std::fmt;

use crate::slot_store::SlotStore;

/// Summary counts for a quotient filter, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    slots: usize,
    occupied: usize,
    canonical: usize,
    shifted: usize,
    runs: usize,
    clusters: usize,
}

impl Stats {
    pub(crate) fn scan(store: &SlotStore, occupied: usize) -> Self {
        let mut stats = Stats {
            slots: store.len(),
            occupied,
            canonical: 0,
            shifted: 0,
            runs: 0,
            clusters: 0,
        };
        for slot in 0..store.len() {
            let is_occupied = store.is_occupied(slot);
            let is_shifted = store.is_shifted(slot);
            if is_occupied {
                stats.canonical += 1;
            }
            if is_shifted {
                stats.shifted += 1;
                // a shifted run head starts a run but not a cluster
                if !store.is_continuation(slot) {
                    stats.runs += 1;
                }
            } else if is_occupied {
                stats.clusters += 1;
                stats.runs += 1;
            }
        }
        stats
    }

    pub fn num_slots(&self) -> usize {
        self.slots
    }

    pub fn num_occupied(&self) -> usize {
        self.occupied
    }

    /// Slots that are the home of at least one stored quotient.
    pub fn num_canonical(&self) -> usize {
        self.canonical
    }

    pub fn num_shifted(&self) -> usize {
        self.shifted
    }

    pub fn num_runs(&self) -> usize {
        self.runs
    }

    pub fn num_clusters(&self) -> usize {
        self.clusters
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[nSlots={}, nOccupied={}, nCanonical={}, nShifted={}, nRuns={}, nClusters={}]",
            self.slots, self.occupied, self.canonical, self.shifted, self.runs, self.clusters
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scan_counts_runs_and_clusters() {
        // slot 1: home run for q=1, slot 2: continuation of q=1 (home of q=2),
        // slot 3: shifted run for q=2, slot 6: lone cluster.
        let mut store = SlotStore::new(8, 4);
        store.fill(1, true, false, false, 1);
        store.fill(2, true, true, true, 2);
        store.fill(3, false, false, true, 3);
        store.fill(6, true, false, false, 9);

        let stats = Stats::scan(&store, 4);
        assert_eq!(stats.num_slots(), 8);
        assert_eq!(stats.num_occupied(), 4);
        assert_eq!(stats.num_canonical(), 3);
        assert_eq!(stats.num_shifted(), 2);
        assert_eq!(stats.num_runs(), 3);
        assert_eq!(stats.num_clusters(), 2);
        assert_eq!(
            stats.to_string(),
            "[nSlots=8, nOccupied=4, nCanonical=3, nShifted=2, nRuns=3, nClusters=2]"
        );
    }
}
