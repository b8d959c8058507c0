use std::collections::BTreeSet;

use rand::{rngs::StdRng, Rng, SeedableRng};

use quotient_amq::log::init_test_logger;
use quotient_amq::{AmqError, QuotientFilter, QuotientingStrategy};

const SEEDS: u64 = 40;

fn random_keys(rng: &mut StdRng, n: usize) -> BTreeSet<u32> {
    (0..n).map(|_| rng.random()).collect()
}

#[test]
fn big_random_fill_is_exact_with_full_width_remainders() {
    init_test_logger();
    let mut rng = StdRng::seed_from_u64(1337);
    let mut qf = QuotientFilter::<u32>::new(10).unwrap();

    let mut nums = BTreeSet::new();
    for _ in 0..1000 {
        let key: u32 = rng.random();
        qf.add(&key).unwrap();
        nums.insert(key);
    }
    for key in &nums {
        assert!(qf.contains(key), "false negative for {key:#x}");
    }

    let stats = qf.stats();
    assert_eq!(stats.num_occupied(), qf.len());
    assert_eq!(qf.len(), nums.len());
    // every home slot owns exactly one run
    assert_eq!(stats.num_runs(), stats.num_canonical());

    // 10 quotient bits + 22 remainder bits keep the whole u32, so a miss is
    // always a true negative
    for _ in 0..1000 {
        let probe: u32 = rng.random();
        assert_eq!(qf.contains(&probe), nums.contains(&probe));
    }
}

#[test]
fn many_seeds_never_lose_an_element() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut qf = QuotientFilter::<u32>::new(10).unwrap();
        let nums = random_keys(&mut rng, 1000);
        for key in &nums {
            qf.add(key).unwrap();
        }
        assert!(nums.iter().all(|k| qf.contains(k)), "seed {seed}");
        assert_eq!(qf.len(), nums.len());
        for _ in 0..1000 {
            let probe: u32 = rng.random();
            assert_eq!(qf.contains(&probe), nums.contains(&probe), "seed {seed}");
        }
    }
}

#[test]
fn small_remainder_filter_is_exact_on_canonical_keys() {
    // only the top 10 and bottom 10 bits of a key take part in its fingerprint
    const CANONICAL: u32 = 0b1111_1111_1100_0000_0000_0011_1111_1111;

    let strategy = QuotientingStrategy::new(10, 10).unwrap();
    let mut qf = QuotientFilter::<u32>::with_strategy(strategy);
    let mut rng = StdRng::seed_from_u64(1337);

    let mut nums = BTreeSet::new();
    for _ in 0..1000 {
        let key: u32 = rng.random();
        qf.add(&key).unwrap();
        nums.insert(key & CANONICAL);
    }
    for key in &nums {
        assert!(qf.contains(key));
    }
    for _ in 0..1000 {
        let probe = rng.random::<u32>() & CANONICAL;
        assert_eq!(qf.contains(&probe), nums.contains(&probe));
    }
}

#[test]
fn iterator_recovers_exactly_the_inserted_fingerprints() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut qf = QuotientFilter::<u32>::new(10).unwrap();
        let before = random_keys(&mut rng, 500);
        for key in &before {
            qf.add(key).unwrap();
        }

        let pairs: Vec<_> = qf.fingerprints().collect();
        assert_eq!(pairs.len(), before.len(), "seed {seed}");
        let after: BTreeSet<u32> = pairs
            .iter()
            .map(|qr| (qr.quotient << 22) | qr.remainder)
            .collect();
        assert_eq!(before, after, "seed {seed}");
    }
}

#[test]
fn iterator_on_empty_filter_is_empty() {
    let qf = QuotientFilter::<u32>::new(10).unwrap();
    assert_eq!(qf.fingerprints().count(), 0);
    assert_eq!((&qf).into_iter().next(), None);
}

#[test]
fn iterator_restarts_from_a_fresh_call() {
    let mut qf = QuotientFilter::<u32>::new(6).unwrap();
    for key in [1u32, 0xFFFF_FFFF, 0x8000_0000, 0x0400_0001] {
        qf.add(&key).unwrap();
    }
    let first: Vec<_> = qf.fingerprints().collect();
    let second: Vec<_> = (&qf).into_iter().collect();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn doubling_preserves_every_fingerprint() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut qf = QuotientFilter::<u32>::new(10).unwrap();
        let before = random_keys(&mut rng, 500);
        for key in &before {
            qf.add(key).unwrap();
        }

        let dqf = qf.doubled(1).unwrap();
        assert_eq!(dqf.capacity(), 2048);
        assert_eq!(dqf.len(), qf.len());

        let after: BTreeSet<u32> = dqf
            .into_iter()
            .map(|qr| (qr.quotient << 21) | qr.remainder)
            .collect();
        assert_eq!(before, after, "seed {seed}");
        assert!(before.iter().all(|k| dqf.contains(k)));
        // the source filter is untouched
        assert_eq!(qf.capacity(), 1024);
        assert!(before.iter().all(|k| qf.contains(k)));
    }
}

#[test]
fn doubling_a_partial_width_strategy_several_times() {
    let strategy = QuotientingStrategy::new(8, 12).unwrap();
    let mut qf = QuotientFilter::<u32>::with_strategy(strategy);
    let mut rng = StdRng::seed_from_u64(99);

    let mut keys = Vec::new();
    let mut base = BTreeSet::new();
    for _ in 0..200 {
        let key: u32 = rng.random();
        qf.add(&key).unwrap();
        keys.push(key);
        base.insert(((key >> 24) << 12) | (key & 0xFFF));
    }

    let dqf = qf.doubled(3).unwrap();
    assert_eq!(dqf.capacity(), 2048);
    assert_eq!(dqf.strategy().remainder_bits(), 9);
    assert_eq!(*dqf.strategy(), strategy.doubled(3).unwrap());

    let recovered: BTreeSet<u32> = dqf
        .fingerprints()
        .map(|qr| (qr.quotient << 9) | qr.remainder)
        .collect();
    assert_eq!(recovered, base);
    assert!(keys.iter().all(|k| dqf.contains(k)));

    // doubling again keeps stacking on the same base split
    let ddqf = dqf.doubled(2).unwrap();
    assert_eq!(*ddqf.strategy(), strategy.doubled(5).unwrap());
    assert!(keys.iter().all(|k| ddqf.contains(k)));
}

#[test]
fn doubling_rejects_too_many_bits() {
    let qf = QuotientFilter::<u32>::with_strategy(QuotientingStrategy::new(4, 3).unwrap());
    assert!(matches!(qf.doubled(3), Err(AmqError::InvalidArgument(_))));
    assert!(qf.doubled(2).is_ok());
}

#[test]
fn merge_keeps_both_sides() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut qf1 = QuotientFilter::<u32>::new(10).unwrap();
        let mut qf2 = QuotientFilter::<u32>::new(10).unwrap();
        let elements1 = random_keys(&mut rng, 400);
        let elements2 = random_keys(&mut rng, 400);
        for key in &elements1 {
            qf1.add(key).unwrap();
        }
        for key in &elements2 {
            qf2.add(key).unwrap();
        }

        qf1.merge(&qf2).unwrap();

        assert!(elements1.iter().all(|k| qf1.contains(k)), "seed {seed}");
        assert!(elements2.iter().all(|k| qf1.contains(k)), "seed {seed}");
        let union: BTreeSet<u32> = elements1.union(&elements2).copied().collect();
        assert_eq!(qf1.len(), union.len());
        let recovered: BTreeSet<u32> = qf1
            .fingerprints()
            .map(|qr| (qr.quotient << 22) | qr.remainder)
            .collect();
        assert_eq!(recovered, union);
        // the merged-in filter is untouched
        assert_eq!(qf2.len(), elements2.len());
    }
}

#[test]
fn merge_accepts_equivalent_strategies() {
    let mut small = QuotientFilter::<str>::new(9).unwrap();
    small.add("left").unwrap();
    let grown = small.doubled(1).unwrap();

    let mut other = QuotientFilter::<str>::new(10).unwrap();
    other.add("right").unwrap();
    other.merge(&grown).unwrap();

    assert!(other.contains("left"));
    assert!(other.contains("right"));
}

#[test]
fn merge_refuses_overflow_without_mutation() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut a = QuotientFilter::<u32>::new(6).unwrap();
    let mut b = QuotientFilter::<u32>::new(6).unwrap();
    for key in random_keys(&mut rng, 40) {
        a.add(&key).unwrap();
    }
    for key in random_keys(&mut rng, 40) {
        b.add(&key).unwrap();
    }
    let before = a.clone();
    let err = a.merge(&b).unwrap_err();
    assert!(matches!(err, AmqError::InvalidArgument(_)));
    assert_eq!(a, before);
}

#[test]
fn full_filter_rejects_adds_without_mutation() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut qf = QuotientFilter::<u32>::new(4).unwrap();
    let mut keys = BTreeSet::new();
    while keys.len() < 16 {
        let key: u32 = rng.random();
        if keys.insert(key) {
            qf.add(&key).unwrap();
        }
    }
    assert!(qf.is_full());
    assert!(keys.iter().all(|k| qf.contains(k)));

    let snapshot = qf.clone();
    let fresh = (0u32..).find(|k| !keys.contains(k)).unwrap();
    assert_eq!(
        qf.add(&fresh).unwrap_err(),
        AmqError::FilterFull { capacity: 16 }
    );
    // re-adding a known element is refused too
    let known = *keys.iter().next().unwrap();
    assert!(qf.add(&known).is_err());
    assert_eq!(qf, snapshot);

    let stats = qf.stats();
    assert_eq!(stats.num_occupied(), 16);
    assert_eq!(stats.num_slots(), 16);
}

#[test]
fn hashed_strings_have_no_false_negatives_and_few_false_positives() {
    init_test_logger();
    let strategy = QuotientingStrategy::new(12, 8).unwrap();
    let mut qf = QuotientFilter::<str>::with_strategy(strategy);

    let members: Vec<String> = (0..2048).map(|i| format!("member-{i}")).collect();
    for m in &members {
        qf.add(m).unwrap();
    }
    assert!(members.iter().all(|m| qf.contains(m)));

    let probes = 100_000;
    let hits = (0..probes)
        .filter(|i| qf.contains(&format!("probe-{i}")))
        .count();
    let rate = hits as f64 / probes as f64;
    // about load / 2^remainder_bits for a half full table
    assert!(rate > 0.0, "no false positives at all is implausible");
    assert!(rate < 2.0 / 256.0, "false positive rate {rate} too high");
}

#[test]
fn doubled_string_filter_keeps_members() {
    let mut qf = QuotientFilter::<str>::new(10).unwrap();
    let words: Vec<String> = (0..700).map(|i| format!("word-{i}")).collect();
    for w in &words {
        qf.add(w).unwrap();
    }
    let dqf = qf.doubled(2).unwrap();
    assert_eq!(dqf.capacity(), 4096);
    assert!(words.iter().all(|w| dqf.contains(w)));
    assert_eq!(dqf.len(), qf.len());
}
