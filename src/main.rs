use std::collections::HashSet;
use std::env;

use log::{info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use quotient_amq::log::init_logger_with;
use quotient_amq::{QuotientFilter, Result};

const DEFAULT_QUOTIENT_BITS: u32 = 10;
const DEFAULT_LOAD_PERCENT: usize = 75;
const PROBES: usize = 100_000;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("ignoring unparsable {name}={raw}");
            default
        }),
        Err(_) => default,
    }
}

fn main() -> Result<()> {
    init_logger_with("info");

    let quotient_bits = env_or("QF_QUOTIENT_BITS", DEFAULT_QUOTIENT_BITS);
    let load_percent = env_or("QF_LOAD_PERCENT", DEFAULT_LOAD_PERCENT).min(100);

    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut filter = QuotientFilter::<u64>::new(quotient_bits)?;
    let target = filter.capacity() * load_percent / 100;

    let keys: HashSet<u64> = (0..target).map(|_| rng.random()).collect();
    for key in &keys {
        filter.add(key)?;
    }
    info!("filled {filter} from {} keys", keys.len());
    info!("stats: {}", filter.stats());

    let false_positives = (0..PROBES)
        .map(|_| rng.random::<u64>())
        .filter(|probe| !keys.contains(probe) && filter.contains(probe))
        .count();
    info!(
        "false positive rate: {:.6} over {PROBES} probes",
        false_positives as f64 / PROBES as f64
    );

    let doubled = filter.doubled(1)?;
    info!("doubled: {doubled}, stats: {}", doubled.stats());

    let mut other = QuotientFilter::<u64>::with_strategy(*doubled.strategy());
    for _ in 0..target / 2 {
        other.add(&rng.random())?;
    }
    let mut merged = doubled.clone();
    merged.merge(&other)?;
    info!("merged: {merged}, stats: {}", merged.stats());

    Ok(())
}
