//! Counters describing the work the OOB controller performed.

use enum_map::{Enum, EnumMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum_macros::{Display, EnumIter, EnumString};

use crate::OOBError;

/// A classified unit of collection work. Every successful `run()` performs exactly one of these.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Enum)]
pub enum WorkKind {
    Major,
    Minor,
    Sweep,
}

/// Keys accepted by `stat()`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StatKey {
    Count,
    MajorCount,
    MinorCount,
    SweepCount,
}

impl StatKey {
    /// Parse a key. A leading colon is accepted, so both `"count"` and `":count"` name `Count`.
    pub fn parse(key: &str) -> Result<StatKey, OOBError> {
        let name = key.strip_prefix(':').unwrap_or(key);
        StatKey::from_str(name).map_err(|_| OOBError::UnknownStatKey(key.to_string()))
    }
}

/// The counters block. `count` is not stored: it is the sum of the per-kind counters,
/// so it always equals `major_count + minor_count + sweep_count`.
#[derive(Default)]
pub struct OOBStats {
    counts: EnumMap<WorkKind, AtomicUsize>,
}

impl OOBStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed unit of work.
    pub fn inc(&self, kind: WorkKind) {
        self.counts[kind].fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self, kind: WorkKind) -> usize {
        self.counts[kind].load(Ordering::SeqCst)
    }

    pub fn count(&self) -> usize {
        self.counts.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    pub fn value_of(&self, key: StatKey) -> usize {
        match key {
            StatKey::Count => self.count(),
            StatKey::MajorCount => self.get(WorkKind::Major),
            StatKey::MinorCount => self.get(WorkKind::Minor),
            StatKey::SweepCount => self.get(WorkKind::Sweep),
        }
    }

    /// Reset every counter to zero.
    pub fn clear(&self) {
        for counter in self.counts.values() {
            counter.store(0, Ordering::SeqCst);
        }
    }

    pub fn print_stats(&self) {
        println!("============================ oobgc Statistics Totals ============================");
        println!("{}", self);
        println!("------------------------------ End oobgc Statistics -----------------------------");
    }
}

impl fmt::Display for OOBStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use strum::IntoEnumIterator;
        let names: Vec<String> = StatKey::iter().map(|k| k.to_string()).collect();
        let values: Vec<String> = StatKey::iter()
            .map(|k| self.value_of(k).to_string())
            .collect();
        write!(f, "{}\n{}", names.join("\t"), values.join("\t"))
    }
}
