//! Remap tables for deterministic ids and timestamps.
//!
//! Tables are built from the sorted distinct values of a whole event
//! sequence, so the mapping does not depend on the order events appear in.

use crate::event::factory::format_span_id;
use crate::event::TraceEvent;
use crate::utils::config::{PID_BASE, TID_BASE, TIMESTAMP_INCREMENT_US};
use std::collections::{BTreeMap, BTreeSet};

/// Old-to-new value tables for one event sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTables {
    pids: BTreeMap<u64, u64>,
    tids: BTreeMap<u64, u64>,
    timestamps: BTreeMap<u64, u64>,
    span_ids: BTreeMap<String, String>,
}

impl RemapTables {
    /// Build tables from the distinct values found in `events`
    ///
    /// * pids ascending: 10001, 10002, ...
    /// * tids ascending: 1, 2, ...
    /// * timestamps ascending: `base_timestamp_us + i * 100`
    /// * span ids lexicographic: "0x1", "0x2", ...
    pub fn from_events(events: &[TraceEvent], base_timestamp_us: u64) -> Self {
        let mut pids = BTreeSet::new();
        let mut tids = BTreeSet::new();
        let mut timestamps = BTreeSet::new();
        let mut span_ids = BTreeSet::new();

        for event in events {
            pids.extend(event.pid());
            tids.extend(event.tid());
            timestamps.insert(event.ts());
            if let Some(id) = event.span_id() {
                span_ids.insert(id.to_string());
            }
        }

        Self {
            pids: numbered(pids, |i| PID_BASE + i + 1),
            tids: numbered(tids, |i| TID_BASE + i + 1),
            timestamps: numbered(timestamps, |i| {
                base_timestamp_us.saturating_add(i.saturating_mul(TIMESTAMP_INCREMENT_US))
            }),
            span_ids: numbered(span_ids, |i| format_span_id(i + 1)),
        }
    }

    pub fn pid(&self, pid: u64) -> u64 {
        self.pids.get(&pid).copied().unwrap_or(pid)
    }

    pub fn tid(&self, tid: u64) -> u64 {
        self.tids.get(&tid).copied().unwrap_or(tid)
    }

    pub fn ts(&self, ts: u64) -> u64 {
        self.timestamps.get(&ts).copied().unwrap_or(ts)
    }

    pub fn span_id(&self, id: &str) -> String {
        self.span_ids
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

fn numbered<K: Ord, V>(keys: BTreeSet<K>, value_for: impl Fn(u64) -> V) -> BTreeMap<K, V> {
    keys.into_iter()
        .enumerate()
        .map(|(index, key)| (key, value_for(index as u64)))
        .collect()
}
