use ahash::HashMap;

use crate::error::MonitorError;
use crate::server_record::ServerRecord;
use crate::snapshot::MembershipSnapshot;

#[derive(Debug, Default)]
pub(crate) struct Partition {
    /// Live members already cached, reused without a store round trip.
    pub(crate) known: HashMap<String, ServerRecord>,
    /// Live members to fetch in this cycle.
    pub(crate) missing: Vec<String>,
    /// Live members left for a later cycle by the batch cap.
    pub(crate) deferred: Vec<String>,
}

/// Splits the live ids of one cycle into cached and missing members. Ids are
/// walked from the latest lease to the oldest, so the cap keeps the most
/// recently refreshed servers and defers the rest.
pub(crate) fn partition_members(cached: &MembershipSnapshot, live: &[String], max_batch: Option<usize>) -> Partition {
    let mut partition = Partition::default();
    for server_id in live.iter().rev() {
        match cached.get(server_id) {
            Some(record) => {
                partition.known.insert(server_id.clone(), record.clone());
            }
            None => {
                partition.missing.push(server_id.clone());
            }
        }
    }
    if let Some(max) = max_batch.filter(|max| *max > 0) {
        if partition.missing.len() > max {
            partition.deferred = partition.missing.split_off(max);
        }
    }
    partition
}

/// Adds every fetched registration record to `results`, keyed by the id inside
/// the record. Absent values are skipped, malformed ones are reported back.
pub(crate) fn merge_fetched(
    results: &mut HashMap<String, ServerRecord>,
    requested: &[String],
    values: Vec<Option<String>>,
) -> Vec<MonitorError> {
    let mut errors = Vec::new();
    for (server_id, value) in requested.iter().zip(values) {
        let Some(raw) = value else {
            continue;
        };
        match serde_json::from_str::<ServerRecord>(&raw) {
            Ok(record) => {
                results.insert(record.id.clone(), record);
            }
            Err(source) => {
                errors.push(MonitorError::Serialization { server_id: server_id.clone(), source });
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use ahash::{HashMap, HashMapExt};

    use crate::discovery::{merge_fetched, partition_members};
    use crate::error::MonitorError;
    use crate::server_record::ServerRecord;
    use crate::snapshot::MembershipSnapshot;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn cached(ids: &[&str]) -> MembershipSnapshot {
        let mut members = HashMap::new();
        for id in ids {
            members.insert(id.to_string(), ServerRecord::new(*id, "127.0.0.1", 3000));
        }
        MembershipSnapshot::new(members)
    }

    #[test]
    fn test_partition_reuses_cached_records() {
        let partition = partition_members(&cached(&["a", "c"]), &ids(&["a", "b", "c", "d"]), None);
        let mut known = partition.known.keys().cloned().collect::<Vec<_>>();
        known.sort();
        assert_eq!(known, ids(&["a", "c"]));
        assert_eq!(partition.missing, ids(&["d", "b"]));
        assert!(partition.deferred.is_empty());
    }

    #[test]
    fn test_missing_batch_is_capped() {
        let live = ids(&["m1", "m2", "m3", "m4", "m5"]);
        let partition = partition_members(&MembershipSnapshot::default(), &live, Some(2));
        assert_eq!(partition.missing.len(), 2);
        assert_eq!(partition.deferred.len(), 3);
        assert_eq!(partition.missing, ids(&["m5", "m4"]));
    }

    #[test]
    fn test_zero_cap_means_unbounded() {
        let live = ids(&["m1", "m2", "m3"]);
        let partition = partition_members(&MembershipSnapshot::default(), &live, Some(0));
        assert_eq!(partition.missing.len(), 3);
    }

    #[test]
    fn test_merge_skips_absent_and_malformed() -> anyhow::Result<()> {
        let mut results = HashMap::new();
        let b = serde_json::to_string(&ServerRecord::new("b", "10.0.0.2", 3001))?;
        let errors = merge_fetched(
            &mut results,
            &ids(&["a", "b", "c"]),
            vec![None, Some(b), Some("{broken".to_string())],
        );
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("b"));
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], MonitorError::Serialization { server_id, .. } if server_id == "c"));
        Ok(())
    }
}
