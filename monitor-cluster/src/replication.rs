use ahash::{HashMap, HashMapExt};

/// Parses the replication section of a store info reply into `key -> value`.
/// Lines without a value, such as `# Replication` headers, are ignored.
pub fn parse_replication_info(info: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for line in info.lines() {
        let line = line.trim_end_matches('\r');
        let mut parts = line.splitn(2, ':');
        let key = parts.next().unwrap_or_default();
        match parts.next() {
            Some(value) if !value.is_empty() => {
                fields.insert(key.to_string(), value.to_string());
            }
            _ => {}
        }
    }
    fields
}

pub fn is_master(info: &str) -> bool {
    parse_replication_info(info).get("role").is_some_and(|role| role == "master")
}

#[cfg(test)]
mod tests {
    use crate::replication::{is_master, parse_replication_info};

    #[test]
    fn test_parse_master_info() {
        let info = "# Replication\r\nrole:master\r\nconnected_slaves:1\r\nslave0:ip=10.0.0.2,port=6379,state=online,offset=42,lag=0\r\n";
        let fields = parse_replication_info(info);
        assert_eq!(fields.get("role").map(String::as_str), Some("master"));
        assert_eq!(fields.get("connected_slaves").map(String::as_str), Some("1"));
        assert_eq!(fields.get("slave0").map(String::as_str), Some("ip=10.0.0.2,port=6379,state=online,offset=42,lag=0"));
        assert!(!fields.contains_key("# Replication"));
        assert!(is_master(info));
    }

    #[test]
    fn test_replica_and_garbage_are_not_master() {
        assert!(!is_master("# Replication\nrole:slave\nmaster_host:10.0.0.1\n"));
        assert!(!is_master("role:\n"));
        assert!(!is_master(""));
        assert!(!is_master("role:masterful"));
    }
}
