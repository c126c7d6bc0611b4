use ahash::HashMap;
use itertools::Itertools;

use crate::server_record::ServerRecord;

/// The monitor's view of the cluster after one discovery cycle. A new snapshot
/// replaces the previous one, it is never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipSnapshot {
    members: HashMap<String, ServerRecord>,
}

impl MembershipSnapshot {
    pub fn new(members: HashMap<String, ServerRecord>) -> Self {
        Self { members }
    }

    pub fn get(&self, server_id: &str) -> Option<&ServerRecord> {
        self.members.get(server_id)
    }

    pub fn contains(&self, server_id: &str) -> bool {
        self.members.contains_key(server_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &HashMap<String, ServerRecord> {
        &self.members
    }

    pub fn ids(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).sorted().collect()
    }

    pub fn by_type<'a>(&'a self, server_type: &'a str) -> impl Iterator<Item=&'a ServerRecord> + 'a {
        self.members.values().filter(move |record| record.server_type() == Some(server_type))
    }
}
