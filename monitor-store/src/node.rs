use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StoreNode {
    pub host: String,
    pub port: u16,
}

impl StoreNode {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Display for StoreNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for StoreNode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| StoreError::InvalidAddress(s.to_string()))?;
        let port = port.parse::<u16>().map_err(|_| StoreError::InvalidAddress(s.to_string()))?;
        if host.is_empty() {
            return Err(StoreError::InvalidAddress(s.to_string()));
        }
        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use crate::node::StoreNode;

    #[test]
    fn test_parse_node() -> anyhow::Result<()> {
        let node: StoreNode = "10.0.0.7:6380".parse()?;
        assert_eq!(node, StoreNode::new("10.0.0.7", 6380));
        assert_eq!(node.to_string(), "10.0.0.7:6380");
        assert!("10.0.0.7".parse::<StoreNode>().is_err());
        assert!(":6379".parse::<StoreNode>().is_err());
        assert!("redis:port".parse::<StoreNode>().is_err());
        Ok(())
    }
}
