pub const REG_PREFIX: &str = "reg:";
pub const REG_SERVER_PREFIX: &str = "reg:server:";
pub const REG_RES_PREFIX: &str = "reg:res:";

/// Sorted set of live server ids, scored by lease expiry.
pub fn lease_key(env: &str) -> String {
    format!("{}{}", REG_PREFIX, env)
}

pub fn registration_key(env: &str, server_id: &str) -> String {
    format!("{}{}:{}", REG_SERVER_PREFIX, env, server_id)
}

pub fn command_key(env: &str, server_id: &str) -> String {
    format!("{}{}:{}", REG_PREFIX, env, server_id)
}

pub fn command_result_key(env: &str, server_id: &str, kind: Option<&str>) -> String {
    match kind {
        None => format!("{}{}:{}", REG_RES_PREFIX, env, server_id),
        Some(kind) => format!("{}{}:{}:{}", REG_RES_PREFIX, env, server_id, kind),
    }
}

#[cfg(test)]
mod tests {
    use crate::keys::{command_key, command_result_key, lease_key, registration_key};

    #[test]
    fn test_key_layout() {
        assert_eq!(lease_key("dev"), "reg:dev");
        assert_eq!(registration_key("dev", "connector-1"), "reg:server:dev:connector-1");
        assert_eq!(command_key("dev", "connector-1"), "reg:dev:connector-1");
        assert_eq!(command_result_key("dev", "connector-1", None), "reg:res:dev:connector-1");
        assert_eq!(command_result_key("dev", "connector-1", Some("show")), "reg:res:dev:connector-1:show");
    }
}
