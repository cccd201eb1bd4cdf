//! Default User-Agent string.

/// Fallback User-Agent sent when no override is configured.
pub const USER_AGENT: &str = concat!("autodiscovery/", env!("CARGO_PKG_VERSION"));

pub fn resolve_user_agent(override_value: Option<&str>) -> String {
    override_value.unwrap_or(USER_AGENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default() {
        assert_eq!(resolve_user_agent(None), USER_AGENT);
    }

    #[test]
    fn honors_override() {
        assert_eq!(resolve_user_agent(Some("custom/1")), "custom/1");
    }
}
