//! Host allowlist/denylist policy for outbound plugins (`http.get`), grounded
//! on `original_source/apps/tentackl/tests/integration/plugins/test_http_plugin_allowlist.py`.
//!
//! The denylist (RFC1918, link-local, loopback, the cloud metadata address)
//! is unconditional — no task-level allowlist entry can re-enable it.

use std::net::IpAddr;

pub const METADATA_IP: &str = "169.254.169.254";

fn is_denied_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unique_local() || v6.is_unicast_link_local(),
    }
}

/// `host` is a bare hostname or IP literal (scheme/port already stripped by
/// the caller). Denylisted hosts are rejected even if they also appear in
/// `allowed_hosts`; `localhost` is denylisted unconditionally as a named
/// alias for loopback.
pub fn is_host_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return false;
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_denied_ip(ip) {
            return false;
        }
    }
    allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_is_always_denied() {
        assert!(!is_host_allowed("localhost", &["localhost".to_string()]));
    }

    #[test]
    fn private_and_metadata_ips_are_always_denied() {
        let allowed = vec!["10.0.0.5".to_string(), METADATA_IP.to_string()];
        assert!(!is_host_allowed("10.0.0.5", &allowed));
        assert!(!is_host_allowed(METADATA_IP, &allowed));
        assert!(!is_host_allowed("127.0.0.1", &allowed));
    }

    #[test]
    fn unlisted_public_host_is_denied() {
        assert!(!is_host_allowed("example.com", &["api.example.com".to_string()]));
    }

    #[test]
    fn listed_public_host_is_allowed() {
        assert!(is_host_allowed("api.example.com", &["api.example.com".to_string()]));
    }
}
