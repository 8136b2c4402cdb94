// ABOUTME: Human-readable formatting helpers exposed to the dashboard template.
// ABOUTME: Durations, byte counts, and host extraction from "host:port" endpoints.

use std::net::SocketAddr;

use bytesize::ByteSize;

/// Format a duration in seconds compactly: `45s`, `3m12s`, `5h4m`, `2d3h`.
pub fn pretty_time(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let secs = seconds.unsigned_abs();

    let mins = secs / 60;
    if mins == 0 {
        return format!("{sign}{secs}s");
    }
    if mins < 60 {
        return format!("{sign}{mins}m{}s", secs % 60);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{sign}{hours}h{}m", mins % 60);
    }
    format!("{sign}{}d{}h", hours / 24, hours % 24)
}

/// Format a byte count with binary units.
pub fn pretty_bytes(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Host part of an endpoint such as `1.2.3.4:5000`, `[fe80::1]:443` or
/// `switch.example.com:10002`. Bare hosts are returned unchanged.
pub fn ip_addr(endpoint: &str) -> String {
    if let Ok(addr) = endpoint.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    match endpoint.split_once(':') {
        Some((host, port)) if !port.contains(':') => host.to_string(),
        _ => endpoint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_time_picks_two_largest_units() {
        assert_eq!(pretty_time(0), "0s");
        assert_eq!(pretty_time(45), "45s");
        assert_eq!(pretty_time(192), "3m12s");
        assert_eq!(pretty_time(5 * 3600 + 4 * 60 + 9), "5h4m");
        assert_eq!(pretty_time(2 * 86400 + 3 * 3600), "2d3h");
    }

    #[test]
    fn pretty_time_keeps_sign() {
        assert_eq!(pretty_time(-61), "-1m1s");
    }

    #[test]
    fn pretty_bytes_mentions_magnitude() {
        assert!(pretty_bytes(512).contains("512"));
        let mib = pretty_bytes(3 * 1024 * 1024);
        assert!(mib.starts_with('3'), "unexpected {mib}");
        assert!(mib.contains('M'), "unexpected {mib}");
    }

    #[test]
    fn ip_addr_strips_port() {
        assert_eq!(ip_addr("10.1.2.3:1194"), "10.1.2.3");
        assert_eq!(ip_addr("[fe80::1]:443"), "fe80::1");
    }

    #[test]
    fn ip_addr_passes_through_bare_hosts() {
        assert_eq!(ip_addr("10.1.2.3"), "10.1.2.3");
        assert_eq!(ip_addr("fe80::1"), "fe80::1");
        assert_eq!(ip_addr("switch.example.com:10002"), "switch.example.com");
    }
}
