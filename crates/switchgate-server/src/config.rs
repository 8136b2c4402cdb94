// ABOUTME: Configuration loading and validation for the switchgate gateway.
// ABOUTME: Reads SWITCHGATE_* environment variables and decides between plain HTTP and TLS.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:10000";
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SWITCHGATE_LISTEN is not a valid socket address: {0}")]
    InvalidListen(String),

    #[error("{name} is not a whole number of seconds: {value}")]
    InvalidTimeout { name: &'static str, value: String },
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen: SocketAddr,
    pub token_file: PathBuf,
    pub public_dir: PathBuf,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 10000)),
            token_file: PathBuf::from("token"),
            public_dir: PathBuf::from("public"),
            cert_file: None,
            key_file: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidTimeout { name, value }),
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - SWITCHGATE_LISTEN: socket address to bind (default: 0.0.0.0:10000)
    /// - SWITCHGATE_TOKEN_FILE: admin token file (default: ./token)
    /// - SWITCHGATE_PUBLIC_DIR: dashboard template and static files (default: ./public)
    /// - SWITCHGATE_CERT_FILE / SWITCHGATE_KEY_FILE: PEM pair enabling TLS (optional)
    /// - SWITCHGATE_READ_TIMEOUT_SECS: request body read timeout (default: 300)
    /// - SWITCHGATE_WRITE_TIMEOUT_SECS: whole-request timeout (default: 600)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen_str = lookup("SWITCHGATE_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen_str
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidListen(listen_str.clone()))?;

        let defaults = Self::default();
        let token_file = lookup("SWITCHGATE_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_file);
        let public_dir = lookup("SWITCHGATE_PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.public_dir);
        let cert_file = lookup("SWITCHGATE_CERT_FILE").map(PathBuf::from);
        let key_file = lookup("SWITCHGATE_KEY_FILE").map(PathBuf::from);

        let read_timeout = parse_secs(&lookup, "SWITCHGATE_READ_TIMEOUT_SECS", DEFAULT_READ_TIMEOUT)?;
        let write_timeout =
            parse_secs(&lookup, "SWITCHGATE_WRITE_TIMEOUT_SECS", DEFAULT_WRITE_TIMEOUT)?;

        Ok(Self {
            listen,
            token_file,
            public_dir,
            cert_file,
            key_file,
            read_timeout,
            write_timeout,
        })
    }

    /// True when exactly one of the certificate and key is set. Such a config
    /// serves plain HTTP.
    pub fn tls_is_partial(&self) -> bool {
        self.cert_file.is_some() != self.key_file.is_some()
    }

    /// The certificate and key paths when TLS is enabled.
    pub fn tls(&self) -> Option<(&PathBuf, &PathBuf)> {
        match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn config_loads_defaults() {
        let config = GatewayConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.listen, "0.0.0.0:10000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.token_file, PathBuf::from("token"));
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.read_timeout, Duration::from_secs(300));
        assert_eq!(config.write_timeout, Duration::from_secs(600));
        assert!(config.tls().is_none());
    }

    #[test]
    fn config_reads_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("SWITCHGATE_LISTEN", "127.0.0.1:8443"),
            ("SWITCHGATE_TOKEN_FILE", "/var/lib/switchgate/token"),
            ("SWITCHGATE_PUBLIC_DIR", "/usr/share/switchgate"),
            ("SWITCHGATE_CERT_FILE", "/etc/switchgate/crt.pem"),
            ("SWITCHGATE_KEY_FILE", "/etc/switchgate/key.pem"),
            ("SWITCHGATE_READ_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.listen.port(), 8443);
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
        let (cert, key) = config.tls().unwrap();
        assert!(cert.ends_with("crt.pem"));
        assert!(key.ends_with("key.pem"));
    }

    #[test]
    fn config_rejects_bad_listen() {
        let err = GatewayConfig::from_lookup(lookup_from(&[("SWITCHGATE_LISTEN", "nowhere")]))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidListen(_)));
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn config_rejects_bad_timeout() {
        let err = GatewayConfig::from_lookup(lookup_from(&[(
            "SWITCHGATE_WRITE_TIMEOUT_SECS",
            "ten",
        )]))
        .unwrap_err();

        assert!(err.to_string().contains("SWITCHGATE_WRITE_TIMEOUT_SECS"));
    }

    #[test]
    fn half_tls_pair_falls_back_to_plain() {
        let config = GatewayConfig::from_lookup(lookup_from(&[(
            "SWITCHGATE_CERT_FILE",
            "/etc/switchgate/crt.pem",
        )]))
        .unwrap();

        assert!(config.tls().is_none());
        assert!(config.tls_is_partial());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("SWITCHGATE_CERT_FILE", ""),
            ("SWITCHGATE_KEY_FILE", "  "),
        ]))
        .unwrap();

        assert!(config.tls().is_none());
    }
}
