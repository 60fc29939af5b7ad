//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rewriting pipeline settings.
    pub gateway: GatewayConfig,

    /// Per-hostname request header overrides, keyed by hostname or `*`.
    pub header_rules: HeaderRulesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            gateway: GatewayConfig::default(),
            header_rules: default_header_rules(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for the hosting layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for producing response headers, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 60,
        }
    }
}

/// Settings for the request/response rewriting pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Headers starting with this prefix (case-insensitive) never reach the origin.
    /// Empty disables stripping.
    pub internal_header_prefix: String,

    /// Value written into the `Domain` attribute of every `Set-Cookie`.
    pub cookie_domain: String,

    /// Take the client scheme from `X-Forwarded-Proto` when present.
    pub trust_forwarded_proto: bool,

    /// Largest HTML body that will be buffered for link rewriting.
    pub max_html_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            internal_header_prefix: "cf-".to_string(),
            cookie_domain: String::new(),
            trust_forwarded_proto: true,
            max_html_bytes: 32 * 1024 * 1024,
        }
    }
}

/// What to do with one request header for a given origin host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderDirective {
    /// Leave the header as the client sent it.
    Keep,
    /// Remove the header from the outgoing request.
    Delete,
    /// Overwrite (or add) the header with a fixed value.
    Set(String),
}

/// Hostname (or `*`) → header name → directive.
pub type HeaderRulesConfig = BTreeMap<String, BTreeMap<String, HeaderDirective>>;

/// Hostname key matched when no exact entry exists.
pub const WILDCARD_HOST: &str = "*";

/// The bundled override table.
pub fn default_header_rules() -> HeaderRulesConfig {
    let pixiv = || {
        BTreeMap::from([
            ("origin".to_string(), HeaderDirective::Delete),
            (
                "referer".to_string(),
                HeaderDirective::Set("https://www.pixiv.net/".to_string()),
            ),
        ])
    };

    BTreeMap::from([
        ("i.pximg.net".to_string(), pixiv()),
        ("i-cf.pximg.net".to_string(), pixiv()),
        (
            WILDCARD_HOST.to_string(),
            BTreeMap::from([
                ("origin".to_string(), HeaderDirective::Delete),
                ("referer".to_string(), HeaderDirective::Delete),
            ]),
        ),
    ])
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_rules() {
        let rules = default_header_rules();
        assert_eq!(rules.len(), 3);
        for host in ["i.pximg.net", "i-cf.pximg.net"] {
            assert_eq!(rules[host]["origin"], HeaderDirective::Delete);
            assert_eq!(
                rules[host]["referer"],
                HeaderDirective::Set("https://www.pixiv.net/".into())
            );
        }
        assert_eq!(rules["*"]["origin"], HeaderDirective::Delete);
        assert_eq!(rules["*"]["referer"], HeaderDirective::Delete);
    }

    #[test]
    fn test_header_rules_from_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [header_rules."img.example.com"]
            referer = { set = "https://example.com/" }
            origin = "delete"
            cookie = "keep"
            "#,
        )
        .unwrap();

        assert_eq!(config.header_rules.len(), 1);
        let rule = &config.header_rules["img.example.com"];
        assert_eq!(rule["referer"], HeaderDirective::Set("https://example.com/".into()));
        assert_eq!(rule["origin"], HeaderDirective::Delete);
        assert_eq!(rule["cookie"], HeaderDirective::Keep);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [gateway]
            cookie_domain = "proxy.example.net"
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.cookie_domain, "proxy.example.net");
        assert_eq!(config.gateway.internal_header_prefix, "cf-");
        assert_eq!(config.header_rules, default_header_rules());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }
}
