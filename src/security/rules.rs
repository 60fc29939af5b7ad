//! Per-hostname request header overrides.
//!
//! The rule table is compiled once from configuration and then only read.
//! Lookup is an exact hostname match with the `*` entry as fallback.

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::{HeaderDirective, HeaderRulesConfig, WILDCARD_HOST};

/// A header rule entry that could not be compiled.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("invalid header name `{name}` for host `{host}`")]
    InvalidName { host: String, name: String },

    #[error("invalid value for header `{name}` on host `{host}`")]
    InvalidValue { host: String, name: String },
}

#[derive(Debug, Clone)]
enum Action {
    Keep,
    Delete,
    Set(HeaderValue),
}

/// Compiled directives for one hostname.
#[derive(Debug, Clone, Default)]
pub struct HostRule {
    actions: Vec<(HeaderName, Action)>,
}

impl HostRule {
    /// Apply every directive to `headers`.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, action) in &self.actions {
            match action {
                Action::Keep => {}
                Action::Delete => {
                    headers.remove(name);
                }
                Action::Set(value) => {
                    headers.insert(name.clone(), value.clone());
                }
            }
        }
    }
}

/// Immutable hostname → header directives table.
#[derive(Debug, Clone, Default)]
pub struct HeaderRuleSet {
    hosts: HashMap<String, HostRule>,
    fallback: Option<HostRule>,
}

impl HeaderRuleSet {
    /// Compile the configured table. Hostnames are matched case-insensitively.
    pub fn compile(config: &HeaderRulesConfig) -> Result<Self, RuleError> {
        let mut hosts = HashMap::with_capacity(config.len());
        let mut fallback = None;

        for (host, directives) in config {
            let mut actions = Vec::with_capacity(directives.len());
            for (name, directive) in directives {
                let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                    RuleError::InvalidName {
                        host: host.clone(),
                        name: name.clone(),
                    }
                })?;
                let action = match directive {
                    HeaderDirective::Keep => Action::Keep,
                    HeaderDirective::Delete => Action::Delete,
                    HeaderDirective::Set(value) => {
                        Action::Set(HeaderValue::from_str(value).map_err(|_| {
                            RuleError::InvalidValue {
                                host: host.clone(),
                                name: name.clone(),
                            }
                        })?)
                    }
                };
                actions.push((header, action));
            }

            let rule = HostRule { actions };
            if host == WILDCARD_HOST {
                fallback = Some(rule);
            } else {
                hosts.insert(host.to_ascii_lowercase(), rule);
            }
        }

        Ok(Self { hosts, fallback })
    }

    /// Rule for `host`, falling back to the wildcard entry.
    pub fn lookup(&self, host: &str) -> Option<&HostRule> {
        self.hosts
            .get(&host.to_ascii_lowercase())
            .or(self.fallback.as_ref())
    }

    /// Apply the matching rule (if any) to an outgoing request's headers.
    pub fn apply(&self, host: &str, headers: &mut HeaderMap) {
        if let Some(rule) = self.lookup(host) {
            rule.apply(headers);
        }
    }
}
