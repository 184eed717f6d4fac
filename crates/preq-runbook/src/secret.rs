//! Secret lookup for webhook tokens.
//!
//! The factory never reads the process environment directly; it asks a
//! [`SecretSource`]. Production code passes [`EnvSecrets`], tests pass a
//! [`StaticSecrets`] map.

use std::collections::HashMap;

/// Resolves a named secret.
pub trait SecretSource: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Clone, Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SecretSource for StaticSecrets {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticSecrets {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Resolve a secret: the direct value if non-empty, otherwise the named
/// lookup if that yields a non-empty value.
pub fn resolve_secret(
    direct: Option<&str>,
    name: Option<&str>,
    source: &dyn SecretSource,
) -> Option<String> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }
    name.filter(|n| !n.is_empty())
        .and_then(|n| source.lookup(n))
        .filter(|v| !v.is_empty())
}
