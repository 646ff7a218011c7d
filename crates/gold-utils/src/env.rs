//! Environment variable helpers
//!
//! Lookups go through [`EnvLookup`] so configuration loaders can be exercised
//! in tests with a plain map instead of mutating the process environment.

use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// A required variable is unset or blank
    #[error("{0} environment variable not set")]
    Missing(String),

    /// A variable is set but cannot be parsed
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// A source of configuration values keyed by variable name
pub struct EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    lookup: F,
}

impl EnvLookup<fn(&str) -> Option<String>> {
    /// Read from the process environment
    pub fn process() -> Self {
        Self {
            lookup: |name| std::env::var(name).ok(),
        }
    }
}

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Read through a custom lookup function
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Get a value, treating blank strings as unset
    pub fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a value that must be present
    pub fn require(&self, name: &str) -> Result<String, EnvError> {
        self.get(name)
            .ok_or_else(|| EnvError::Missing(name.to_string()))
    }

    /// Get a value or fall back to `default`
    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value, returning `None` when unset
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value.parse::<T>().map(Some).map_err(|e| EnvError::Invalid {
                name: name.to_string(),
                reason: e.to_string(),
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> EnvLookup<impl Fn(&str) -> Option<String>> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        EnvLookup::new(move |name| map.get(name).cloned())
    }

    #[test]
    fn test_require_present() {
        let env = lookup(&[("API_KEY", "secret")]);
        assert_eq!(env.require("API_KEY").unwrap(), "secret");
    }

    #[test]
    fn test_require_missing_and_blank() {
        let env = lookup(&[("BLANK", "   ")]);
        assert_eq!(
            env.require("BLANK"),
            Err(EnvError::Missing("BLANK".to_string()))
        );
        assert_eq!(
            env.require("ABSENT").unwrap_err().to_string(),
            "ABSENT environment variable not set"
        );
    }

    #[test]
    fn test_get_or_default() {
        let env = lookup(&[("MODEL", "gpt-4o")]);
        assert_eq!(env.get_or("MODEL", "other"), "gpt-4o");
        assert_eq!(env.get_or("MISSING", "fallback"), "fallback");
    }

    #[test]
    fn test_parse() {
        let env = lookup(&[("PORT", "8000"), ("BAD", "eight")]);
        assert_eq!(env.parse::<u16>("PORT").unwrap(), Some(8000));
        assert_eq!(env.parse::<u16>("NOPE").unwrap(), None);

        let err = env.parse::<u16>("BAD").unwrap_err();
        assert!(matches!(err, EnvError::Invalid { ref name, .. } if name == "BAD"));
    }
}
