//! Engine configuration.
//!
//! The configuration surface is consumed from the external collaborator
//! (the CLI adapter, or whatever host embeds the engine). Every field is a
//! [`Setting`]: either a static value or a resolver closure re-invoked on
//! each access, so the host can reconfigure at runtime without
//! reconstructing the engine.

use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Configuration key names accepted by [`EngineConfig::from_settings`].
pub mod keys {
    /// Repository location (directory path; empty means disabled).
    pub const LOCATION: &str = "location";
    /// Regex tested against the full candidate path.
    pub const EXCLUDE_PATHS: &str = "exclude_paths";
    /// Regex tested against the final path segment only.
    pub const EXCLUDE_FILES: &str = "exclude_files";
    /// Log directory (empty means logging is a no-op).
    pub const LOG: &str = "log";
}

/// A configuration value: fixed, or re-resolved on every access.
pub enum Setting {
    /// A value fixed at construction.
    Static(Option<String>),
    /// A resolver invoked on every access, so external changes take
    /// effect immediately.
    Resolver(Box<dyn Fn() -> Option<String> + Send + Sync>),
}

impl Setting {
    /// A fixed value.
    pub fn value(v: impl Into<String>) -> Self {
        Self::Static(Some(v.into()))
    }

    /// An unset value.
    pub fn unset() -> Self {
        Self::Static(None)
    }

    /// A dynamic resolver.
    pub fn resolver(f: impl Fn() -> Option<String> + Send + Sync + 'static) -> Self {
        Self::Resolver(Box::new(f))
    }

    /// Resolve the current value. Blank strings count as unset.
    fn resolve(&self) -> Option<String> {
        let raw = match self {
            Self::Static(v) => v.clone(),
            Self::Resolver(f) => f(),
        };
        raw.filter(|s| !s.trim().is_empty())
    }
}

impl Default for Setting {
    fn default() -> Self {
        Self::unset()
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::Resolver(_) => f.debug_tuple("Resolver").finish(),
        }
    }
}

/// Engine configuration.
///
/// Accessors re-resolve their setting on every call; nothing is cached
/// across calls.
#[derive(Debug, Default)]
pub struct EngineConfig {
    location: Setting,
    exclude_paths: Setting,
    exclude_files: Setting,
    log: Setting,
}

impl EngineConfig {
    /// An empty (fully unset) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `(key, setting)` pairs.
    ///
    /// Unknown keys fail construction; a later duplicate of a known key
    /// replaces the earlier one.
    pub fn from_settings(
        pairs: impl IntoIterator<Item = (String, Setting)>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::new();
        for (key, setting) in pairs {
            match key.as_str() {
                keys::LOCATION => config.location = setting,
                keys::EXCLUDE_PATHS => config.exclude_paths = setting,
                keys::EXCLUDE_FILES => config.exclude_files = setting,
                keys::LOG => config.log = setting,
                _ => return Err(ConfigError::UnknownKey { key }),
            }
        }
        Ok(config)
    }

    /// Set the repository location.
    pub fn with_location(mut self, setting: Setting) -> Self {
        self.location = setting;
        self
    }

    /// Set the path-exclusion pattern.
    pub fn with_exclude_paths(mut self, setting: Setting) -> Self {
        self.exclude_paths = setting;
        self
    }

    /// Set the file-exclusion pattern.
    pub fn with_exclude_files(mut self, setting: Setting) -> Self {
        self.exclude_files = setting;
        self
    }

    /// Set the log directory.
    pub fn with_log(mut self, setting: Setting) -> Self {
        self.log = setting;
        self
    }

    /// Currently resolved repository location.
    pub fn location(&self) -> Option<PathBuf> {
        self.location.resolve().map(PathBuf::from)
    }

    /// Currently resolved path-exclusion pattern source.
    pub fn exclude_paths_pattern(&self) -> Option<String> {
        self.exclude_paths.resolve()
    }

    /// Currently resolved file-exclusion pattern source.
    pub fn exclude_files_pattern(&self) -> Option<String> {
        self.exclude_files.resolve()
    }

    /// Currently resolved log directory.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log.resolve().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_unknown_key_fails_construction() {
        let err = EngineConfig::from_settings([(
            "repo_dir".to_string(),
            Setting::value("/tmp/history"),
        )])
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { key } if key == "repo_dir"));
    }

    #[test]
    fn test_known_keys_accepted() {
        let config = EngineConfig::from_settings([
            ("location".to_string(), Setting::value("/tmp/history")),
            ("exclude_paths".to_string(), Setting::unset()),
            ("exclude_files".to_string(), Setting::value(r".*\.tmp")),
            ("log".to_string(), Setting::unset()),
        ])
        .unwrap();

        assert_eq!(config.location(), Some(PathBuf::from("/tmp/history")));
        assert_eq!(config.exclude_paths_pattern(), None);
        assert_eq!(config.exclude_files_pattern().as_deref(), Some(r".*\.tmp"));
        assert_eq!(config.log_dir(), None);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = EngineConfig::new().with_location(Setting::value("   "));
        assert_eq!(config.location(), None);
    }

    #[test]
    fn test_resolver_reinvoked_per_access() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = EngineConfig::new().with_location(Setting::resolver(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Some(format!("/tmp/history-{n}"))
        }));

        assert_eq!(config.location(), Some(PathBuf::from("/tmp/history-0")));
        assert_eq!(config.location(), Some(PathBuf::from("/tmp/history-1")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
