//! Fuse registry.
//!
//! Builds one breaker per configured fuse and hands them out by id.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::PolyfuseConfig;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::types::FuseResult;
use crate::resilience::DecayingFuse;

/// Collection of fuses keyed by id.
#[derive(Debug, Default)]
pub struct FuseRegistry {
    fuses: HashMap<String, Arc<DecayingFuse>>,
}

impl FuseRegistry {
    /// Build every configured fuse against the system clock.
    pub fn from_config(config: &PolyfuseConfig) -> FuseResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build every configured fuse sharing `clock`.
    ///
    /// Fails on the first fuse with invalid settings. A later duplicate id
    /// replaces the earlier fuse; [`crate::config::validation::validate_config`]
    /// rejects duplicates up front.
    pub fn with_clock(config: &PolyfuseConfig, clock: Arc<dyn Clock>) -> FuseResult<Self> {
        let mut fuses = HashMap::with_capacity(config.fuses.len());
        for settings in &config.fuses {
            let fuse = DecayingFuse::builder(settings.clone())
                .clock(clock.clone())
                .build()?;
            fuses.insert(settings.id.clone(), Arc::new(fuse));
        }
        Ok(Self { fuses })
    }

    /// Register an already built fuse.
    pub fn insert(&mut self, fuse: DecayingFuse) -> Arc<DecayingFuse> {
        let fuse = Arc::new(fuse);
        self.fuses.insert(fuse.settings().id.clone(), fuse.clone());
        fuse
    }

    pub fn get(&self, id: &str) -> Option<Arc<DecayingFuse>> {
        self.fuses.get(id).cloned()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fuses.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.fuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuseSettings;
    use crate::resilience::types::FuseError;
    use crate::resilience::Fuse;

    #[test]
    fn test_registry_from_config() {
        let config = PolyfuseConfig {
            fuses: vec![FuseSettings::new("users"), FuseSettings::new("billing")],
            ..PolyfuseConfig::default()
        };
        let registry = FuseRegistry::from_config(&config).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["billing", "users"]);
        assert_eq!(registry.get("users").unwrap().id(), "users");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_registry_rejects_invalid_fuse() {
        let config = PolyfuseConfig {
            fuses: vec![FuseSettings {
                timeframe_secs: -1,
                ..FuseSettings::new("broken")
            }],
            ..PolyfuseConfig::default()
        };
        let err = FuseRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, FuseError::InvalidSettings(_)));
    }

    #[test]
    fn test_insert() {
        let mut registry = FuseRegistry::default();
        assert!(registry.is_empty());
        registry.insert(DecayingFuse::new(FuseSettings::new("cache")).unwrap());
        assert!(registry.get("cache").is_some());
    }
}
