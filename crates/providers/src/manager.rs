//! Provider manager: picks a usable backend for each query.
//!
//! Selection order: caller preference, then the default provider, then the
//! fallback chain. Availability is probed on every call; nothing is cached.

use safina_core::error::ManagerError;
use safina_core::provider::Provider;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registry of text-generation backends with health-checked fallback.
pub struct ProviderManager {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: Option<String>,
    fallback_order: Vec<String>,
}

impl ProviderManager {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: None,
            fallback_order: Vec::new(),
        }
    }

    /// Register a provider. Replaces any existing provider with the same name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        let name = name.into();
        info!(provider = %name, "Registered provider");
        self.providers.insert(name, provider);
    }

    /// Set the default provider. The name must already be registered.
    pub fn set_default(&mut self, name: &str) -> Result<(), ManagerError> {
        if !self.providers.contains_key(name) {
            return Err(ManagerError::UnknownProvider(name.to_string()));
        }
        info!(provider = %name, "Default provider set");
        self.default_provider = Some(name.to_string());
        Ok(())
    }

    /// Set the fallback chain. Stored verbatim; unknown names are skipped at
    /// selection time.
    pub fn set_fallback_order(&mut self, names: Vec<String>) {
        self.fallback_order = names;
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn fallback_order(&self) -> &[String] {
        &self.fallback_order
    }

    /// Pick the first available provider: `preferred`, then the default,
    /// then the fallback chain in order. `None` means every candidate is
    /// down, which callers must treat as degraded service.
    pub async fn select_active(&self, preferred: Option<&str>) -> Option<Arc<dyn Provider>> {
        if let Some(name) = preferred {
            if let Some(provider) = self.available(name).await {
                return Some(provider);
            }
            debug!(provider = %name, "Preferred provider unavailable");
        }

        if let Some(name) = &self.default_provider {
            if let Some(provider) = self.available(name).await {
                return Some(provider);
            }
        }

        for name in &self.fallback_order {
            if let Some(provider) = self.available(name).await {
                warn!(provider = %name, "Using fallback provider");
                return Some(provider);
            }
        }

        warn!("No provider available");
        None
    }

    /// The provider under `name` if it is registered and currently up.
    async fn available(&self, name: &str) -> Option<Arc<dyn Provider>> {
        let provider = self.providers.get(name)?;
        let status = provider.check_availability().await;
        if status.available {
            Some(Arc::clone(provider))
        } else {
            debug!(provider = %name, error = ?status.error, "Provider reported unavailable");
            None
        }
    }

    /// Current availability of every registered provider, keyed by name.
    pub async fn list_availability(&self) -> BTreeMap<String, bool> {
        let mut out = BTreeMap::new();
        for (name, provider) in &self.providers {
            out.insert(name.clone(), provider.check_availability().await.available);
        }
        out
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use safina_core::error::ProviderError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// A provider whose availability can be flipped at runtime.
    struct SwitchProvider {
        name: String,
        up: AtomicBool,
        probes: AtomicUsize,
    }

    impl SwitchProvider {
        fn new(name: &str, up: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                up: AtomicBool::new(up),
                probes: AtomicUsize::new(0),
            })
        }

        fn probes(&self) -> usize {
            self.probes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for SwitchProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn generate(&self, _: &str, _: u32, _: f32) -> Result<String, ProviderError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.up.load(Ordering::SeqCst) {
                Ok("ok".into())
            } else {
                Err(ProviderError::Network("down".into()))
            }
        }
    }

    #[tokio::test]
    async fn falls_back_when_default_is_down() {
        let a = SwitchProvider::new("a", false);
        let b = SwitchProvider::new("b", true);

        let mut manager = ProviderManager::new();
        manager.register("a", a.clone());
        manager.register("b", b.clone());
        manager.set_default("a").unwrap();
        manager.set_fallback_order(vec!["b".into()]);

        let selected = manager.select_active(None).await.unwrap();
        assert_eq!(selected.name(), "b");
    }

    #[tokio::test]
    async fn preference_wins_when_available() {
        let a = SwitchProvider::new("a", true);
        let b = SwitchProvider::new("b", true);

        let mut manager = ProviderManager::new();
        manager.register("a", a.clone());
        manager.register("b", b.clone());
        manager.set_default("a").unwrap();

        let selected = manager.select_active(Some("b")).await.unwrap();
        assert_eq!(selected.name(), "b");
        assert_eq!(a.probes(), 0);
    }

    #[tokio::test]
    async fn unknown_preference_falls_through_to_default() {
        let a = SwitchProvider::new("a", true);
        let mut manager = ProviderManager::new();
        manager.register("a", a);
        manager.set_default("a").unwrap();

        let selected = manager.select_active(Some("nope")).await.unwrap();
        assert_eq!(selected.name(), "a");
    }

    #[tokio::test]
    async fn none_when_everything_is_down() {
        let mut manager = ProviderManager::new();
        manager.register("a", SwitchProvider::new("a", false));
        manager.register("b", SwitchProvider::new("b", false));
        manager.set_default("a").unwrap();
        manager.set_fallback_order(vec!["b".into()]);

        assert!(manager.select_active(None).await.is_none());
        assert!(manager.select_active(Some("b")).await.is_none());
    }

    #[tokio::test]
    async fn unregistered_fallback_names_are_skipped() {
        let c = SwitchProvider::new("c", true);
        let mut manager = ProviderManager::new();
        manager.register("c", c);
        manager.set_fallback_order(vec!["ghost".into(), "c".into()]);

        let selected = manager.select_active(None).await.unwrap();
        assert_eq!(selected.name(), "c");
    }

    #[tokio::test]
    async fn availability_is_rechecked_every_call() {
        let a = SwitchProvider::new("a", true);
        let b = SwitchProvider::new("b", true);
        let mut manager = ProviderManager::new();
        manager.register("a", a.clone());
        manager.register("b", b.clone());
        manager.set_default("a").unwrap();
        manager.set_fallback_order(vec!["b".into()]);

        assert_eq!(manager.select_active(None).await.unwrap().name(), "a");
        a.up.store(false, Ordering::SeqCst);
        assert_eq!(manager.select_active(None).await.unwrap().name(), "b");
        a.up.store(true, Ordering::SeqCst);
        assert_eq!(manager.select_active(None).await.unwrap().name(), "a");
        assert_eq!(a.probes(), 3);
    }

    #[test]
    fn set_default_rejects_unknown() {
        let mut manager = ProviderManager::new();
        let err = manager.set_default("gemini").unwrap_err();
        assert_eq!(err, ManagerError::UnknownProvider("gemini".into()));
        assert!(manager.default_name().is_none());
    }

    #[test]
    fn register_overwrites_silently() {
        let mut manager = ProviderManager::new();
        manager.register("a", SwitchProvider::new("first", true));
        manager.register("a", SwitchProvider::new("second", true));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get("a").unwrap().name(), "second");
    }

    #[tokio::test]
    async fn list_availability_reports_each_provider() {
        let mut manager = ProviderManager::new();
        manager.register("a", SwitchProvider::new("a", false));
        manager.register("b", SwitchProvider::new("b", true));

        let report = manager.list_availability().await;
        assert_eq!(report.len(), 2);
        assert!(!report["a"]);
        assert!(report["b"]);
    }
}
