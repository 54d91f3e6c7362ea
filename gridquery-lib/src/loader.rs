//! Debounced async loading of select-filter options.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::column::SelectOption;
use crate::error::OptionsError;

/// Default debounce applied before querying a provider.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

/// Source of select-filter options, queried as the user types.
#[async_trait]
pub trait OptionsProvider: Send + Sync {
    /// Loads the options matching the typed text.
    async fn load(&self, text: &str) -> Result<Vec<SelectOption>, OptionsError>;
}

#[derive(Debug, Default)]
struct LoaderState {
    options: Vec<SelectOption>,
    loading: bool,
}

/// Debounces and serializes queries against an [`OptionsProvider`].
///
/// Each `query` call bumps a generation counter; a call whose generation has
/// been superseded by the time its debounce elapses (or its response lands)
/// discards the result instead of overwriting a newer one. Cheap to clone,
/// clones share state.
#[derive(Clone)]
pub struct OptionsLoader {
    provider: Arc<dyn OptionsProvider>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    state: Arc<Mutex<LoaderState>>,
}

impl OptionsLoader {
    /// Creates a loader with the default debounce.
    pub fn new(provider: Arc<dyn OptionsProvider>) -> Self {
        Self::with_debounce(provider, DEFAULT_DEBOUNCE)
    }

    /// Creates a loader with a custom debounce.
    pub fn with_debounce(provider: Arc<dyn OptionsProvider>, debounce: Duration) -> Self {
        Self {
            provider,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(LoaderState::default())),
        }
    }

    /// Queries the provider for the typed text, after the debounce.
    ///
    /// Returns the loaded options, or `None` when this call was superseded
    /// by a newer one or the provider failed. Provider failures are logged
    /// and leave the previously loaded options in place.
    pub async fn query(&self, text: &str) -> Option<Vec<SelectOption>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().await.loading = true;

        tokio::time::sleep(self.debounce).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("option query '{}' superseded during debounce", text);
            return None;
        }

        let result = self.provider.load(text).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            log::debug!("option query '{}' superseded in flight, discarding", text);
            return None;
        }

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(options) => {
                state.options = options.clone();
                Some(options)
            }
            Err(e) => {
                log::warn!("option query '{}' failed: {}", text, e);
                None
            }
        }
    }

    /// Returns the most recently loaded options.
    pub async fn options(&self) -> Vec<SelectOption> {
        self.state.lock().await.options.clone()
    }

    /// Returns `true` while a query is debouncing or in flight.
    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }
}

impl std::fmt::Debug for OptionsLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionsLoader")
            .field("debounce", &self.debounce)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl OptionsProvider for EchoProvider {
        async fn load(&self, text: &str) -> Result<Vec<SelectOption>, OptionsError> {
            Ok(vec![SelectOption::new(text, text)])
        }
    }

    struct FlakyProvider;

    #[async_trait]
    impl OptionsProvider for FlakyProvider {
        async fn load(&self, text: &str) -> Result<Vec<SelectOption>, OptionsError> {
            if text == "boom" {
                return Err(OptionsError::new("backend unavailable"));
            }
            Ok(vec![SelectOption::new(text, text)])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_loads_after_debounce() {
        let loader = OptionsLoader::new(Arc::new(EchoProvider));
        let options = loader.query("leanne").await.unwrap();
        assert_eq!(options, vec![SelectOption::new("leanne", "leanne")]);
        assert_eq!(loader.options().await, options);
        assert!(!loader.is_loading().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_query_is_discarded() {
        let loader = OptionsLoader::new(Arc::new(EchoProvider));

        let stale = loader.clone();
        let handle = tokio::spawn(async move { stale.query("le").await });
        // let the first query register its generation and start debouncing
        tokio::task::yield_now().await;

        let fresh = loader.query("leanne").await;
        assert_eq!(fresh, Some(vec![SelectOption::new("leanne", "leanne")]));
        assert_eq!(handle.await.unwrap(), None);
        assert_eq!(loader.options().await, vec![SelectOption::new("leanne", "leanne")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_clears_loading_and_keeps_options() {
        let loader = OptionsLoader::new(Arc::new(FlakyProvider));
        loader.query("leanne").await;

        assert_eq!(loader.query("boom").await, None);
        assert!(!loader.is_loading().await);
        assert_eq!(loader.options().await, vec![SelectOption::new("leanne", "leanne")]);
    }
}
