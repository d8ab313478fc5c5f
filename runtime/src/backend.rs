//! Backend handles and the process-wide backend registry.
//!
//! A [`Backend`] names the execution target kernels are registered against and
//! carries the [`DispatchConfig`] its handles are created with. Kernel
//! registration takes the backend by reference, so tests and embedders can use
//! private registries alongside the global one.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::DispatchConfig;
use crate::error::{Result, UnknownBackendSnafu};

/// Name of the built-in host backend.
pub const CPU: &str = "CPU";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    name: Arc<str>,
    config: DispatchConfig,
}

impl Backend {
    pub fn new(name: impl Into<Arc<str>>, config: DispatchConfig) -> Self {
        Self { name: name.into(), config }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

/// Backends keyed by case-insensitive name.
///
/// # Thread Safety
///
/// Lookups take a read lock; creation upgrades to a write lock and re-checks
/// the cache so concurrent callers observe a single instance per name.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: RwLock<HashMap<String, Arc<Backend>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `backend`, replacing any backend registered under the same name.
    pub fn register(&self, backend: Backend) -> Arc<Backend> {
        let backend = Arc::new(backend);
        debug!(backend = %backend.name(), config = ?backend.config(), "registering backend");
        self.backends.write().insert(backend.name().to_uppercase(), Arc::clone(&backend));
        backend
    }

    pub fn get(&self, name: &str) -> Result<Arc<Backend>> {
        self.backends
            .read()
            .get(&name.to_uppercase())
            .cloned()
            .ok_or_else(|| UnknownBackendSnafu { name }.build())
    }

    /// Return the backend named `name`, creating it with `init` on first use.
    pub fn get_or_init(&self, name: &str, init: impl FnOnce() -> Backend) -> Arc<Backend> {
        let key = name.to_uppercase();

        // Fast path: read lock to check cache
        if let Some(backend) = self.backends.read().get(&key) {
            return Arc::clone(backend);
        }

        // Slow path: write lock, re-check, then create
        let mut backends = self.backends.write();
        if let Some(backend) = backends.get(&key) {
            return Arc::clone(backend);
        }
        let backend = Arc::new(init());
        debug!(backend = %backend.name(), config = ?backend.config(), "created backend");
        backends.insert(key, Arc::clone(&backend));
        backend
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.read().contains_key(&name.to_uppercase())
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.backends.read().values().map(|backend| backend.name().to_string()).collect();
        names.sort();
        names
    }
}

static BACKENDS: Lazy<BackendRegistry> = Lazy::new(BackendRegistry::new);

/// Process-wide backend registry.
pub fn backends() -> &'static BackendRegistry {
    &BACKENDS
}

/// Default host backend, configured from the environment on first use.
pub fn cpu() -> Arc<Backend> {
    backends().get_or_init(CPU, || Backend::new(CPU, DispatchConfig::from_env()))
}
