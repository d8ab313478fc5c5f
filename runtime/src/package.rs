//! Kernel packages: the set of implementations handed to the executor.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::functor::Functor;
use crate::kernel::{KernelHandle, KernelImpl};

/// Kernel handles keyed by kernel id.
///
/// Later registrations for an id replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct KernelPackage {
    kernels: BTreeMap<String, KernelHandle>,
}

impl KernelPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the named implementation `K` on `backend`.
    pub fn include<K: KernelImpl>(&mut self, backend: &Backend) -> &mut Self {
        self.insert(K::kernel(backend))
    }

    /// Builder-style [`include`](Self::include).
    pub fn with<K: KernelImpl>(mut self, backend: &Backend) -> Self {
        self.include::<K>(backend);
        self
    }

    pub fn include_functor(&mut self, functor: Functor) -> &mut Self {
        self.insert(functor.into_handle())
    }

    pub fn include_handle(&mut self, handle: KernelHandle) -> &mut Self {
        self.insert(handle)
    }

    fn insert(&mut self, handle: KernelHandle) -> &mut Self {
        debug!(kernel.id = %handle.id(), backend = %handle.backend(), mode = %handle.mode(), "including kernel");
        if let Some(previous) = self.kernels.insert(handle.id().to_string(), handle) {
            warn!(kernel.id = %previous.id(), backend = %previous.backend(), "replaced kernel in package");
        }
        self
    }

    pub fn lookup(&self, id: &str) -> Option<&KernelHandle> {
        self.kernels.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.kernels.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<KernelHandle> {
        self.kernels.remove(id)
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Kernel ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.kernels.keys().map(String::as_str)
    }

    /// Merge `other` into `self`; entries of `other` win on conflicts.
    pub fn extend(&mut self, other: KernelPackage) {
        for handle in other.kernels.into_values() {
            self.insert(handle);
        }
    }
}
