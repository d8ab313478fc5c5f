//! Ad hoc kernels built from callables.
//!
//! A [`Functor`] is the registration token for a kernel whose body is a
//! callable object rather than a named [`KernelImpl`](crate::KernelImpl). The
//! executor cannot tell the two apart: both end up as a [`KernelHandle`].

use std::sync::Arc;

use crate::backend::Backend;
use crate::context::ArgumentContext;
use crate::dispatch::KernelFn;
use crate::error::Result;
use crate::kernel::{DispatchMode, KernelApi, KernelHandle};

/// Identifying token plus handle for a callable kernel.
#[derive(Debug, Clone)]
pub struct Functor {
    handle: KernelHandle,
}

impl Functor {
    /// Kernel that reads its arguments from the context directly.
    ///
    /// No signature is declared, so no arity check is performed; buffer
    /// outputs are still identity-checked according to the backend policy.
    pub fn from_fn<F>(backend: &Backend, id: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&mut ArgumentContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self { handle: KernelHandle::raw(id.into(), backend, body) }
    }

    pub fn id(&self) -> &str {
        self.handle.id()
    }

    pub fn backend(&self) -> &str {
        self.handle.backend()
    }

    pub fn handle(&self) -> &KernelHandle {
        &self.handle
    }

    pub fn into_handle(self) -> KernelHandle {
        self.handle
    }
}

/// Bind an owned callable to `Api`.
///
/// The callable is moved into the handle; its captured state is private to
/// the kernel from then on.
///
/// ```ignore
/// let gain = 2.0;
/// let scale = functor::<Scale, _>(&backend, move |src: &Buffer, k: &Scalar, dst: &mut Buffer| {
///     ...
/// });
/// ```
pub fn functor<Api, C>(backend: &Backend, callable: C) -> Functor
where
    Api: KernelApi,
    C: KernelFn<Api::Inputs, Api::Outputs>,
{
    Functor { handle: KernelHandle::typed::<Api, C>(backend, DispatchMode::Stateful, callable) }
}

/// Bind a shared callable to `Api`.
///
/// The creator keeps its own `Arc` and can observe state the kernel updates
/// (through interior mutability the callable owns).
pub fn functor_shared<Api, C>(backend: &Backend, callable: Arc<C>) -> Functor
where
    Api: KernelApi,
    C: KernelFn<Api::Inputs, Api::Outputs>,
{
    Functor { handle: KernelHandle::shared::<Api, C>(backend, callable) }
}
