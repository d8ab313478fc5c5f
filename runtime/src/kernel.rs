//! Kernel declarations, named implementations and the uniform kernel handle.
//!
//! A kernel API ([`KernelApi`]) is an id plus input/output tuples of graph
//! types. A named implementation ([`KernelImpl`]) binds a static `run`
//! function to one API. Both named implementations and ad hoc callables (see
//! [`crate::functor`]) are turned into the same [`KernelHandle`], which is all
//! the executor ever sees.

use std::sync::Arc;

use snafu::ResultExt;
use tracing::{debug, error, trace};

use crate::backend::Backend;
use crate::context::ArgumentContext;
use crate::dispatch::{InputList, KernelFn, KernelSignature, OutputList};
use crate::error::{Error, KernelSnafu, Result};
use crate::validate::OutputSnapshot;

/// Declared kernel operation: id and signature, no implementation.
pub trait KernelApi: 'static {
    const ID: &'static str;
    type Inputs: InputList;
    type Outputs: OutputList;

    fn signature() -> KernelSignature {
        KernelSignature::of::<Self::Inputs, Self::Outputs>()
    }
}

/// Stateless implementation of a [`KernelApi`].
///
/// Usually generated by [`cpu_kernel!`](crate::cpu_kernel).
pub trait KernelImpl: 'static {
    type Api: KernelApi;
    type Run: KernelFn<<Self::Api as KernelApi>::Inputs, <Self::Api as KernelApi>::Outputs>;

    const RUN: Self::Run;

    fn kernel(backend: &Backend) -> KernelHandle {
        KernelHandle::typed::<Self::Api, _>(backend, DispatchMode::Stateless, Self::RUN)
    }
}

/// How the kernel body is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Static function of a named kernel type.
    Stateless,
    /// Callable object captured at registration.
    Stateful,
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stateless => f.write_str("stateless"),
            Self::Stateful => f.write_str("stateful"),
        }
    }
}

type Invoke = dyn Fn(&mut ArgumentContext<'_>, bool) -> Result<()> + Send + Sync;

fn invoke<F>(run: F) -> Arc<Invoke>
where
    F: Fn(&mut ArgumentContext<'_>, bool) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(run)
}

/// Uniform, immutable entry point into one kernel.
///
/// Clones share the underlying callable. Handles are reentrant and may be
/// applied from several executor threads at once.
#[derive(Clone)]
pub struct KernelHandle {
    id: Arc<str>,
    backend: Arc<str>,
    mode: DispatchMode,
    signature: Option<KernelSignature>,
    validate: bool,
    run: Arc<Invoke>,
}

impl KernelHandle {
    /// Handle for a callable typed against `Api`'s signature.
    pub(crate) fn typed<Api, C>(backend: &Backend, mode: DispatchMode, callable: C) -> Self
    where
        Api: KernelApi,
        C: KernelFn<Api::Inputs, Api::Outputs>,
    {
        let run = invoke(move |ctx, validate| callable.dispatch(ctx, validate));
        Self::from_parts(Api::ID.into(), backend, mode, Some(Api::signature()), run)
    }

    /// Handle for a callable sharing state with its creator.
    pub(crate) fn shared<Api, C>(backend: &Backend, callable: Arc<C>) -> Self
    where
        Api: KernelApi,
        C: KernelFn<Api::Inputs, Api::Outputs>,
    {
        let run = invoke(move |ctx, validate| callable.dispatch(ctx, validate));
        Self::from_parts(Api::ID.into(), backend, DispatchMode::Stateful, Some(Api::signature()), run)
    }

    /// Handle for a kernel that reads its arguments from the context itself.
    ///
    /// Every buffer output bound in the context is identity-checked.
    pub(crate) fn raw<F>(id: Arc<str>, backend: &Backend, body: F) -> Self
    where
        F: Fn(&mut ArgumentContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let run = invoke(move |ctx, validate| {
            if !validate {
                return body(ctx);
            }
            let before = OutputSnapshot::capture(ctx.outputs());
            body(ctx)?;
            before.check(ctx.outputs())
        });
        Self::from_parts(id, backend, DispatchMode::Stateful, None, run)
    }

    fn from_parts(
        id: Arc<str>,
        backend: &Backend,
        mode: DispatchMode,
        signature: Option<KernelSignature>,
        run: Arc<Invoke>,
    ) -> Self {
        let validate = backend.config().output_validation.applies_to(mode);
        debug!(
            kernel.id = %id,
            backend = %backend.name(),
            %mode,
            validate,
            signature = %signature.as_ref().map_or_else(|| "dynamic".to_string(), ToString::to_string),
            "created kernel handle"
        );
        Self { id, backend: backend.shared_name(), mode, signature, validate, run }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Declared signature; `None` for raw context kernels.
    pub fn signature(&self) -> Option<&KernelSignature> {
        self.signature.as_ref()
    }

    /// Whether output buffer identity is checked after each call.
    pub fn validates_outputs(&self) -> bool {
        self.validate
    }

    /// Run the kernel against `ctx`.
    ///
    /// Errors are wrapped in [`Error::Kernel`] carrying this handle's id; use
    /// [`Error::root`] to inspect the underlying failure.
    pub fn apply(&self, ctx: &mut ArgumentContext<'_>) -> Result<()> {
        trace!(
            kernel.id = %self.id,
            mode = %self.mode,
            inputs = ctx.input_count(),
            outputs = ctx.output_count(),
            "dispatching kernel"
        );

        (self.run)(ctx, self.validate)
            .inspect_err(|err| {
                if let Error::BufferIdentityViolation { index, before, after } = err {
                    error!(
                        kernel.id = %self.id,
                        backend = %self.backend,
                        index = *index,
                        before = *before,
                        after = *after,
                        "kernel reallocated an output buffer"
                    );
                }
            })
            .context(KernelSnafu { id: &*self.id })
    }
}

impl std::fmt::Debug for KernelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelHandle")
            .field("id", &self.id)
            .field("backend", &self.backend)
            .field("mode", &self.mode)
            .field("signature", &self.signature)
            .field("validate", &self.validate)
            .finish_non_exhaustive()
    }
}

/// Declare kernel APIs.
///
/// ```ignore
/// kernel_api! {
///     /// Multiply every element by a scalar.
///     pub struct Scale: "kiln.core.scale" (GBuffer, GScalar) -> (GBuffer);
/// }
/// ```
#[macro_export]
macro_rules! kernel_api {
    ($(
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $id:literal ($($in:ty),* $(,)?) -> ($($out:ty),* $(,)?);
    )*) => {$(
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $crate::kernel::KernelApi for $name {
            const ID: &'static str = $id;
            type Inputs = ($($in,)*);
            type Outputs = ($($out,)*);
        }
    )*};
}

/// Define a stateless kernel implementation for an API.
///
/// The body is an ordinary function: inputs first by shared reference, then
/// outputs by mutable reference, in declared order. It may return `()` or a
/// `Result<(), E>` with `E: Into<Error>`.
///
/// ```ignore
/// cpu_kernel! {
///     pub struct CpuScale: Scale;
///     fn run(src: &Buffer, k: &Scalar, dst: &mut Buffer) -> Result<()> {
///         ...
///     }
/// }
/// ```
#[macro_export]
macro_rules! cpu_kernel {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $api:ty;
        fn run($($arg:ident : $ty:ty),* $(,)?) $(-> $ret:ty)? $body:block
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $name;

        impl $name {
            $vis fn run($($arg: $ty),*) $(-> $ret)? $body
        }

        impl $crate::kernel::KernelImpl for $name {
            type Api = $api;
            type Run = fn($($ty),*) $(-> $ret)?;

            const RUN: Self::Run = $name::run;
        }
    };
}
