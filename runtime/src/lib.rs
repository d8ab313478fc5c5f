//! Typed kernel invocation for kiln graph backends.
//!
//! The graph executor describes each node only by a kernel id and the graph
//! types of its arguments. This crate turns the executor's index-addressed
//! argument list into typed kernel calls and checks the results:
//!
//! - [`context`]: the per-call [`ArgumentContext`] the executor fills.
//! - [`projection`]: graph marker types and what each projects to.
//! - [`dispatch`]: positional unpacking into typed calls ([`KernelFn`]).
//! - [`validate`]: output buffer identity checks.
//! - [`kernel`], [`functor`]: named and ad hoc kernels, both yielding a
//!   [`KernelHandle`].
//! - [`package`], [`backend`]: registration surface.
//!
//! # Example
//!
//! ```ignore
//! kernel_api! {
//!     pub struct Scale: "kiln.core.scale" (GBuffer, GScalar) -> (GBuffer);
//! }
//!
//! cpu_kernel! {
//!     pub struct CpuScale: Scale;
//!     fn run(src: &Buffer, k: &Scalar, dst: &mut Buffer) -> Result<()> {
//!         for (d, s) in dst.as_mut_slice::<f32>()?.iter_mut().zip(src.as_slice::<f32>()?) {
//!             *d = s * k[0] as f32;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let handle = CpuScale::kernel(&cpu());
//! let mut ctx = ArgumentContext::new().with_input(&src).with_input(Scalar::all(10.0)).with_output(0, &mut dst);
//! handle.apply(&mut ctx)?;
//! ```

pub mod arg;
pub mod backend;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod functor;
pub mod kernel;
pub mod package;
pub mod projection;
pub mod validate;

#[cfg(test)]
pub mod test;

pub use arg::{Arg, ArgKind, OpaqueRef, OutArg, SequenceRef};
pub use backend::{Backend, BackendRegistry, CPU, backends, cpu};
pub use config::{DispatchConfig, OutputValidation};
pub use context::{ArgumentContext, Inputs, Outputs};
pub use dispatch::{InputList, KernelFn, KernelReturn, KernelSignature, OutputList};
pub use error::*;
pub use functor::{Functor, functor, functor_shared};
pub use kernel::{DispatchMode, KernelApi, KernelHandle, KernelImpl};
pub use kiln_device::{Buffer, Scalar};
pub use package::KernelPackage;
pub use projection::{GBuffer, GFrame, GOpaque, GPlanarBuffer, GScalar, GSequence, HostType, InProjection, OutProjection};
pub use validate::{BufferIdentitySnapshot, OutputSnapshot};
