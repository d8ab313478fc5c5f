//! Type mapping from graph-declared types to the values kernels receive.
//!
//! Graph types are zero-sized markers. Each marker implements [`HostType`]
//! (the runtime representation it collapses onto), [`InProjection`] (what a
//! kernel reads) and, unless it is input-only, [`OutProjection`] (what a
//! kernel writes).
//!
//! | Graph type | Input target | Output target |
//! |---|---|---|
//! | `GBuffer`, `GPlanarBuffer`, `Buffer` | `Buffer` | `Buffer` (identity tracked) |
//! | `GFrame` | `Buffer` | - |
//! | `GScalar`, `Scalar` | `Scalar` | `Scalar` |
//! | `GSequence<U>` | `[U::Host]` | `Vec<U::Host>` |
//! | `GOpaque<U>` | `U::Host` | `U::Host` |
//! | plain `T` | `T` | - |
//!
//! A type with no impl is rejected at compile time when a kernel is
//! registered against it.

use std::marker::PhantomData;

use kiln_device::{Buffer, Scalar};

use crate::arg::{ArgKind, OutArg};
use crate::context::Inputs;
use crate::error::Result;
use crate::validate::BufferIdentitySnapshot;

/// Dense n-dimensional buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GBuffer;

/// Multi-plane buffer; stored as a single [`Buffer`] on this backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct GPlanarBuffer;

/// Media frame. Input-only; read as a [`Buffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GFrame;

/// Four-component scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct GScalar;

/// Ordered sequence of `U`.
pub struct GSequence<U>(PhantomData<fn() -> U>);

/// Single value of `U` that the graph does not inspect.
pub struct GOpaque<U>(PhantomData<fn() -> U>);

/// Runtime representation a graph type collapses onto.
pub trait HostType {
    type Host: Send + Sync + 'static;
}

/// How a graph type is read from the input side of the context.
pub trait InProjection {
    type Target: ?Sized;

    /// Tag the executor is expected to supply at this position.
    const KIND: ArgKind;

    fn project<'s>(inputs: &'s Inputs<'_>, index: usize) -> Result<&'s Self::Target>;
}

/// How a graph type is bound on the output side of the context.
///
/// `snapshot` runs before the kernel call and `validate` after it.
pub trait OutProjection {
    type Target;
    type Snapshot;

    const KIND: ArgKind;

    /// View the slot bound at output `index` as the kernel's parameter type.
    fn bind<'s>(slot: &'s mut OutArg<'_>, index: usize) -> Result<&'s mut Self::Target>;

    fn snapshot(target: &Self::Target) -> Self::Snapshot;

    fn validate(index: usize, target: &Self::Target, before: &Self::Snapshot) -> Result<()>;
}

macro_rules! buffer_like {
    ($($ty:ty),* $(,)?) => {$(
        impl HostType for $ty {
            type Host = Buffer;
        }

        impl InProjection for $ty {
            type Target = Buffer;
            const KIND: ArgKind = ArgKind::Buffer;

            fn project<'s>(inputs: &'s Inputs<'_>, index: usize) -> Result<&'s Buffer> {
                inputs.buffer(index)
            }
        }
    )*};
}

macro_rules! buffer_output {
    ($($ty:ty),* $(,)?) => {$(
        impl OutProjection for $ty {
            type Target = Buffer;
            type Snapshot = BufferIdentitySnapshot;
            const KIND: ArgKind = ArgKind::Buffer;

            fn bind<'s>(slot: &'s mut OutArg<'_>, index: usize) -> Result<&'s mut Buffer> {
                slot.buffer(index)
            }

            fn snapshot(target: &Buffer) -> BufferIdentitySnapshot {
                BufferIdentitySnapshot::capture(target)
            }

            fn validate(index: usize, target: &Buffer, before: &BufferIdentitySnapshot) -> Result<()> {
                before.check(index, target)
            }
        }
    )*};
}

macro_rules! scalar_like {
    ($($ty:ty),* $(,)?) => {$(
        impl HostType for $ty {
            type Host = Scalar;
        }

        impl InProjection for $ty {
            type Target = Scalar;
            const KIND: ArgKind = ArgKind::Scalar;

            fn project<'s>(inputs: &'s Inputs<'_>, index: usize) -> Result<&'s Scalar> {
                inputs.scalar(index)
            }
        }

        impl OutProjection for $ty {
            type Target = Scalar;
            type Snapshot = ();
            const KIND: ArgKind = ArgKind::Scalar;

            fn bind<'s>(slot: &'s mut OutArg<'_>, index: usize) -> Result<&'s mut Scalar> {
                slot.scalar(index)
            }

            fn snapshot(_: &Scalar) {}

            fn validate(_: usize, _: &Scalar, _: &()) -> Result<()> {
                Ok(())
            }
        }
    )*};
}

buffer_like!(GBuffer, GPlanarBuffer, GFrame, Buffer);
buffer_output!(GBuffer, GPlanarBuffer, Buffer);
scalar_like!(GScalar, Scalar);

impl<U: HostType> HostType for GSequence<U> {
    type Host = Vec<U::Host>;
}

impl<U: HostType> InProjection for GSequence<U> {
    type Target = [U::Host];
    const KIND: ArgKind = ArgKind::Sequence;

    fn project<'s>(inputs: &'s Inputs<'_>, index: usize) -> Result<&'s [U::Host]> {
        inputs.sequence::<U::Host>(index)
    }
}

impl<U: HostType> OutProjection for GSequence<U> {
    type Target = Vec<U::Host>;
    type Snapshot = ();
    const KIND: ArgKind = ArgKind::Sequence;

    fn bind<'s>(slot: &'s mut OutArg<'_>, index: usize) -> Result<&'s mut Vec<U::Host>> {
        slot.sequence::<U::Host>(index)
    }

    // Sequences may be resized freely.
    fn snapshot(_: &Vec<U::Host>) {}

    fn validate(_: usize, _: &Vec<U::Host>, _: &()) -> Result<()> {
        Ok(())
    }
}

impl<U: HostType> HostType for GOpaque<U> {
    type Host = U::Host;
}

impl<U: HostType> InProjection for GOpaque<U> {
    type Target = U::Host;
    const KIND: ArgKind = ArgKind::Opaque;

    fn project<'s>(inputs: &'s Inputs<'_>, index: usize) -> Result<&'s U::Host> {
        inputs.opaque::<U::Host>(index)
    }
}

impl<U: HostType> OutProjection for GOpaque<U> {
    type Target = U::Host;
    type Snapshot = ();
    const KIND: ArgKind = ArgKind::Opaque;

    fn bind<'s>(slot: &'s mut OutArg<'_>, index: usize) -> Result<&'s mut U::Host> {
        slot.opaque::<U::Host>(index)
    }

    fn snapshot(_: &U::Host) {}

    fn validate(_: usize, _: &U::Host, _: &()) -> Result<()> {
        Ok(())
    }
}

/// Register plain value types that map to themselves.
///
/// Registered types can be passed as raw kernel parameters and used as
/// `GSequence`/`GOpaque` element types.
///
/// ```ignore
/// #[derive(Clone)]
/// struct Roi { x: i32, y: i32, w: i32, h: i32 }
/// kiln_runtime::host_type!(Roi);
/// ```
#[macro_export]
macro_rules! host_type {
    ($($ty:ty),* $(,)?) => {$(
        impl $crate::projection::HostType for $ty {
            type Host = $ty;
        }

        impl $crate::projection::InProjection for $ty {
            type Target = $ty;
            const KIND: $crate::arg::ArgKind = $crate::arg::ArgKind::Value;

            fn project<'s>(
                inputs: &'s $crate::context::Inputs<'_>,
                index: usize,
            ) -> $crate::error::Result<&'s $ty> {
                inputs.value::<$ty>(index)
            }
        }
    )*};
}

host_type!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, kiln_dtype::DType);
