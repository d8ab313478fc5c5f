//! Positional unpacking of an [`ArgumentContext`] into typed kernel calls.
//!
//! A kernel signature is a pair of tuples of graph types, `(I0, .., In)` and
//! `(O0, .., Om)`. [`KernelFn`] is implemented for every callable whose
//! parameter list is the projection of such a pair: inputs first as `&Target`,
//! then outputs as `&mut Target`, both in declared order. A callable with the
//! wrong parameter list does not implement the trait and is rejected at
//! registration.
//!
//! Dispatch is strictly ordered: arity check, input projection, output
//! binding with snapshots, call, output validation. Output slots are borrowed
//! in place and remain bound in the context whether or not dispatch succeeds.

use smallvec::SmallVec;
use snafu::OptionExt;

use crate::arg::ArgKind;
use crate::context::ArgumentContext;
use crate::error::{ArityMismatchSnafu, Direction, Error, IndexOutOfRangeSnafu, Result};
use crate::projection::{InProjection, OutProjection};

/// Tuple of input graph types.
pub trait InputList: 'static {
    const ARITY: usize;

    fn kinds() -> SmallVec<[ArgKind; 8]>;
}

/// Tuple of output graph types.
pub trait OutputList: 'static {
    const ARITY: usize;

    fn kinds() -> SmallVec<[ArgKind; 8]>;
}

/// Value a kernel body returns; `()` for infallible kernels.
pub trait KernelReturn {
    fn into_result(self) -> Result<()>;
}

impl KernelReturn for () {
    fn into_result(self) -> Result<()> {
        Ok(())
    }
}

impl<E: Into<Error>> KernelReturn for std::result::Result<(), E> {
    fn into_result(self) -> Result<()> {
        self.map_err(Into::into)
    }
}

/// Runtime view of a kernel's declared signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSignature {
    pub inputs: SmallVec<[ArgKind; 8]>,
    pub outputs: SmallVec<[ArgKind; 8]>,
}

impl KernelSignature {
    pub fn of<Ins: InputList, Outs: OutputList>() -> Self {
        Self { inputs: Ins::kinds(), outputs: Outs::kinds() }
    }

    /// Fail with `ArityMismatch` unless `ctx` has exactly the declared shape.
    pub fn check_arity(&self, ctx: &ArgumentContext<'_>) -> Result<()> {
        check_arity(ctx, self.inputs.len(), self.outputs.len())
    }
}

impl std::fmt::Display for KernelSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |kinds: &[ArgKind]| kinds.iter().map(ArgKind::name).collect::<Vec<_>>().join(", ");
        write!(f, "({}) -> ({})", join(&self.inputs), join(&self.outputs))
    }
}

fn check_arity(ctx: &ArgumentContext<'_>, inputs: usize, outputs: usize) -> Result<()> {
    let (actual_inputs, actual_outputs) = (ctx.input_count(), ctx.output_count());
    snafu::ensure!(
        actual_inputs == inputs && actual_outputs == outputs,
        ArityMismatchSnafu { expected_inputs: inputs, actual_inputs, expected_outputs: outputs, actual_outputs }
    );
    Ok(())
}

fn bound_slot<T>(slot: Option<T>, index: usize, len: usize) -> Result<T> {
    slot.context(IndexOutOfRangeSnafu { direction: Direction::Output, index, len })
}

/// Callable that can be driven from an [`ArgumentContext`] for the signature
/// `Ins -> Outs`.
pub trait KernelFn<Ins, Outs>: Send + Sync + 'static {
    /// Unpack `ctx`, call the kernel and, if `validate` is set, check that no
    /// output buffer was reallocated.
    fn dispatch(&self, ctx: &mut ArgumentContext<'_>, validate: bool) -> Result<()>;
}

macro_rules! impl_list {
    ($($T:ident),*) => {
        impl<$($T: InProjection + 'static),*> InputList for ($($T,)*) {
            const ARITY: usize = <[&str]>::len(&[$(stringify!($T)),*]);

            fn kinds() -> SmallVec<[ArgKind; 8]> {
                smallvec::smallvec![$($T::KIND),*]
            }
        }
    };
}

macro_rules! impl_out_list {
    ($($T:ident),*) => {
        impl<$($T: OutProjection + 'static),*> OutputList for ($($T,)*) {
            const ARITY: usize = <[&str]>::len(&[$(stringify!($T)),*]);

            fn kinds() -> SmallVec<[ArgKind; 8]> {
                smallvec::smallvec![$($T::KIND),*]
            }
        }
    };
}

impl_list!();
impl_list!(I0);
impl_list!(I0, I1);
impl_list!(I0, I1, I2);
impl_list!(I0, I1, I2, I3);
impl_list!(I0, I1, I2, I3, I4);
impl_list!(I0, I1, I2, I3, I4, I5);
impl_list!(I0, I1, I2, I3, I4, I5, I6);
impl_list!(I0, I1, I2, I3, I4, I5, I6, I7);

impl_out_list!();
impl_out_list!(O0);
impl_out_list!(O0, O1);
impl_out_list!(O0, O1, O2);
impl_out_list!(O0, O1, O2, O3);

macro_rules! impl_kernel_fn {
    ([$($I:ident $i:ident $ii:tt),*] [$($O:ident $o:ident $oi:tt),*]) => {
        impl<Func, Ret, $($I,)* $($O,)*> KernelFn<($($I,)*), ($($O,)*)> for Func
        where
            $($I: InProjection + 'static,)*
            $($O: OutProjection + 'static,)*
            Func: Fn($(&<$I as InProjection>::Target,)* $(&mut <$O as OutProjection>::Target,)*) -> Ret
                + Send
                + Sync
                + 'static,
            Ret: KernelReturn,
        {
            #[allow(unused_variables, clippy::unused_unit)]
            fn dispatch(&self, ctx: &mut ArgumentContext<'_>, validate: bool) -> Result<()> {
                check_arity(
                    ctx,
                    <($($I,)*) as InputList>::ARITY,
                    <($($O,)*) as OutputList>::ARITY,
                )?;

                let (inputs, outputs) = ctx.split();
                let bound = outputs.len();
                $(let $i = <$I as InProjection>::project(inputs, $ii)?;)*
                let [$($o),*] = outputs.slots_mut();
                $(let $o = <$O as OutProjection>::bind(bound_slot($o, $oi, bound)?, $oi)?;)*
                let snapshots = ($(<$O as OutProjection>::snapshot(&*$o),)*);

                (self)($($i,)* $(&mut *$o,)*).into_result()?;

                if validate {
                    $(<$O as OutProjection>::validate($oi, &*$o, &snapshots.$oi)?;)*
                }
                Ok(())
            }
        }
    };
}

macro_rules! impl_kernel_fn_outputs {
    ($inputs:tt) => {
        impl_kernel_fn!($inputs []);
        impl_kernel_fn!($inputs [O0 o0 0]);
        impl_kernel_fn!($inputs [O0 o0 0, O1 o1 1]);
        impl_kernel_fn!($inputs [O0 o0 0, O1 o1 1, O2 o2 2]);
        impl_kernel_fn!($inputs [O0 o0 0, O1 o1 1, O2 o2 2, O3 o3 3]);
    };
}

impl_kernel_fn_outputs!([]);
impl_kernel_fn_outputs!([I0 i0 0]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1, I2 i2 2]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1, I2 i2 2, I3 i3 3]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1, I2 i2 2, I3 i3 3, I4 i4 4]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1, I2 i2 2, I3 i3 3, I4 i4 4, I5 i5 5]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1, I2 i2 2, I3 i3 3, I4 i4 4, I5 i5 5, I6 i6 6]);
impl_kernel_fn_outputs!([I0 i0 0, I1 i1 1, I2 i2 2, I3 i3 3, I4 i4 4, I5 i5 5, I6 i6 6, I7 i7 7]);
