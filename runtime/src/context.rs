//! Per-invocation argument context.
//!
//! The executor fills an [`ArgumentContext`] with the resolved inputs of one
//! graph node and with mutable borrows of that node's pre-allocated outputs,
//! then hands it to the node's kernel handle. The context never allocates
//! kernel outputs; it only exposes storage the executor already owns.

use std::any::Any;
use std::collections::HashMap;

use kiln_device::{Buffer, Scalar};
use smallvec::SmallVec;
use snafu::OptionExt;

use crate::arg::{Arg, ArgKind, OutArg};
use crate::error::{Direction, Error, IndexOutOfRangeSnafu, Result};

fn mismatch(direction: Direction, index: usize, expected: &'static str, actual: &'static str) -> Error {
    Error::TypeMismatch { direction, index, expected, actual }
}

/// Ordered input arguments; position is the kernel parameter index.
#[derive(Debug, Default)]
pub struct Inputs<'a> {
    args: SmallVec<[Arg<'a>; 8]>,
}

impl<'a> Inputs<'a> {
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = ArgKind> + '_ {
        self.args.iter().map(Arg::kind)
    }

    pub fn get(&self, index: usize) -> Result<&Arg<'a>> {
        let len = self.args.len();
        self.args.get(index).ok_or_else(|| IndexOutOfRangeSnafu { direction: Direction::Input, index, len }.build())
    }

    /// Input `index` reinterpreted as `T`.
    ///
    /// `T` may be the payload of any tag: `Buffer`, `Scalar`, `SequenceRef`,
    /// `OpaqueRef`, or the type of a plain value argument.
    pub fn arg<T: 'static>(&self, index: usize) -> Result<&T> {
        let arg = self.get(index)?;
        let found: Option<&T> = match arg {
            Arg::Buffer(buffer) => (*buffer as &dyn Any).downcast_ref(),
            Arg::Scalar(scalar) => (scalar as &dyn Any).downcast_ref(),
            Arg::Sequence(seq) => (*seq as &dyn Any).downcast_ref(),
            Arg::Opaque(opaque) => (*opaque as &dyn Any).downcast_ref(),
            Arg::Value { value, .. } => value.downcast_ref(),
        };
        found.ok_or_else(|| mismatch(Direction::Input, index, std::any::type_name::<T>(), arg.type_name()))
    }

    pub fn buffer(&self, index: usize) -> Result<&'a Buffer> {
        match self.get(index)? {
            Arg::Buffer(buffer) => Ok(*buffer),
            other => Err(mismatch(Direction::Input, index, ArgKind::Buffer.name(), other.type_name())),
        }
    }

    pub fn scalar(&self, index: usize) -> Result<&Scalar> {
        match self.get(index)? {
            Arg::Scalar(scalar) => Ok(scalar),
            other => Err(mismatch(Direction::Input, index, ArgKind::Scalar.name(), other.type_name())),
        }
    }

    pub fn sequence<T: 'static>(&self, index: usize) -> Result<&'a [T]> {
        let expected = std::any::type_name::<Vec<T>>();
        match self.get(index)? {
            Arg::Sequence(seq) => {
                seq.rref::<T>().map(Vec::as_slice).ok_or_else(|| mismatch(Direction::Input, index, expected, seq.type_name()))
            }
            other => Err(mismatch(Direction::Input, index, expected, other.type_name())),
        }
    }

    pub fn opaque<T: 'static>(&self, index: usize) -> Result<&'a T> {
        let expected = std::any::type_name::<T>();
        match self.get(index)? {
            Arg::Opaque(opaque) => {
                opaque.rref::<T>().ok_or_else(|| mismatch(Direction::Input, index, expected, opaque.type_name()))
            }
            other => Err(mismatch(Direction::Input, index, expected, other.type_name())),
        }
    }

    /// Plain value argument of type `T`.
    pub fn value<T: 'static>(&self, index: usize) -> Result<&'a T> {
        let expected = std::any::type_name::<T>();
        match self.get(index)? {
            Arg::Value { value, type_name } => {
                value.downcast_ref::<T>().ok_or_else(|| mismatch(Direction::Input, index, expected, *type_name))
            }
            other => Err(mismatch(Direction::Input, index, expected, other.type_name())),
        }
    }
}

/// Output slots keyed by output index.
#[derive(Debug, Default)]
pub struct Outputs<'a> {
    slots: HashMap<usize, OutArg<'a>>,
}

impl<'a> Outputs<'a> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.slots.contains_key(&index)
    }

    pub fn buffer(&mut self, index: usize) -> Result<&mut Buffer> {
        self.slot(index)?.buffer(index)
    }

    pub fn scalar(&mut self, index: usize) -> Result<&mut Scalar> {
        self.slot(index)?.scalar(index)
    }

    pub fn sequence<T: 'static>(&mut self, index: usize) -> Result<&mut Vec<T>> {
        self.slot(index)?.sequence(index)
    }

    pub fn opaque<T: 'static>(&mut self, index: usize) -> Result<&mut T> {
        self.slot(index)?.opaque(index)
    }

    fn slot(&mut self, index: usize) -> Result<&mut OutArg<'a>> {
        let len = self.slots.len();
        self.slots.get_mut(&index).context(IndexOutOfRangeSnafu { direction: Direction::Output, index, len })
    }

    pub(crate) fn bound_buffers(&self) -> impl Iterator<Item = (usize, &Buffer)> + '_ {
        self.slots.iter().filter_map(|(index, slot)| match slot {
            OutArg::Buffer(buffer) => Some((*index, &**buffer)),
            _ => None,
        })
    }

    pub(crate) fn get(&self, index: usize) -> Option<&OutArg<'a>> {
        self.slots.get(&index)
    }

    /// Disjoint borrows of slots `0..N`, in index order.
    ///
    /// Slots stay in the map, so a failed or finished dispatch leaves every
    /// binding visible to the executor.
    pub(crate) fn slots_mut<const N: usize>(&mut self) -> [Option<&mut OutArg<'a>>; N] {
        let mut slots: [Option<&mut OutArg<'a>>; N] = std::array::from_fn(|_| None);
        for (index, slot) in &mut self.slots {
            if let Some(entry) = slots.get_mut(*index) {
                *entry = Some(slot);
            }
        }
        slots
    }
}

impl OutArg<'_> {
    pub(crate) fn buffer(&mut self, index: usize) -> Result<&mut Buffer> {
        match self {
            OutArg::Buffer(buffer) => Ok(&mut **buffer),
            other => Err(mismatch(Direction::Output, index, ArgKind::Buffer.name(), other.type_name())),
        }
    }

    pub(crate) fn scalar(&mut self, index: usize) -> Result<&mut Scalar> {
        match self {
            OutArg::Scalar(scalar) => Ok(&mut **scalar),
            other => Err(mismatch(Direction::Output, index, ArgKind::Scalar.name(), other.type_name())),
        }
    }

    pub(crate) fn sequence<T: 'static>(&mut self, index: usize) -> Result<&mut Vec<T>> {
        let expected = std::any::type_name::<Vec<T>>();
        match self {
            OutArg::Sequence(seq) => {
                let found = seq.type_name();
                seq.wref::<T>().ok_or_else(|| mismatch(Direction::Output, index, expected, found))
            }
            other => Err(mismatch(Direction::Output, index, expected, other.type_name())),
        }
    }

    pub(crate) fn opaque<T: 'static>(&mut self, index: usize) -> Result<&mut T> {
        let expected = std::any::type_name::<T>();
        match self {
            OutArg::Opaque(opaque) => {
                let found = opaque.type_name();
                opaque.wref::<T>().ok_or_else(|| mismatch(Direction::Output, index, expected, found))
            }
            other => Err(mismatch(Direction::Output, index, expected, other.type_name())),
        }
    }
}

/// Arguments of one kernel invocation.
///
/// Created fresh by the executor for every call and dropped when the call
/// returns. Never shared between invocations.
#[derive(Debug, Default)]
pub struct ArgumentContext<'a> {
    inputs: Inputs<'a>,
    outputs: Outputs<'a>,
}

impl<'a> ArgumentContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next positional input.
    pub fn push_input(&mut self, arg: impl Into<Arg<'a>>) {
        self.inputs.args.push(arg.into());
    }

    pub fn with_input(mut self, arg: impl Into<Arg<'a>>) -> Self {
        self.push_input(arg);
        self
    }

    /// Append a plain value input.
    pub fn push_value<T: 'static>(&mut self, value: &'a T) {
        self.inputs.args.push(Arg::value(value));
    }

    pub fn with_value<T: 'static>(mut self, value: &'a T) -> Self {
        self.push_value(value);
        self
    }

    /// Bind output `index` to executor storage, returning the previous slot.
    pub fn bind_output(&mut self, index: usize, slot: impl Into<OutArg<'a>>) -> Option<OutArg<'a>> {
        self.outputs.slots.insert(index, slot.into())
    }

    pub fn with_output(mut self, index: usize, slot: impl Into<OutArg<'a>>) -> Self {
        self.bind_output(index, slot);
        self
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn inputs(&self) -> &Inputs<'a> {
        &self.inputs
    }

    pub fn outputs(&self) -> &Outputs<'a> {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut Outputs<'a> {
        &mut self.outputs
    }

    /// Disjoint borrows of both halves, as the dispatcher needs them.
    pub fn split(&mut self) -> (&Inputs<'a>, &mut Outputs<'a>) {
        (&self.inputs, &mut self.outputs)
    }

    // Accessors for kernels written directly against the context.

    pub fn in_arg<T: 'static>(&self, index: usize) -> Result<&T> {
        self.inputs.arg(index)
    }

    pub fn in_buffer(&self, index: usize) -> Result<&'a Buffer> {
        self.inputs.buffer(index)
    }

    pub fn in_scalar(&self, index: usize) -> Result<Scalar> {
        self.inputs.scalar(index).copied()
    }

    pub fn in_sequence<T: 'static>(&self, index: usize) -> Result<&'a [T]> {
        self.inputs.sequence(index)
    }

    pub fn in_opaque<T: 'static>(&self, index: usize) -> Result<&'a T> {
        self.inputs.opaque(index)
    }

    pub fn in_value<T: 'static>(&self, index: usize) -> Result<&'a T> {
        self.inputs.value(index)
    }

    pub fn out_buffer(&mut self, index: usize) -> Result<&mut Buffer> {
        self.outputs.buffer(index)
    }

    pub fn out_scalar(&mut self, index: usize) -> Result<&mut Scalar> {
        self.outputs.scalar(index)
    }

    pub fn out_sequence<T: 'static>(&mut self, index: usize) -> Result<&mut Vec<T>> {
        self.outputs.sequence(index)
    }

    pub fn out_opaque<T: 'static>(&mut self, index: usize) -> Result<&mut T> {
        self.outputs.opaque(index)
    }
}
