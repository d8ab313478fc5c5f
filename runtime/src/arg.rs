//! Runtime argument values exchanged between the executor and kernels.
//!
//! Inputs are borrowed read-only from executor storage ([`Arg`]); outputs are
//! mutable borrows of pre-allocated executor storage ([`OutArg`]). Sequence and
//! opaque payloads are type-erased and recovered by downcasting to the element
//! type the kernel signature names.

use std::any::Any;

use kiln_device::{Buffer, Scalar};

/// Runtime tag of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Buffer,
    Scalar,
    Sequence,
    Opaque,
    /// Plain value passed through untouched (e.g. an `i32` kernel parameter).
    Value,
}

impl ArgKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Buffer => "buffer",
            Self::Scalar => "scalar",
            Self::Sequence => "sequence",
            Self::Opaque => "opaque",
            Self::Value => "value",
        }
    }
}

impl std::fmt::Display for ArgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-erased payload that remembers the name of the stored type.
struct Erased {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Erased {
    fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self { value: Box::new(value), type_name: std::any::type_name::<T>() }
    }
}

/// Type-erased `Vec<T>` owned by the executor.
pub struct SequenceRef(Erased);

impl SequenceRef {
    pub fn new<T: Send + Sync + 'static>(items: Vec<T>) -> Self {
        Self(Erased::new(items))
    }

    pub fn empty<T: Send + Sync + 'static>() -> Self {
        Self::new(Vec::<T>::new())
    }

    /// Whether the stored sequence has element type `T`.
    pub fn holds<T: 'static>(&self) -> bool {
        self.0.value.is::<Vec<T>>()
    }

    /// Name of the stored `Vec<_>` type.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    pub fn rref<T: 'static>(&self) -> Option<&Vec<T>> {
        self.0.value.downcast_ref()
    }

    pub fn wref<T: 'static>(&mut self) -> Option<&mut Vec<T>> {
        self.0.value.downcast_mut()
    }

    pub fn into_inner<T: 'static>(self) -> Result<Vec<T>, Self> {
        let type_name = self.0.type_name;
        match self.0.value.downcast::<Vec<T>>() {
            Ok(items) => Ok(*items),
            Err(value) => Err(Self(Erased { value, type_name })),
        }
    }
}

impl std::fmt::Debug for SequenceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SequenceRef").field(&self.0.type_name).finish()
    }
}

/// Type-erased single value owned by the executor.
pub struct OpaqueRef(Erased);

impl OpaqueRef {
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self(Erased::new(value))
    }

    pub fn holds<T: 'static>(&self) -> bool {
        self.0.value.is::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    pub fn rref<T: 'static>(&self) -> Option<&T> {
        self.0.value.downcast_ref()
    }

    pub fn wref<T: 'static>(&mut self) -> Option<&mut T> {
        self.0.value.downcast_mut()
    }

    pub fn into_inner<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.0.type_name;
        match self.0.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self(Erased { value, type_name })),
        }
    }
}

impl std::fmt::Debug for OpaqueRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OpaqueRef").field(&self.0.type_name).finish()
    }
}

/// Input argument borrowed from executor storage.
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    Buffer(&'a Buffer),
    Scalar(Scalar),
    Sequence(&'a SequenceRef),
    Opaque(&'a OpaqueRef),
    Value { value: &'a dyn Any, type_name: &'static str },
}

impl<'a> Arg<'a> {
    /// Wrap a plain value parameter.
    pub fn value<T: 'static>(value: &'a T) -> Self {
        Self::Value { value, type_name: std::any::type_name::<T>() }
    }

    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Buffer(_) => ArgKind::Buffer,
            Self::Scalar(_) => ArgKind::Scalar,
            Self::Sequence(_) => ArgKind::Sequence,
            Self::Opaque(_) => ArgKind::Opaque,
            Self::Value { .. } => ArgKind::Value,
        }
    }

    /// Name of the payload type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => ArgKind::Buffer.name(),
            Self::Scalar(_) => ArgKind::Scalar.name(),
            Self::Sequence(seq) => seq.type_name(),
            Self::Opaque(opaque) => opaque.type_name(),
            Self::Value { type_name, .. } => *type_name,
        }
    }
}

impl std::fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffer(buffer) => f.debug_tuple("Buffer").field(buffer).finish(),
            Self::Scalar(scalar) => f.debug_tuple("Scalar").field(scalar).finish(),
            Self::Sequence(seq) => std::fmt::Debug::fmt(seq, f),
            Self::Opaque(opaque) => std::fmt::Debug::fmt(opaque, f),
            Self::Value { type_name, .. } => f.debug_tuple("Value").field(type_name).finish(),
        }
    }
}

impl<'a> From<&'a Buffer> for Arg<'a> {
    fn from(buffer: &'a Buffer) -> Self {
        Self::Buffer(buffer)
    }
}

impl From<Scalar> for Arg<'_> {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl<'a> From<&'a SequenceRef> for Arg<'a> {
    fn from(seq: &'a SequenceRef) -> Self {
        Self::Sequence(seq)
    }
}

impl<'a> From<&'a OpaqueRef> for Arg<'a> {
    fn from(opaque: &'a OpaqueRef) -> Self {
        Self::Opaque(opaque)
    }
}

/// Output slot: mutable borrow of storage the executor pre-allocated.
#[derive(Debug)]
pub enum OutArg<'a> {
    Buffer(&'a mut Buffer),
    Scalar(&'a mut Scalar),
    Sequence(&'a mut SequenceRef),
    Opaque(&'a mut OpaqueRef),
}

impl OutArg<'_> {
    pub fn kind(&self) -> ArgKind {
        match self {
            Self::Buffer(_) => ArgKind::Buffer,
            Self::Scalar(_) => ArgKind::Scalar,
            Self::Sequence(_) => ArgKind::Sequence,
            Self::Opaque(_) => ArgKind::Opaque,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Buffer(_) => ArgKind::Buffer.name(),
            Self::Scalar(_) => ArgKind::Scalar.name(),
            Self::Sequence(seq) => seq.type_name(),
            Self::Opaque(opaque) => opaque.type_name(),
        }
    }
}

impl<'a> From<&'a mut Buffer> for OutArg<'a> {
    fn from(buffer: &'a mut Buffer) -> Self {
        Self::Buffer(buffer)
    }
}

impl<'a> From<&'a mut Scalar> for OutArg<'a> {
    fn from(scalar: &'a mut Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

impl<'a> From<&'a mut SequenceRef> for OutArg<'a> {
    fn from(seq: &'a mut SequenceRef) -> Self {
        Self::Sequence(seq)
    }
}

impl<'a> From<&'a mut OpaqueRef> for OutArg<'a> {
    fn from(opaque: &'a mut OpaqueRef) -> Self {
        Self::Opaque(opaque)
    }
}
