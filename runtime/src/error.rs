//! Error types for kernel invocation.
//!
//! Every variant describes a broken programming contract between the executor,
//! the kernel signature and the kernel body. None of them is retried.

use snafu::Snafu;

/// Result type for kernel invocation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which side of the argument context an access targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Accessor requested a type that does not match the stored argument.
    #[snafu(display("{direction} {index}: expected {expected}, found {actual}"))]
    TypeMismatch { direction: Direction, index: usize, expected: &'static str, actual: &'static str },

    /// Accessor index is not present in the context.
    #[snafu(display("{direction} index {index} out of range ({len} supplied)"))]
    IndexOutOfRange { direction: Direction, index: usize, len: usize },

    /// Kernel replaced the storage of a pre-allocated output buffer.
    #[snafu(display(
        "output {index} was reallocated by the kernel ({before:#x} -> {after:#x}); incorrect metadata was provided?"
    ))]
    BufferIdentityViolation { index: usize, before: usize, after: usize },

    /// Context does not have the shape the kernel signature declares.
    #[snafu(display(
        "arity mismatch: signature declares {expected_inputs} inputs / {expected_outputs} outputs, \
         context supplies {actual_inputs} / {actual_outputs}"
    ))]
    ArityMismatch { expected_inputs: usize, actual_inputs: usize, expected_outputs: usize, actual_outputs: usize },

    /// Failure surfaced through a kernel handle, tagged with the kernel id.
    #[snafu(display("kernel '{id}': {source}"))]
    Kernel {
        id: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },

    /// Buffer access failed inside a kernel body.
    #[snafu(display("device error: {source}"))]
    Device { source: kiln_device::Error },

    /// No backend is registered under this name.
    #[snafu(display("unknown backend '{name}'"))]
    UnknownBackend { name: String },
}

impl Error {
    /// The underlying failure, with any kernel-id wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Self::Kernel { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<kiln_device::Error> for Error {
    fn from(source: kiln_device::Error) -> Self {
        Self::Device { source }
    }
}
