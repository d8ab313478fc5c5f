use kiln_dtype::DType;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Typed access requested an element type the buffer does not hold.
    #[snafu(display("dtype mismatch: buffer holds {actual}, access requested {expected}"))]
    DTypeMismatch { expected: DType, actual: DType },

    /// Element count does not match the product of the shape.
    #[snafu(display("size mismatch: expected {expected} elements, got {actual}"))]
    SizeMismatch { expected: usize, actual: usize },

    /// Raw storage could not be viewed as the requested element type.
    #[snafu(display("misaligned buffer view: {reason}"))]
    Misaligned { reason: String },
}
