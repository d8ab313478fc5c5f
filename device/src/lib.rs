//! Host values owned by the executor and lent to kernels.
//!
//! [`Buffer`] is the storage behind buffer-like graph types; [`Scalar`] is the
//! value behind scalar-like graph types.

pub mod buffer;
pub mod error;
pub mod scalar;


pub use buffer::Buffer;
pub use error::{Error, Result};
pub use scalar::Scalar;
