//! Output buffer identity checks.
//!
//! The executor allocates every output buffer from metadata it inferred ahead
//! of time and may hand the same storage to downstream nodes. A kernel that
//! swaps in new storage silently breaks that plan, so the address of each
//! buffer output is recorded before the call and compared after it.

use kiln_device::Buffer;
use kiln_dtype::DType;
use smallvec::SmallVec;

use crate::arg::{ArgKind, OutArg};
use crate::context::Outputs;
use crate::error::{BufferIdentityViolationSnafu, Direction, IndexOutOfRangeSnafu, Result, TypeMismatchSnafu};

/// Backing-storage address of one output buffer, taken before a call.
///
/// Zero-sized buffers own no storage, so their address is shared and says
/// nothing; for those the dtype and shape are recorded and compared instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferIdentitySnapshot {
    addr: usize,
    empty_layout: Option<(DType, SmallVec<[usize; 4]>)>,
}

impl BufferIdentitySnapshot {
    pub fn capture(buffer: &Buffer) -> Self {
        let empty_layout = (buffer.size() == 0).then(|| (buffer.dtype(), SmallVec::from_slice(buffer.shape())));
        Self { addr: buffer.data_addr(), empty_layout }
    }

    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Fails if `buffer` no longer lives at the captured address.
    ///
    /// Identity is address-based: a fresh allocation with identical shape and
    /// contents is still a violation. An empty buffer fails if it now holds
    /// data or has a different dtype or shape.
    pub fn check(&self, index: usize, buffer: &Buffer) -> Result<()> {
        let after = buffer.data_addr();
        let same_layout = match &self.empty_layout {
            Some((dtype, shape)) => buffer.size() == 0 && buffer.dtype() == *dtype && buffer.shape() == shape.as_slice(),
            None => true,
        };
        snafu::ensure!(
            after == self.addr && same_layout,
            BufferIdentityViolationSnafu { index, before: self.addr, after }
        );
        Ok(())
    }
}

/// Snapshots of every buffer slot bound in an [`Outputs`] map.
///
/// Used for kernels written against the raw context, where the signature is
/// not known statically.
#[derive(Debug, Default)]
pub struct OutputSnapshot {
    buffers: Vec<(usize, BufferIdentitySnapshot)>,
}

impl OutputSnapshot {
    pub fn capture(outputs: &Outputs<'_>) -> Self {
        let mut buffers: Vec<_> =
            outputs.bound_buffers().map(|(index, buffer)| (index, BufferIdentitySnapshot::capture(buffer))).collect();
        buffers.sort_unstable_by_key(|(index, _)| *index);
        Self { buffers }
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Re-check every captured buffer in index order.
    ///
    /// A captured slot that was unbound or rebound to another kind fails too.
    pub fn check(&self, outputs: &Outputs<'_>) -> Result<()> {
        for (index, snapshot) in &self.buffers {
            let index = *index;
            match outputs.get(index) {
                Some(OutArg::Buffer(buffer)) => snapshot.check(index, buffer)?,
                Some(other) => {
                    return TypeMismatchSnafu {
                        direction: Direction::Output,
                        index,
                        expected: ArgKind::Buffer.name(),
                        actual: other.type_name(),
                    }
                    .fail();
                }
                None => {
                    return IndexOutOfRangeSnafu { direction: Direction::Output, index, len: outputs.len() }.fail();
                }
            }
        }
        Ok(())
    }
}
