use kiln_dtype::{DType, HasDType};
use smallvec::SmallVec;

use crate::error::{DTypeMismatchSnafu, Error, Result, SizeMismatchSnafu};

/// Backing word; every supported element type divides its alignment.
type Word = u64;
const WORD_BYTES: usize = std::mem::size_of::<Word>();

/// Densely packed n-dimensional host buffer.
///
/// The executor pre-sizes output buffers from metadata inference and lends them
/// to kernels by mutable reference. Kernels are expected to write in place: the
/// backing storage address ([`Buffer::data_addr`]) is the buffer's identity, and
/// any operation that swaps the storage (assignment of another buffer, `clone`,
/// [`Buffer::ensure`] with a different layout) changes it.
#[derive(Clone, PartialEq)]
pub struct Buffer {
    storage: Box<[Word]>,
    /// Bytes in use (may be smaller than the word-rounded storage).
    size: usize,
    dtype: DType,
    /// Stack-allocated for 0-4D buffers.
    shape: SmallVec<[usize; 4]>,
}

impl Buffer {
    /// Allocate a zero-initialized buffer.
    pub fn zeros(dtype: DType, shape: &[usize]) -> Self {
        let size = dtype.bytes() * shape.iter().product::<usize>();
        Self { storage: alloc_words(size), size, dtype, shape: SmallVec::from_slice(shape) }
    }

    /// Allocate a buffer and copy `data` into it.
    pub fn from_slice<T: HasDType>(shape: &[usize], data: &[T]) -> Result<Self> {
        let expected = shape.iter().product::<usize>();
        let actual = data.len();
        snafu::ensure!(expected == actual, SizeMismatchSnafu { expected, actual });

        let mut buffer = Self::zeros(T::DTYPE, shape);
        buffer.as_mut_slice::<T>()?.copy_from_slice(data);
        Ok(buffer)
    }

    /// Allocate a buffer with every element set to `value`.
    pub fn filled<T: HasDType>(shape: &[usize], value: T) -> Self {
        let mut buffer = Self::zeros(T::DTYPE, shape);
        // Freshly allocated storage is word aligned and exactly sized for T.
        if let Ok(elements) = buffer.as_mut_slice::<T>() {
            elements.fill(value);
        }
        buffer
    }

    /// Make the buffer hold `dtype` elements of `shape`.
    ///
    /// Storage is kept when the layout already matches, so a kernel that calls
    /// this on a correctly pre-sized output writes in place. A different layout
    /// allocates fresh zeroed storage.
    pub fn ensure(&mut self, dtype: DType, shape: &[usize]) {
        if self.dtype == dtype && self.shape.as_slice() == shape {
            return;
        }
        *self = Self::zeros(dtype, shape);
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Address of the backing storage.
    pub fn data_addr(&self) -> usize {
        self.storage.as_ptr() as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Word, u8>(&self.storage)[..self.size]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Word, u8>(&mut self.storage)[..self.size]
    }

    /// View the elements as `T`.
    pub fn as_slice<T: HasDType>(&self) -> Result<&[T]> {
        self.check_dtype::<T>()?;
        bytemuck::try_cast_slice(self.as_bytes()).map_err(misaligned)
    }

    /// Mutable view of the elements as `T`.
    pub fn as_mut_slice<T: HasDType>(&mut self) -> Result<&mut [T]> {
        self.check_dtype::<T>()?;
        bytemuck::try_cast_slice_mut(self.as_bytes_mut()).map_err(misaligned)
    }

    /// Copy the elements out as `T`.
    pub fn to_vec<T: HasDType>(&self) -> Result<Vec<T>> {
        self.as_slice::<T>().map(<[T]>::to_vec)
    }

    /// Overwrite every element with `value` in place.
    pub fn fill<T: HasDType>(&mut self, value: T) -> Result<()> {
        self.as_mut_slice::<T>()?.fill(value);
        Ok(())
    }

    /// Copy the contents of `src` in place. Layouts must match.
    pub fn copy_from(&mut self, src: &Buffer) -> Result<()> {
        snafu::ensure!(self.dtype == src.dtype, DTypeMismatchSnafu { expected: src.dtype, actual: self.dtype });
        let (expected, actual) = (self.len(), src.len());
        snafu::ensure!(expected == actual, SizeMismatchSnafu { expected, actual });

        self.as_bytes_mut().copy_from_slice(src.as_bytes());
        Ok(())
    }

    fn check_dtype<T: HasDType>(&self) -> Result<()> {
        // Boolean buffers are accessed through their byte representation.
        let compatible = T::DTYPE == self.dtype || (self.dtype == DType::Bool && T::DTYPE == DType::UInt8);
        snafu::ensure!(compatible, DTypeMismatchSnafu { expected: T::DTYPE, actual: self.dtype });
        Ok(())
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape.as_slice())
            .field("addr", &format_args!("{:#x}", self.data_addr()))
            .finish()
    }
}

fn alloc_words(size: usize) -> Box<[Word]> {
    vec![0; size.div_ceil(WORD_BYTES)].into_boxed_slice()
}

fn misaligned(err: bytemuck::PodCastError) -> Error {
    Error::Misaligned { reason: format!("{err:?}") }
}
