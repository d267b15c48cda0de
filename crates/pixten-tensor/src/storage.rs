use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    data_type::{Kind, Sample},
    error::TensorError,
};

/// Type-erased contiguous sample storage, one vector per [`Kind`].
///
/// Complex data is stored as a float vector twice as long, real and imaginary
/// parts interleaved.
#[derive(Clone, Debug, PartialEq)]
pub enum Samples {
    /// Binary samples.
    Binary(Vec<bool>),
    /// 8-bit unsigned samples.
    UInt8(Vec<u8>),
    /// 16-bit unsigned samples.
    UInt16(Vec<u16>),
    /// 32-bit unsigned samples.
    UInt32(Vec<u32>),
    /// 8-bit signed samples.
    Int8(Vec<i8>),
    /// 16-bit signed samples.
    Int16(Vec<i16>),
    /// 32-bit signed samples.
    Int32(Vec<i32>),
    /// Single precision samples.
    Float32(Vec<f32>),
    /// Double precision samples.
    Float64(Vec<f64>),
}

macro_rules! dispatch {
    ($samples:expr, $v:ident => $body:expr) => {
        match $samples {
            Samples::Binary($v) => $body,
            Samples::UInt8($v) => $body,
            Samples::UInt16($v) => $body,
            Samples::UInt32($v) => $body,
            Samples::Int8($v) => $body,
            Samples::Int16($v) => $body,
            Samples::Int32($v) => $body,
            Samples::Float32($v) => $body,
            Samples::Float64($v) => $body,
        }
    };
}

fn collect<I: Iterator<Item = f64>>(kind: Kind, values: I) -> Samples {
    match kind {
        Kind::Binary => Samples::Binary(values.map(bool::from_f64).collect()),
        Kind::UInt8 => Samples::UInt8(values.map(u8::from_f64).collect()),
        Kind::UInt16 => Samples::UInt16(values.map(u16::from_f64).collect()),
        Kind::UInt32 => Samples::UInt32(values.map(u32::from_f64).collect()),
        Kind::Int8 => Samples::Int8(values.map(i8::from_f64).collect()),
        Kind::Int16 => Samples::Int16(values.map(i16::from_f64).collect()),
        Kind::Int32 => Samples::Int32(values.map(i32::from_f64).collect()),
        Kind::Float32 => Samples::Float32(values.map(f32::from_f64).collect()),
        Kind::Float64 => Samples::Float64(values.collect()),
    }
}

fn scatter_into<T: Sample>(
    dst: &mut [T],
    offsets: &[usize],
    src: &Samples,
) -> Result<(), TensorError> {
    let src = T::as_slice(src).ok_or_else(|| {
        TensorError::invalid_conversion(format!("cannot write {} into {}", src.kind(), T::KIND))
    })?;
    let len = dst.len();
    for (&offset, &value) in offsets.iter().zip(src) {
        *dst
            .get_mut(offset)
            .ok_or(TensorError::index_out_of_bounds(offset, len))? = value;
    }
    Ok(())
}

impl Samples {
    /// A zero-initialized storage of `len` samples.
    pub fn zeros(kind: Kind, len: usize) -> Self {
        collect(kind, std::iter::repeat(0.0).take(len))
    }

    /// Build a storage from `f64` values, saturating each one to `kind`.
    pub fn from_f64<I: IntoIterator<Item = f64>>(kind: Kind, values: I) -> Self {
        collect(kind, values.into_iter())
    }

    /// The kind of the stored samples.
    pub fn kind(&self) -> Kind {
        match self {
            Samples::Binary(_) => Kind::Binary,
            Samples::UInt8(_) => Kind::UInt8,
            Samples::UInt16(_) => Kind::UInt16,
            Samples::UInt32(_) => Kind::UInt32,
            Samples::Int8(_) => Kind::Int8,
            Samples::Int16(_) => Kind::Int16,
            Samples::Int32(_) => Kind::Int32,
            Samples::Float32(_) => Kind::Float32,
            Samples::Float64(_) => Kind::Float64,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    /// Whether the storage holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the sample at `offset` widened to `f64`.
    pub fn get_f64(&self, offset: usize) -> Result<f64, TensorError> {
        let len = self.len();
        dispatch!(self, v => v.get(offset).map(|x| x.to_f64()))
            .ok_or(TensorError::index_out_of_bounds(offset, len))
    }

    /// Write `value` at `offset`, saturating to the stored kind.
    pub fn set_f64(&mut self, offset: usize, value: f64) -> Result<(), TensorError> {
        let len = self.len();
        dispatch!(self, v => {
            let slot = v
                .get_mut(offset)
                .ok_or(TensorError::index_out_of_bounds(offset, len))?;
            *slot = Sample::from_f64(value);
        });
        Ok(())
    }

    /// Copy the samples at `offsets` into a new storage of the same kind.
    pub fn gather(&self, offsets: &[usize]) -> Result<Samples, TensorError> {
        let len = self.len();
        Ok(dispatch!(self, v => {
            let out = offsets
                .iter()
                .map(|&o| v.get(o).copied().ok_or(TensorError::index_out_of_bounds(o, len)))
                .collect::<Result<Vec<_>, _>>()?;
            Sample::into_samples(out)
        }))
    }

    /// Write the samples of `src`, in order, at `offsets`.
    ///
    /// Samples of a different kind are converted with saturation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `offsets` and `src` differ in length and
    /// `IndexOutOfBounds` for offsets past the end of the storage.
    pub fn scatter(&mut self, offsets: &[usize], src: &Samples) -> Result<(), TensorError> {
        if offsets.len() != src.len() {
            return Err(TensorError::invalid_shape(format!(
                "cannot write {} samples into {} locations",
                src.len(),
                offsets.len()
            )));
        }
        let converted;
        let src = if src.kind() == self.kind() {
            src
        } else {
            converted = src.convert(self.kind());
            &converted
        };
        dispatch!(self, v => scatter_into(v, offsets, src))
    }

    /// Write the same value at every offset.
    pub fn fill(&mut self, offsets: &[usize], value: f64) -> Result<(), TensorError> {
        let values = Samples::from_f64(self.kind(), std::iter::repeat(value).take(offsets.len()));
        self.scatter(offsets, &values)
    }

    /// A copy of the storage converted to `kind` with saturation.
    pub fn convert(&self, kind: Kind) -> Samples {
        if kind == self.kind() {
            return self.clone();
        }
        dispatch!(self, v => collect(kind, v.iter().map(|x| x.to_f64())))
    }

    /// All samples widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        dispatch!(self, v => v.iter().map(|x| x.to_f64()).collect())
    }
}

/// Shared, interior-mutable sample buffer.
///
/// Cloning a buffer aliases it: both handles refer to the same samples and
/// writes through one are visible through the other. The samples are freed
/// when the last handle is dropped.
#[derive(Clone, Debug)]
pub struct Buffer {
    inner: Arc<RwLock<Samples>>,
}

impl Buffer {
    /// Wrap existing samples into a new buffer.
    pub fn new(samples: Samples) -> Self {
        Self {
            inner: Arc::new(RwLock::new(samples)),
        }
    }

    /// A new zero-initialized buffer.
    pub fn zeros(kind: Kind, len: usize) -> Self {
        Self::new(Samples::zeros(kind, len))
    }

    /// A new buffer taking ownership of typed samples.
    pub fn from_vec<T: Sample>(data: Vec<T>) -> Self {
        Self::new(T::into_samples(data))
    }

    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of the samples in the buffer.
    pub fn kind(&self) -> Kind {
        self.read().kind()
    }

    /// Lock the samples for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Samples> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the samples for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Samples> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same allocation.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles sharing the allocation.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
