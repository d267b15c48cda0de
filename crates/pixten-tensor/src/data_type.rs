//! Element kinds of image samples and the promotion rules between them.

use num_traits::{AsPrimitive, Bounded};

use crate::{error::TensorError, storage::Samples};

/// Numeric kind of the samples stored in an image buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    /// Binary samples, stored as `bool`.
    Binary,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// Single precision floating point.
    #[default]
    Float32,
    /// Double precision floating point.
    Float64,
}

impl Kind {
    /// All kinds, from the narrowest to the widest.
    pub const ALL: [Kind; 9] = [
        Kind::Binary,
        Kind::UInt8,
        Kind::UInt16,
        Kind::UInt32,
        Kind::Int8,
        Kind::Int16,
        Kind::Int32,
        Kind::Float32,
        Kind::Float64,
    ];

    /// Size of a single sample in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Kind::Binary | Kind::UInt8 | Kind::Int8 => 1,
            Kind::UInt16 | Kind::Int16 => 2,
            Kind::UInt32 | Kind::Int32 | Kind::Float32 => 4,
            Kind::Float64 => 8,
        }
    }

    /// Returns true for the binary kind.
    pub fn is_binary(self) -> bool {
        self == Kind::Binary
    }

    /// Returns true for the signed and unsigned integer kinds.
    pub fn is_integer(self) -> bool {
        self.is_unsigned() || matches!(self, Kind::Int8 | Kind::Int16 | Kind::Int32)
    }

    /// Returns true for the unsigned integer kinds.
    pub fn is_unsigned(self) -> bool {
        matches!(self, Kind::UInt8 | Kind::UInt16 | Kind::UInt32)
    }

    /// Returns true for the floating point kinds, the only ones that can be complex.
    pub fn is_float(self) -> bool {
        matches!(self, Kind::Float32 | Kind::Float64)
    }

    /// The lowest and highest value representable by the kind.
    pub fn range(self) -> (f64, f64) {
        fn bounds<T: Bounded + AsPrimitive<f64>>() -> (f64, f64) {
            (T::min_value().as_(), T::max_value().as_())
        }
        match self {
            Kind::Binary => (0.0, 1.0),
            Kind::UInt8 => bounds::<u8>(),
            Kind::UInt16 => bounds::<u16>(),
            Kind::UInt32 => bounds::<u32>(),
            Kind::Int8 => bounds::<i8>(),
            Kind::Int16 => bounds::<i16>(),
            Kind::Int32 => bounds::<i32>(),
            Kind::Float32 => bounds::<f32>(),
            Kind::Float64 => bounds::<f64>(),
        }
    }

    /// Short lowercase name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Binary => "binary",
            Kind::UInt8 => "uint8",
            Kind::UInt16 => "uint16",
            Kind::UInt32 => "uint32",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
        }
    }

    /// The kind that can hold the result of a binary operation between `self` and `other`.
    ///
    /// Float64 dominates, then Float32. Binary is absorbed by the other operand.
    /// Integers of equal signedness promote to the wider one, mixed signedness
    /// promotes to the smallest signed integer holding both ranges, or to
    /// Float64 when no integer kind can (UInt32 with any signed integer).
    ///
    /// # Example
    ///
    /// ```
    /// use pixten_tensor::Kind;
    ///
    /// assert_eq!(Kind::UInt8.join(Kind::Int8), Kind::Int16);
    /// assert_eq!(Kind::UInt32.join(Kind::Int8), Kind::Float64);
    /// assert_eq!(Kind::Binary.join(Kind::UInt16), Kind::UInt16);
    /// ```
    pub fn join(self, other: Kind) -> Kind {
        if self == other {
            return self;
        }
        if self == Kind::Float64 || other == Kind::Float64 {
            return Kind::Float64;
        }
        if self == Kind::Float32 || other == Kind::Float32 {
            return Kind::Float32;
        }
        if self.is_binary() {
            return other;
        }
        if other.is_binary() {
            return self;
        }
        if self.is_unsigned() == other.is_unsigned() {
            return if self.size_of() >= other.size_of() {
                self
            } else {
                other
            };
        }
        let (unsigned, signed) = if self.is_unsigned() {
            (self, other)
        } else {
            (other, self)
        };
        match (2 * unsigned.size_of()).max(signed.size_of()) {
            2 => Kind::Int16,
            4 => Kind::Int32,
            _ => Kind::Float64,
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A sample kind together with the complex flag.
///
/// Complex data types store two samples per value (real and imaginary part)
/// and are only available for the floating point kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DataType {
    kind: Kind,
    complex: bool,
}

impl DataType {
    /// A real (non-complex) data type of the given kind.
    pub const fn real(kind: Kind) -> Self {
        Self {
            kind,
            complex: false,
        }
    }

    /// A complex data type of the given floating point kind.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` if the kind is not a floating point kind.
    pub fn complex(kind: Kind) -> Result<Self, TensorError> {
        Self::new(kind, true)
    }

    /// Create a data type from a kind and a complex flag.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` if `complex` is set on a non-float kind.
    pub fn new(kind: Kind, complex: bool) -> Result<Self, TensorError> {
        if complex && !kind.is_float() {
            return Err(TensorError::invalid_conversion(format!(
                "{kind} samples cannot be complex"
            )));
        }
        Ok(Self { kind, complex })
    }

    /// The sample kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Whether values carry an imaginary part.
    pub fn is_complex(&self) -> bool {
        self.complex
    }

    /// Number of samples used to store one value: 2 for complex, 1 otherwise.
    pub fn samples_per_value(&self) -> usize {
        if self.complex {
            2
        } else {
            1
        }
    }

    /// The real data type with the same kind.
    pub fn to_real(self) -> Self {
        Self::real(self.kind)
    }

    /// The data type for the result of a binary operation.
    ///
    /// The kind follows [`Kind::join`], the result is complex if either operand is.
    pub fn join(self, other: DataType) -> DataType {
        DataType {
            kind: self.kind.join(other.kind),
            complex: self.complex || other.complex,
        }
    }

    /// The data type for concatenating images of the two data types.
    ///
    /// Identical data types are kept. Otherwise the joined kind collapses to
    /// Float64 when it is a 32-bit integer or Float64, and to Float32 for any
    /// narrower outcome. This coarser rule is kept apart from [`DataType::join`]
    /// because concatenation has always produced floating point output.
    ///
    /// # Example
    ///
    /// ```
    /// use pixten_tensor::{DataType, Kind};
    ///
    /// let a = DataType::real(Kind::UInt8);
    /// let b = DataType::real(Kind::Int8);
    /// assert_eq!(a.join(b), DataType::real(Kind::Int16));
    /// assert_eq!(a.join_for_concatenation(b), DataType::real(Kind::Float32));
    /// ```
    pub fn join_for_concatenation(self, other: DataType) -> DataType {
        if self == other {
            return self;
        }
        let joined = self.kind.join(other.kind);
        let kind = if joined == Kind::Float64 || (joined.is_integer() && joined.size_of() == 4) {
            Kind::Float64
        } else {
            Kind::Float32
        };
        DataType {
            kind,
            complex: self.complex || other.complex,
        }
    }
}

impl From<Kind> for DataType {
    fn from(kind: Kind) -> Self {
        DataType::real(kind)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.complex {
            write!(f, "complex {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

/// Convert a value to the range of the target kind, clamping instead of wrapping.
///
/// Integer targets truncate toward zero and map NaN to zero, floating point
/// targets round to their precision and binary targets test for non-zero.
///
/// # Example
///
/// ```
/// use pixten_tensor::{saturating_cast, Kind};
///
/// assert_eq!(saturating_cast(300.0, Kind::UInt8), 255.0);
/// assert_eq!(saturating_cast(-4.7, Kind::Int8), -4.0);
/// assert_eq!(saturating_cast(-1.0, Kind::UInt16), 0.0);
/// assert_eq!(saturating_cast(0.25, Kind::Binary), 1.0);
/// ```
pub fn saturating_cast(value: f64, target: Kind) -> f64 {
    if target.is_binary() {
        return bool::from_f64(value).to_f64();
    }
    if target.is_integer() {
        if value.is_nan() {
            return 0.0;
        }
        let (lowest, highest) = target.range();
        return value.trunc().clamp(lowest, highest);
    }
    match target {
        Kind::Float32 => f32::from_f64(value).to_f64(),
        _ => value,
    }
}

/// Rust types used to store the samples of each [`Kind`].
pub trait Sample: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// The kind stored with this type.
    const KIND: Kind;

    /// Widen the sample to `f64`.
    fn to_f64(self) -> f64;

    /// Convert from `f64` with saturation.
    fn from_f64(value: f64) -> Self;

    /// Wrap a vector of samples into the type-erased storage.
    fn into_samples(data: Vec<Self>) -> Samples;

    /// Borrow the typed samples, if the storage holds this type.
    fn as_slice(samples: &Samples) -> Option<&[Self]>;

    /// Mutably borrow the typed samples, if the storage holds this type.
    fn as_mut_slice(samples: &mut Samples) -> Option<&mut [Self]>;
}

macro_rules! impl_sample {
    ($t:ty, $kind:ident) => {
        impl Sample for $t {
            const KIND: Kind = Kind::$kind;

            #[inline]
            fn to_f64(self) -> f64 {
                self.as_()
            }

            #[inline]
            fn from_f64(value: f64) -> Self {
                // `as` casts from floats saturate and send NaN to zero.
                value.as_()
            }

            fn into_samples(data: Vec<Self>) -> Samples {
                Samples::$kind(data)
            }

            fn as_slice(samples: &Samples) -> Option<&[Self]> {
                match samples {
                    Samples::$kind(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn as_mut_slice(samples: &mut Samples) -> Option<&mut [Self]> {
                match samples {
                    Samples::$kind(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_sample!(u8, UInt8);
impl_sample!(u16, UInt16);
impl_sample!(u32, UInt32);
impl_sample!(i8, Int8);
impl_sample!(i16, Int16);
impl_sample!(i32, Int32);
impl_sample!(f32, Float32);
impl_sample!(f64, Float64);

impl Sample for bool {
    const KIND: Kind = Kind::Binary;

    #[inline]
    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value != 0.0 && !value.is_nan()
    }

    fn into_samples(data: Vec<Self>) -> Samples {
        Samples::Binary(data)
    }

    fn as_slice(samples: &Samples) -> Option<&[Self]> {
        match samples {
            Samples::Binary(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn as_mut_slice(samples: &mut Samples) -> Option<&mut [Self]> {
        match samples {
            Samples::Binary(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_commutative() {
        for a in Kind::ALL {
            for b in Kind::ALL {
                assert_eq!(a.join(b), b.join(a), "join({a}, {b})");
            }
        }
    }

    #[test]
    fn join_float64_dominates() {
        for k in Kind::ALL {
            assert_eq!(Kind::Float64.join(k), Kind::Float64);
        }
    }

    #[test]
    fn join_float32_dominates_non_float64() {
        for k in Kind::ALL {
            if k != Kind::Float64 {
                assert_eq!(Kind::Float32.join(k), Kind::Float32);
            }
        }
    }

    #[test]
    fn join_binary_is_absorbed() {
        for k in Kind::ALL {
            assert_eq!(Kind::Binary.join(k), k);
        }
    }

    #[test]
    fn join_integers() {
        assert_eq!(Kind::UInt8.join(Kind::UInt16), Kind::UInt16);
        assert_eq!(Kind::Int32.join(Kind::Int8), Kind::Int32);
        assert_eq!(Kind::UInt8.join(Kind::Int8), Kind::Int16);
        assert_eq!(Kind::UInt8.join(Kind::Int16), Kind::Int16);
        assert_eq!(Kind::UInt8.join(Kind::Int32), Kind::Int32);
        assert_eq!(Kind::UInt16.join(Kind::Int8), Kind::Int32);
        assert_eq!(Kind::UInt16.join(Kind::Int16), Kind::Int32);
        for s in [Kind::Int8, Kind::Int16, Kind::Int32] {
            assert_eq!(Kind::UInt32.join(s), Kind::Float64);
        }
    }

    #[test]
    fn join_data_types() -> Result<(), TensorError> {
        let c = DataType::complex(Kind::Float32)?;
        assert_eq!(c.join(DataType::real(Kind::UInt8)), c);
        assert_eq!(
            c.join(DataType::real(Kind::Float64)),
            DataType::complex(Kind::Float64)?
        );
        Ok(())
    }

    #[test]
    fn join_for_concatenation_collapses() -> Result<(), TensorError> {
        let u8_ = DataType::real(Kind::UInt8);
        let bin = DataType::real(Kind::Binary);
        let i32_ = DataType::real(Kind::Int32);
        assert_eq!(u8_.join_for_concatenation(u8_), u8_);
        assert_eq!(
            u8_.join_for_concatenation(bin),
            DataType::real(Kind::Float32)
        );
        assert_eq!(
            u8_.join_for_concatenation(i32_),
            DataType::real(Kind::Float64)
        );
        assert_eq!(
            DataType::complex(Kind::Float32)?.join_for_concatenation(u8_),
            DataType::complex(Kind::Float32)?
        );
        Ok(())
    }

    #[test]
    fn complex_requires_float() {
        assert!(matches!(
            DataType::complex(Kind::Int16),
            Err(TensorError::InvalidConversion(_))
        ));
        assert!(DataType::complex(Kind::Float64).is_ok());
    }

    #[test]
    fn saturating_cast_clamps() {
        assert_eq!(saturating_cast(-3.0, Kind::UInt8), 0.0);
        assert_eq!(saturating_cast(1e10, Kind::Int32), i32::MAX as f64);
        assert_eq!(saturating_cast(-1e10, Kind::Int16), i16::MIN as f64);
        assert_eq!(saturating_cast(f64::NAN, Kind::UInt32), 0.0);
        assert_eq!(saturating_cast(2.9, Kind::UInt8), 2.0);
        assert_eq!(saturating_cast(0.0, Kind::Binary), 0.0);
        assert_eq!(saturating_cast(-2.0, Kind::Binary), 1.0);
        assert_eq!(saturating_cast(1.5, Kind::Float64), 1.5);
    }

    #[test]
    fn kind_ranges() {
        assert_eq!(Kind::UInt8.range(), (0.0, 255.0));
        assert_eq!(Kind::Int16.range(), (-32768.0, 32767.0));
        assert_eq!(Kind::Binary.range(), (0.0, 1.0));
        assert_eq!(Kind::UInt32.range().1, u32::MAX as f64);
    }

    #[test]
    fn kind_classes() {
        let integers: Vec<Kind> = Kind::ALL.into_iter().filter(|k| k.is_integer()).collect();
        assert_eq!(integers.len(), 6);
        assert!(!Kind::Binary.is_integer());
        assert!(!Kind::Float32.is_integer());
        assert_eq!(Kind::Binary.size_of(), 1);
        assert_eq!(Kind::Int16.size_of(), 2);
        assert_eq!(Kind::UInt32.size_of(), 4);
        assert_eq!(Kind::Float64.size_of(), 8);
    }
}
