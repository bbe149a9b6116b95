//! Argument values handed from injected code to the entry probe.

/// One declared parameter of an instrumented call.
///
/// Injected code builds these only for functions with capture specs;
/// everything that is not a primitive number arrives as [`ProbeArg::Opaque`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeArg {
    Int(i64),
    UInt(u64),
    Float(f64),
    Opaque,
}

impl ProbeArg {
    /// Numeric value as fed into a distribution, or `None` if not numeric.
    ///
    /// Unsigned values above `i64::MAX` saturate and floats truncate toward
    /// zero; NaN and infinities count as non-numeric.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::UInt(v) => Some(i64::try_from(v).unwrap_or(i64::MAX)),
            Self::Float(v) if v.is_finite() => Some(v as i64),
            Self::Float(_) | Self::Opaque => None,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.as_i64().is_some()
    }
}

macro_rules! from_signed {
    ($($ty:ty),*) => {$(
        impl From<$ty> for ProbeArg {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($ty:ty),*) => {$(
        impl From<$ty> for ProbeArg {
            fn from(value: $ty) -> Self {
                Self::UInt(u64::from(value))
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<isize> for ProbeArg {
    fn from(value: isize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<usize> for ProbeArg {
    fn from(value: usize) -> Self {
        Self::UInt(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<i128> for ProbeArg {
    fn from(value: i128) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX }))
    }
}

impl From<u128> for ProbeArg {
    fn from(value: u128) -> Self {
        Self::UInt(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<f32> for ProbeArg {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for ProbeArg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}
