//! Loosely-typed values carried by a [`PartialMap`].

use std::{
    any::Any,
    collections::BTreeMap,
    fmt,
    ptr::NonNull,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use facet::Facet;
use facet_core::Shape;
use facet_reflect::Peek;

/// A sparse mapping from lookup key to raw value.
///
/// Keys that match no field's lookup key are ignored when patching.
pub type PartialMap = BTreeMap<String, Value>;

/// A dynamically-typed raw value, as produced by whatever decoded the patch body.
///
/// Every variant except [`Value::Null`], [`Value::List`] and [`Value::Map`] has a
/// native Rust type (see [`Value::shape`]). A field whose declared type is exactly
/// that native type is assigned directly; everything else goes through the
/// registered coercions.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// Explicit null. Distinct from the key being absent from the map.
    Null,
    /// `bool`
    Bool(bool),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `i128`
    I128(i128),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `u128`
    U128(u128),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `String`
    String(String),
    /// [`Timestamp`]
    Timestamp(Timestamp),
    /// A sequence of values. Has no native type.
    List(Vec<Value>),
    /// A nested aggregate, keyed like a [`PartialMap`]. Has no native type.
    Map(PartialMap),
    /// Any other `Facet` type, carried by value.
    Opaque(Opaque),
}

impl Value {
    /// Wraps an arbitrary `Facet` value.
    pub fn opaque<T>(value: T) -> Self
    where
        T: Facet<'static> + Clone + PartialEq + Send + Sync + 'static,
    {
        Value::Opaque(Opaque::new(value))
    }

    /// The Rust type this value assigns to without coercion, if any.
    pub fn shape(&self) -> Option<&'static Shape> {
        Some(match self {
            Value::Bool(_) => bool::SHAPE,
            Value::I8(_) => i8::SHAPE,
            Value::I16(_) => i16::SHAPE,
            Value::I32(_) => i32::SHAPE,
            Value::I64(_) => i64::SHAPE,
            Value::I128(_) => i128::SHAPE,
            Value::U8(_) => u8::SHAPE,
            Value::U16(_) => u16::SHAPE,
            Value::U32(_) => u32::SHAPE,
            Value::U64(_) => u64::SHAPE,
            Value::U128(_) => u128::SHAPE,
            Value::F32(_) => f32::SHAPE,
            Value::F64(_) => f64::SHAPE,
            Value::String(_) => String::SHAPE,
            Value::Timestamp(_) => Timestamp::SHAPE,
            Value::Opaque(opaque) => opaque.shape(),
            Value::Null | Value::List(_) | Value::Map(_) => return None,
        })
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::I128(_) => "i128",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::U128(_) => "u128",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Widens any integer variant to `i128`. `u128` values above `i128::MAX` yield `None`.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(n) => Some(n.into()),
            Value::I16(n) => Some(n.into()),
            Value::I32(n) => Some(n.into()),
            Value::I64(n) => Some(n.into()),
            Value::I128(n) => Some(n),
            Value::U8(n) => Some(n.into()),
            Value::U16(n) => Some(n.into()),
            Value::U32(n) => Some(n.into()),
            Value::U64(n) => Some(n.into()),
            Value::U128(n) => i128::try_from(n).ok(),
            _ => None,
        }
    }

    /// Widens either float variant to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(n) => Some(n.into()),
            Value::F64(n) => Some(n),
            _ => None,
        }
    }

    /// Borrows the string payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::I8(n) => write!(f, "{n}"),
            Value::I16(n) => write!(f, "{n}"),
            Value::I32(n) => write!(f, "{n}"),
            Value::I64(n) => write!(f, "{n}"),
            Value::I128(n) => write!(f, "{n}"),
            Value::U8(n) => write!(f, "{n}"),
            Value::U16(n) => write!(f, "{n}"),
            Value::U32(n) => write!(f, "{n}"),
            Value::U64(n) => write!(f, "{n}"),
            Value::U128(n) => write!(f, "{n}"),
            Value::F32(n) => write!(f, "{n}"),
            Value::F64(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Opaque(opaque) => write!(f, "{opaque:?}"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    String => String,
    Timestamp => Timestamp,
    Vec<Value> => List,
    PartialMap => Map,
    Opaque => Opaque,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A point in time, stored as an offset from the Unix epoch.
///
/// Parsing textual dates is left to coercions; this is only the carrier.
#[derive(Facet, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

const NANOS_PER_SEC: u32 = 1_000_000_000;

impl Timestamp {
    /// Whole Unix seconds, with no sub-second part.
    pub const fn from_secs(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Builds a timestamp from Unix seconds and nanoseconds, carrying whole
    /// seconds out of `nanos`.
    ///
    /// Returns `None` if the carry overflows the seconds.
    pub fn from_unix(seconds: i64, nanos: u32) -> Option<Self> {
        let seconds = seconds.checked_add(i64::from(nanos / NANOS_PER_SEC))?;
        Some(Self {
            seconds,
            nanos: nanos % NANOS_PER_SEC,
        })
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        SystemTime::now().into()
    }

    /// Whole seconds since 1970-01-01T00:00:00Z, rounded towards negative infinity.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Nanoseconds past [`Timestamp::seconds`], always below one second.
    pub fn nanos(&self) -> u32 {
        self.nanos
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self {
                seconds: i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
                nanos: after.subsec_nanos(),
            },
            Err(err) => {
                let before = err.duration();
                let seconds = i64::try_from(before.as_secs()).map_or(i64::MIN, |s| -s);
                match before.subsec_nanos() {
                    0 => Self::from_secs(seconds),
                    nanos => Self {
                        seconds: seconds.saturating_sub(1),
                        nanos: NANOS_PER_SEC - nanos,
                    },
                }
            }
        }
    }
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> Self {
        if ts.seconds >= 0 {
            UNIX_EPOCH + Duration::new(ts.seconds.unsigned_abs(), ts.nanos)
        } else {
            UNIX_EPOCH - Duration::from_secs(ts.seconds.unsigned_abs())
                + Duration::from_nanos(ts.nanos.into())
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Stored as floor seconds plus a positive fraction; print the signed instant.
        if self.seconds < 0 && self.nanos > 0 {
            let whole = (self.seconds + 1).unsigned_abs();
            write!(f, "-{}.{:09}", whole, NANOS_PER_SEC - self.nanos)
        } else {
            write!(f, "{}.{:09}", self.seconds, self.nanos)
        }
    }
}

type ErasedBox = Box<dyn Any + Send + Sync>;
type Erased = dyn Any + Send + Sync;

/// A value of some `Facet` type that [`Value`] has no dedicated variant for.
///
/// Assigns directly to fields of exactly that type.
pub struct Opaque {
    shape: &'static Shape,
    data: ErasedBox,
    clone_fn: fn(&Erased) -> ErasedBox,
    eq_fn: fn(&Erased, &Erased) -> bool,
    write_fn: unsafe fn(&Erased, NonNull<u8>) -> bool,
    debug_fn: fn(&Erased, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl Opaque {
    /// Erases `value`, remembering its shape.
    pub fn new<T>(value: T) -> Self
    where
        T: Facet<'static> + Clone + PartialEq + Send + Sync + 'static,
    {
        Self {
            shape: T::SHAPE,
            data: Box::new(value),
            clone_fn: clone_erased::<T>,
            eq_fn: eq_erased::<T>,
            write_fn: write_erased::<T>,
            debug_fn: debug_erased::<T>,
        }
    }

    /// The shape of the carried value.
    pub fn shape(&self) -> &'static Shape {
        self.shape
    }

    /// Borrows the carried value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Assigns a clone of the carried value to `dst`, dropping what was there.
    ///
    /// # Safety
    ///
    /// `dst` must point at an initialized, exclusively borrowed value whose
    /// shape is [`Opaque::shape`].
    pub(crate) unsafe fn write_clone_to(&self, dst: NonNull<u8>) -> bool {
        // SAFETY: forwarded to the caller.
        unsafe { (self.write_fn)(&*self.data, dst) }
    }
}

fn clone_erased<T: Clone + Send + Sync + 'static>(data: &Erased) -> ErasedBox {
    match data.downcast_ref::<T>() {
        Some(value) => Box::new(value.clone()),
        None => unreachable!("opaque payload does not match its vtable"),
    }
}

unsafe fn write_erased<T: Clone + 'static>(data: &Erased, dst: NonNull<u8>) -> bool {
    match data.downcast_ref::<T>() {
        Some(value) => {
            // SAFETY: `write_clone_to`'s contract.
            unsafe { *dst.cast::<T>().as_ptr() = value.clone() };
            true
        }
        None => false,
    }
}

fn eq_erased<T: PartialEq + 'static>(a: &Erased, b: &Erased) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn debug_erased<T: Facet<'static> + 'static>(
    data: &Erased,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    match data.downcast_ref::<T>() {
        Some(value) => write!(f, "{:?}", Peek::new(value)),
        None => write!(f, "<{}>", T::SHAPE),
    }
}

impl Clone for Opaque {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape,
            data: (self.clone_fn)(&*self.data),
            clone_fn: self.clone_fn,
            eq_fn: self.eq_fn,
            write_fn: self.write_fn,
            debug_fn: self.debug_fn,
        }
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && (self.eq_fn)(&*self.data, &*other.data)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.debug_fn)(&*self.data, f)
    }
}
