#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::{
    error::Error,
    fmt::{self, Display},
};

use facet_core::Shape;

mod coerce;
mod introspect;
mod patch;
mod skip;
mod slot;
mod snapshot;
pub mod tag;
mod value;

pub use coerce::{Coercion, coerce};
pub use introspect::{FieldDescriptor, fields_of, introspect};
pub use patch::{PatchReport, Patcher, Rejection, patch};
pub use skip::{DEFAULT_SKIPS, ReadOnly, SkipPredicate, should_skip};
pub use slot::FieldSlot;
pub use snapshot::partial_from_record;
pub use value::{Opaque, PartialMap, Timestamp, Value};

/// Error type for patching.
///
/// Only structural problems are errors. A value that cannot be assigned to its
/// field is logged and reported in [`PatchReport::rejected`] instead.
#[derive(Debug)]
pub struct PatchError {
    kind: PatchErrorKind,
}

impl PatchError {
    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &PatchErrorKind {
        &self.kind
    }
}

impl Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = &self.kind;
        write!(f, "{kind}")
    }
}

impl Error for PatchError {}

impl<K: Into<PatchErrorKind>> From<K> for PatchError {
    fn from(value: K) -> Self {
        let kind = value.into();
        PatchError { kind }
    }
}

/// Detailed classification of patch errors.
#[derive(Debug)]
#[non_exhaustive]
pub enum PatchErrorKind {
    /// The patch target is not a struct (for example an enum, a scalar or a list).
    NotAStruct {
        /// The shape that was passed in.
        actual: &'static Shape,
    },
}

impl Display for PatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchErrorKind::NotAStruct { actual } => {
                write!(f, "patch target must be a struct, got {actual}")
            }
        }
    }
}
