//! Policies that keep fields out of a patch.

use std::borrow::Cow;

use crate::{FieldDescriptor, tag};

/// Decides whether a field must never be patched.
///
/// Implemented for any `Fn(&FieldDescriptor) -> bool`.
pub trait SkipPredicate: Send + Sync {
    /// Returns `true` to exclude the field, whatever the partial map holds for it.
    fn should_skip(&self, field: &FieldDescriptor) -> bool;
}

impl<F> SkipPredicate for F
where
    F: Fn(&FieldDescriptor) -> bool + Send + Sync,
{
    fn should_skip(&self, field: &FieldDescriptor) -> bool {
        self(field)
    }
}

/// Evaluates a chain of predicates as a logical OR, stopping at the first match.
pub fn should_skip<'p>(
    chain: impl IntoIterator<Item = &'p dyn SkipPredicate>,
    field: &FieldDescriptor,
) -> bool {
    chain.into_iter().any(|p| p.should_skip(field))
}

static READ_ONLY: ReadOnly = ReadOnly::new();

/// The skip chain most callers want: just [`ReadOnly`] on the `props` tag.
///
/// Pass it to [`patch`](crate::patch) directly, or start a patcher from it with
/// [`Patcher::with_default_skips`](crate::Patcher::with_default_skips).
pub static DEFAULT_SKIPS: &[&dyn SkipPredicate] = &[&READ_ONLY];

/// Skips fields whose metadata tag contains the token `readonly`.
///
/// The tag is split on `,` and each token compared verbatim, so
/// `#[facet(props = "internal,readonly")]` is read-only while
/// `#[facet(props = "internal, readonly")]` is not.
#[derive(Debug, Clone)]
pub struct ReadOnly {
    tag: Cow<'static, str>,
}

impl ReadOnly {
    /// The metadata tag read by default.
    pub const DEFAULT_TAG: &'static str = "props";

    /// The token that marks a field read-only.
    pub const TOKEN: &'static str = "readonly";

    /// Reads the `props` tag.
    pub const fn new() -> Self {
        Self {
            tag: Cow::Borrowed(Self::DEFAULT_TAG),
        }
    }

    /// Reads the given metadata tag instead of `props`.
    pub fn with_tag(tag: impl Into<Cow<'static, str>>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for ReadOnly {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipPredicate for ReadOnly {
    fn should_skip(&self, field: &FieldDescriptor) -> bool {
        field
            .tag(&self.tag)
            .is_some_and(|props| tag::has_token(props, Self::TOKEN))
    }
}
