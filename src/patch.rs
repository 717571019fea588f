//! The merge engine.

use std::{borrow::Cow, fmt, ptr::NonNull};

use facet_core::Facet;

use crate::{
    Coercion, FieldSlot, PartialMap, PatchError, ReadOnly, SkipPredicate, Value,
    coerce::coerce, introspect::introspect, skip::should_skip,
};

/// The outcome of one patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    /// Names of the fields that were assigned, in declaration order.
    pub updated: Vec<&'static str>,
    /// Fields that had an entry in the partial map which could not be assigned,
    /// in declaration order.
    pub rejected: Vec<Rejection>,
}

impl PatchReport {
    /// Returns `true` if the field named `name` was assigned.
    pub fn is_updated(&self, name: &str) -> bool {
        self.updated.iter().any(|&field| field == name)
    }

    /// Returns `true` if nothing was assigned.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
    }
}

/// A partial map entry that matched a field but could not be assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// The field name.
    pub field: &'static str,
    /// The lookup key that matched.
    pub key: &'static str,
    /// The raw value that no direct match or coercion accepted.
    pub value: Value,
}

/// A configured patch: the tag lookup keys are read from, a skip chain, and a
/// coercion registry.
///
/// ```
/// use facet::Facet;
/// use facet_patch::{Patcher, PartialMap, ReadOnly, Value};
///
/// #[derive(Facet, Default)]
/// struct User {
///     #[facet(json = "id")]
///     #[facet(props = "readonly")]
///     id: u64,
///     #[facet(json = "name")]
///     name: String,
/// }
///
/// let mut user = User::default();
/// let partial = PartialMap::from([
///     ("id".to_string(), Value::U64(7)),
///     ("name".to_string(), Value::from("Ferris")),
/// ]);
///
/// let updated = Patcher::new("json")
///     .skip(ReadOnly::new())
///     .apply(&mut user, &partial)
///     .unwrap();
///
/// assert_eq!(updated, ["name"]);
/// assert_eq!(user.id, 0);
/// assert_eq!(user.name, "Ferris");
/// ```
pub struct Patcher {
    tag: Cow<'static, str>,
    skips: Vec<Box<dyn SkipPredicate>>,
    coercions: Vec<Box<dyn Coercion>>,
}

impl Patcher {
    /// A patcher reading lookup keys from `tag`, with an empty skip chain and
    /// no coercions.
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag: tag.into(),
            skips: Vec::new(),
            coercions: Vec::new(),
        }
    }

    /// A patcher reading lookup keys from `tag` whose skip chain starts with
    /// [`ReadOnly`](crate::ReadOnly), as in [`DEFAULT_SKIPS`](crate::DEFAULT_SKIPS).
    pub fn with_default_skips(tag: impl Into<Cow<'static, str>>) -> Self {
        Self::new(tag).skip(ReadOnly::new())
    }

    /// Appends a predicate to the skip chain.
    pub fn skip(mut self, predicate: impl SkipPredicate + 'static) -> Self {
        self.skips.push(Box::new(predicate));
        self
    }

    /// Appends a coercion to the registry. Earlier registrations take precedence.
    pub fn coercion(mut self, coercion: impl Coercion + 'static) -> Self {
        self.coercions.push(Box::new(coercion));
        self
    }

    /// The tag lookup keys are read from.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Applies `partial` to `target`, returning the names of the assigned fields
    /// in declaration order.
    ///
    /// Fails only if `T` is not a struct, in which case `target` is untouched.
    /// Entries that cannot be assigned are logged and left out of the result.
    pub fn apply<T: Facet<'static>>(
        &self,
        target: &mut T,
        partial: &PartialMap,
    ) -> Result<Vec<&'static str>, PatchError> {
        self.apply_with_report(target, partial).map(|report| report.updated)
    }

    /// Like [`Patcher::apply`], but also reports the entries that were rejected.
    pub fn apply_with_report<T: Facet<'static>>(
        &self,
        target: &mut T,
        partial: &PartialMap,
    ) -> Result<PatchReport, PatchError> {
        let skips: Vec<&dyn SkipPredicate> = self
            .skips
            .iter()
            .map(|p| p.as_ref() as &dyn SkipPredicate)
            .collect();
        let coercions: Vec<&dyn Coercion> = self
            .coercions
            .iter()
            .map(|c| c.as_ref() as &dyn Coercion)
            .collect();
        merge(target, partial, &self.tag, &skips, &coercions)
    }
}

impl fmt::Debug for Patcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patcher")
            .field("tag", &self.tag)
            .field("skips", &self.skips.len())
            .field("coercions", &self.coercions.len())
            .finish()
    }
}

/// Applies `partial` to `target` in one call.
///
/// Lookup keys are read from the `tag` attribute of each field. A field is left
/// alone if any predicate in `skips` matches it. Values whose native type is not
/// the field's type are offered to `coercions` in order.
pub fn patch<T: Facet<'static>>(
    target: &mut T,
    partial: &PartialMap,
    tag: &str,
    skips: &[&dyn SkipPredicate],
    coercions: &[&dyn Coercion],
) -> Result<Vec<&'static str>, PatchError> {
    merge(target, partial, tag, skips, coercions).map(|report| report.updated)
}

fn merge<T: Facet<'static>>(
    target: &mut T,
    partial: &PartialMap,
    tag: &str,
    skips: &[&dyn SkipPredicate],
    coercions: &[&dyn Coercion],
) -> Result<PatchReport, PatchError> {
    let shape = T::SHAPE;
    log::trace!("Patching {} with {} entries", shape, partial.len());

    let fields = introspect(shape, tag)?;
    let base = NonNull::from(target).cast::<u8>();
    let mut report = PatchReport::default();

    for descriptor in &fields {
        let name = descriptor.name();

        if !descriptor.is_mutable() {
            log::trace!("{}.{} is not assignable", shape, name);
            continue;
        }
        if should_skip(skips.iter().copied(), descriptor) {
            log::debug!("{}.{} skipped by policy", shape, name);
            continue;
        }
        if descriptor.key().is_empty() {
            continue;
        }
        let Some(value) = partial.get(descriptor.key()) else {
            continue;
        };

        // SAFETY: the offset comes from `T`'s own shape, so it addresses an
        // initialized field of `*target`, which stays exclusively borrowed
        // until this function returns. Slots never outlive one iteration.
        let mut slot = unsafe { FieldSlot::new(descriptor, base.add(descriptor.offset())) };

        let assigned = if value.shape() == Some(descriptor.shape()) {
            log::trace!("{}.{} direct match ({})", shape, name, value.kind());
            slot.set_value(value)
        } else {
            coerce(coercions.iter().copied(), &mut slot, value)
        };

        if assigned {
            report.updated.push(name);
        } else {
            if value.is_null() {
                log::warn!("{}.{} cannot be assigned with value null", shape, name);
            } else {
                log::warn!("{}.{} cannot be assigned with value {}", shape, name, value);
            }
            report.rejected.push(Rejection {
                field: name,
                key: descriptor.key(),
                value: value.clone(),
            });
        }
    }

    log::trace!(
        "Patched {}: {} updated, {} rejected",
        shape,
        report.updated.len(),
        report.rejected.len()
    );
    Ok(report)
}
