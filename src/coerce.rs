//! The coercion contract.
//!
//! When a raw value's native type is not the field's declared type, the
//! patcher hands the field to each registered [`Coercion`] in order. The
//! first one that reports success has already written the field; the rest are
//! not consulted. No coercions are built in: numeric widening, `Option`
//! wrapping, date parsing and the like are supplied by the caller.

use crate::{FieldSlot, Value};

/// A strategy for assigning a value whose type does not match the field.
///
/// Implemented for any `Fn(&mut FieldSlot<'_>, &Value) -> bool`.
pub trait Coercion: Send + Sync {
    /// Tries to convert `value` and write it into `slot`.
    ///
    /// Returns `true` only if the field was assigned.
    fn coerce(&self, slot: &mut FieldSlot<'_>, value: &Value) -> bool;
}

impl<F> Coercion for F
where
    F: Fn(&mut FieldSlot<'_>, &Value) -> bool + Send + Sync,
{
    fn coerce(&self, slot: &mut FieldSlot<'_>, value: &Value) -> bool {
        self(slot, value)
    }
}

/// Runs `registry` in order until one coercion succeeds.
pub fn coerce<'c>(
    registry: impl IntoIterator<Item = &'c dyn Coercion>,
    slot: &mut FieldSlot<'_>,
    value: &Value,
) -> bool {
    for (i, coercion) in registry.into_iter().enumerate() {
        if coercion.coerce(slot, value) {
            log::trace!(
                "Coercion #{} assigned {} value to {} ({})",
                i,
                value.kind(),
                slot.name(),
                slot.shape()
            );
            return true;
        }
    }
    false
}
