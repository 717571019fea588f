//! Typed write access to a single field of a record being patched.

use std::{marker::PhantomData, ptr::NonNull};

use facet_core::{Facet, Shape};

use crate::{FieldDescriptor, Value};

/// A handle on one field of the record being patched.
///
/// Coercions receive a slot and decide whether they can turn the raw
/// [`Value`] into something the field accepts. Every write is checked against
/// the field's declared shape, so a coercion can offer candidates freely:
/// a write of the wrong type is refused and leaves the field untouched.
pub struct FieldSlot<'a> {
    descriptor: &'a FieldDescriptor,
    ptr: NonNull<u8>,
    _record: PhantomData<&'a mut ()>,
}

impl<'a> FieldSlot<'a> {
    /// # Safety
    ///
    /// `ptr` must point at the initialized field described by `descriptor`,
    /// inside a record that stays exclusively borrowed for `'a`.
    pub(crate) unsafe fn new(descriptor: &'a FieldDescriptor, ptr: NonNull<u8>) -> Self {
        Self {
            descriptor,
            ptr,
            _record: PhantomData,
        }
    }

    /// The field this slot writes to.
    pub fn descriptor(&self) -> &FieldDescriptor {
        self.descriptor
    }

    /// The field name.
    pub fn name(&self) -> &'static str {
        self.descriptor.name()
    }

    /// The declared type of the field.
    pub fn shape(&self) -> &'static Shape {
        self.descriptor.shape()
    }

    /// Returns `true` if the field is declared as exactly `F`.
    pub fn is<F: Facet<'static>>(&self) -> bool {
        F::SHAPE == self.shape()
    }

    /// Assigns `value` to the field, dropping the previous value.
    ///
    /// Returns `false` and drops `value` if the field is not declared as `F`.
    pub fn set<F: Facet<'static>>(&mut self, value: F) -> bool {
        if !self.is::<F>() {
            return false;
        }
        // SAFETY: the shapes are identical, so the slot holds an initialized `F`,
        // and `new`'s contract gives us exclusive access to it.
        unsafe { *self.ptr.cast::<F>().as_ptr() = value };
        true
    }

    /// Borrows the current value of the field if it is declared as `F`.
    pub fn get<F: Facet<'static>>(&self) -> Option<&F> {
        if !self.is::<F>() {
            return None;
        }
        // SAFETY: see `set`.
        Some(unsafe { self.ptr.cast::<F>().as_ref() })
    }

    /// Assigns a copy of `value` without any conversion.
    ///
    /// Succeeds only when the value's native type (see [`Value::shape`]) is the
    /// field's declared type. This is the direct-match path of a patch.
    pub fn set_value(&mut self, value: &Value) -> bool {
        match value {
            Value::Bool(v) => self.set(*v),
            Value::I8(v) => self.set(*v),
            Value::I16(v) => self.set(*v),
            Value::I32(v) => self.set(*v),
            Value::I64(v) => self.set(*v),
            Value::I128(v) => self.set(*v),
            Value::U8(v) => self.set(*v),
            Value::U16(v) => self.set(*v),
            Value::U32(v) => self.set(*v),
            Value::U64(v) => self.set(*v),
            Value::U128(v) => self.set(*v),
            Value::F32(v) => self.set(*v),
            Value::F64(v) => self.set(*v),
            Value::String(v) => self.set(v.clone()),
            Value::Timestamp(v) => self.set(*v),
            Value::Opaque(opaque) => {
                if opaque.shape() != self.shape() {
                    return false;
                }
                // SAFETY: shape identity, as in `set`.
                unsafe { opaque.write_clone_to(self.ptr) }
            }
            Value::Null | Value::List(_) | Value::Map(_) => false,
        }
    }
}
