//! Enumerating the fields of a record.

use std::fmt;

use facet_core::{Facet, Field, Shape, ShapeLayout, Type, UserType};

use crate::{PatchError, PatchErrorKind, tag};

/// Per-field metadata computed at the start of a patch.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    index: usize,
    field: &'static Field,
    key: &'static str,
    mutable: bool,
}

impl FieldDescriptor {
    fn new(index: usize, field: &'static Field, tag_name: &str) -> Self {
        Self {
            index,
            field,
            key: tag::get(field, tag_name),
            mutable: is_assignable(field.shape),
        }
    }

    /// Position of the field in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The field name, as reported in patch results.
    pub fn name(&self) -> &'static str {
        self.field.name
    }

    /// The lookup key read from the patcher's tag. Empty when the field carries no such tag.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The declared type of the field.
    pub fn shape(&self) -> &'static Shape {
        self.field.shape
    }

    /// Whether the field can be assigned at all.
    ///
    /// Unsized and zero-sized fields hold no assignable state and are never patched.
    /// Visibility plays no part: a private field of a `Facet` type is patched like
    /// a public one, so keep fields out of a patch with a skip predicate such as
    /// [`ReadOnly`](crate::ReadOnly).
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Reads another tag on the same field.
    pub fn tag(&self, name: &str) -> Option<&'static str> {
        tag::lookup(self.field, name)
    }

    /// The underlying facet field.
    pub fn field(&self) -> &'static Field {
        self.field
    }

    pub(crate) fn offset(&self) -> usize {
        self.field.offset
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("index", &self.index)
            .field("name", &self.name())
            .field("key", &self.key)
            .field("shape", &format_args!("{}", self.shape()))
            .field("mutable", &self.mutable)
            .finish()
    }
}

fn is_assignable(shape: &Shape) -> bool {
    match shape.layout {
        ShapeLayout::Sized(layout) => layout.size() > 0,
        ShapeLayout::Unsized => false,
    }
}

/// Lists the fields of `shape` in declaration order, reading lookup keys from `tag_name`.
///
/// Fails if `shape` is not a struct. Named, tuple and unit structs are all accepted.
pub fn introspect(shape: &'static Shape, tag_name: &str) -> Result<Vec<FieldDescriptor>, PatchError> {
    let Type::User(UserType::Struct(struct_type)) = &shape.ty else {
        return Err(PatchErrorKind::NotAStruct { actual: shape }.into());
    };
    let fields: &'static [Field] = struct_type.fields;

    let descriptors: Vec<FieldDescriptor> = fields
        .iter()
        .enumerate()
        .map(|(index, field)| FieldDescriptor::new(index, field, tag_name))
        .collect();

    log::trace!(
        "Introspected {} ({} fields, tag `{}`)",
        shape,
        descriptors.len(),
        tag_name
    );
    Ok(descriptors)
}

/// [`introspect`] for a statically known type.
pub fn fields_of<T: Facet<'static>>(tag_name: &str) -> Result<Vec<FieldDescriptor>, PatchError> {
    introspect(T::SHAPE, tag_name)
}
