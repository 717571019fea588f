//! Reading a record back into a partial map.

use facet_core::Facet;
use facet_reflect::Peek;

use crate::{PartialMap, PatchError, PatchErrorKind, Timestamp, Value, tag};

/// Captures the tagged fields of `record` as a partial map keyed by their
/// lookup keys.
///
/// Only fields whose type has a dedicated [`Value`] variant are captured
/// (`bool`, integers, floats, `String`, [`Timestamp`]); transparent wrappers
/// and smart pointers around those are looked through. Applying the result to
/// another record of the same type copies those fields over.
pub fn partial_from_record<T: Facet<'static>>(
    record: &T,
    tag_name: &str,
) -> Result<PartialMap, PatchError> {
    let peek = Peek::new(record);
    let shape = peek.shape();
    let Ok(peek) = peek.into_struct() else {
        return Err(PatchErrorKind::NotAStruct { actual: shape }.into());
    };

    let mut partial = PartialMap::new();
    for (i, field) in peek.ty().fields.iter().enumerate() {
        let key = tag::get(field, tag_name);
        if key.is_empty() {
            continue;
        }
        let Ok(field_peek) = peek.field(i) else {
            continue;
        };
        match scalar_value(field_peek.innermost_peek()) {
            Some(value) => {
                partial.insert(key.to_string(), value);
            }
            None => log::trace!(
                "{}.{} has no scalar representation, not captured",
                shape,
                field.name
            ),
        }
    }
    Ok(partial)
}

fn scalar_value(peek: Peek) -> Option<Value> {
    macro_rules! try_get {
        ($($ty:ty => $variant:ident),* $(,)?) => {
            $(
                if let Ok(v) = peek.get::<$ty>() {
                    return Some(Value::$variant(v.clone()));
                }
            )*
        };
    }

    try_get! {
        String => String,
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
        Timestamp => Timestamp,
    }
    None
}
