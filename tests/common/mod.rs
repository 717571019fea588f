#![allow(dead_code)]

//! Caller-side coercions and a KDL patch decoder shared by the integration tests.

use facet_patch::{FieldSlot, PartialMap, Patcher, ReadOnly, Timestamp, Value};
use kdl::{KdlDocument, KdlError, KdlNode, KdlValue};

/// Any integer value into any integer field it fits, or into a float field.
pub fn integers(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    let Some(n) = value.as_i128() else {
        return false;
    };

    macro_rules! try_narrow {
        ($($ty:ty),*) => {
            $(
                if slot.is::<$ty>() {
                    return <$ty>::try_from(n).is_ok_and(|n| slot.set(n));
                }
            )*
        };
    }
    try_narrow!(i8, i16, i32, i64, i128, u8, u16, u32, u64, u128);

    slot.set(n as f64) || slot.set(n as f32)
}

/// Either float width into either float field.
pub fn floats(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    let Some(n) = value.as_f64() else {
        return false;
    };
    slot.set(n) || slot.set(n as f32)
}

/// `null` clears an `Option`, anything else is wrapped in `Some` when the inner type matches exactly.
pub fn options(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    match value {
        Value::Null => {
            slot.set(None::<String>)
                || slot.set(None::<i64>)
                || slot.set(None::<f64>)
                || slot.set(None::<bool>)
                || slot.set(None::<Timestamp>)
        }
        Value::String(s) => slot.set(Some(s.clone())),
        Value::I64(n) => slot.set(Some(*n)),
        Value::F64(n) => slot.set(Some(*n)),
        Value::Bool(b) => slot.set(Some(*b)),
        Value::Timestamp(ts) => slot.set(Some(*ts)),
        _ => false,
    }
}

/// Integer seconds since the epoch into a `Timestamp`.
pub fn unix_seconds(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    match value {
        Value::I64(seconds) => slot.set(Timestamp::from_secs(*seconds)),
        _ => false,
    }
}

/// The patcher most tests use: `json` lookup keys, read-only skipping, and all
/// of the coercions above.
pub fn patcher() -> Patcher {
    Patcher::new("json")
        .skip(ReadOnly::new())
        .coercion(integers)
        .coercion(floats)
        .coercion(options)
        .coercion(unix_seconds)
}

// ============================================================================
// KDL patch bodies
// ============================================================================

/// Why a KDL patch body could not be decoded.
#[derive(Debug)]
pub enum DecodeError {
    Kdl(KdlError),
    MixedNode(String),
}

impl From<KdlError> for DecodeError {
    fn from(err: KdlError) -> Self {
        Self::Kdl(err)
    }
}

/// Decodes a KDL patch body into a partial map, one entry per top-level node.
///
/// A bare node is null, one argument is that value, several arguments are a
/// list, and properties and children together are a map. When a node name
/// repeats, the last node wins.
pub fn partial_from_kdl(kdl: &str) -> Result<PartialMap, DecodeError> {
    let document: KdlDocument = kdl.parse()?;
    partial_from_document(&document)
}

fn partial_from_document(document: &KdlDocument) -> Result<PartialMap, DecodeError> {
    let mut partial = PartialMap::new();
    for node in document.nodes() {
        partial.insert(node.name().value().to_string(), node_value(node)?);
    }
    Ok(partial)
}

fn node_value(node: &KdlNode) -> Result<Value, DecodeError> {
    let mut arguments = Vec::new();
    let mut properties = PartialMap::new();

    for entry in node.entries() {
        let value = kdl_value(entry.value());
        match entry.name() {
            Some(name) => {
                properties.insert(name.value().to_string(), value);
            }
            None => arguments.push(value),
        }
    }
    if let Some(children) = node.children() {
        properties.extend(partial_from_document(children)?);
    }

    match (arguments.len(), properties.is_empty()) {
        (0, true) => Ok(Value::Null),
        (1, true) => Ok(arguments.swap_remove(0)),
        (_, true) => Ok(Value::List(arguments)),
        (0, false) => Ok(Value::Map(properties)),
        (_, false) => Err(DecodeError::MixedNode(node.name().value().to_string())),
    }
}

/// Integers become `I64` when they fit, `I128` otherwise.
pub fn kdl_value(value: &KdlValue) -> Value {
    match value {
        KdlValue::String(string) => Value::String(string.clone()),
        KdlValue::Integer(integer) => match i64::try_from(*integer) {
            Ok(integer) => Value::I64(integer),
            Err(_) => Value::I128(*integer),
        },
        KdlValue::Float(float) => Value::F64(*float),
        KdlValue::Bool(bool) => Value::Bool(*bool),
        KdlValue::Null => Value::Null,
    }
}
