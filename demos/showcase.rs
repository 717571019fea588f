//! Showcase of facet-patch
//!
//! Applies a KDL patch document to a typed settings record, with a small set of
//! caller-side coercions, and prints what changed and what was rejected.
//!
//! Run with: cargo run --example showcase

use facet::Facet;
use facet_patch::{FieldSlot, PartialMap, Patcher, ReadOnly, Timestamp, Value};
use kdl::{KdlDocument, KdlError, KdlValue};

#[derive(Facet, Debug, Default)]
struct Deployment {
    #[facet(json = "id")]
    #[facet(props = "readonly")]
    id: u64,
    #[facet(json = "name")]
    name: String,
    #[facet(json = "replicas")]
    replicas: u16,
    #[facet(json = "cpu")]
    cpu: f32,
    #[facet(json = "paused")]
    paused: bool,
    #[facet(json = "note")]
    note: Option<String>,
    #[facet(json = "deployed-at")]
    deployed_at: Timestamp,
}

/// Decodes the patch body: each top-level node contributes its first argument,
/// or null when it has none.
fn partial_from_kdl(kdl: &str) -> Result<PartialMap, KdlError> {
    let document: KdlDocument = kdl.parse()?;
    Ok(document
        .nodes()
        .iter()
        .map(|node| {
            let value = node
                .entries()
                .iter()
                .find(|entry| entry.name().is_none())
                .map_or(Value::Null, |entry| kdl_value(entry.value()));
            (node.name().value().to_string(), value)
        })
        .collect())
}

fn kdl_value(value: &KdlValue) -> Value {
    match value {
        KdlValue::String(string) => Value::String(string.clone()),
        KdlValue::Integer(integer) => {
            i64::try_from(*integer).map_or(Value::I128(*integer), Value::I64)
        }
        KdlValue::Float(float) => Value::F64(*float),
        KdlValue::Bool(bool) => Value::Bool(*bool),
        KdlValue::Null => Value::Null,
    }
}

/// Integers narrow into any integer field they fit.
fn narrow(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    let Some(n) = value.as_i128() else {
        return false;
    };
    (slot.is::<u16>() && u16::try_from(n).is_ok_and(|n| slot.set(n)))
        || (slot.is::<u32>() && u32::try_from(n).is_ok_and(|n| slot.set(n)))
        || (slot.is::<u64>() && u64::try_from(n).is_ok_and(|n| slot.set(n)))
}

/// f64 into f32.
fn single_precision(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    value.as_f64().is_some_and(|n| slot.set(n as f32))
}

/// Strings wrap into `Option<String>`, null clears it.
fn optional_string(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    match value {
        Value::Null => slot.set(None::<String>),
        Value::String(s) => slot.set(Some(s.clone())),
        _ => false,
    }
}

/// Unix seconds into a timestamp.
fn unix_seconds(slot: &mut FieldSlot<'_>, value: &Value) -> bool {
    match value {
        Value::I64(seconds) => slot.set(Timestamp::from_secs(*seconds)),
        _ => false,
    }
}

fn main() {
    let kdl = r#"
        id 12
        name "api"
        replicas 3
        cpu 0.5
        paused "no"
        note #null
        deployed-at 1700000000
        owner "ops"
    "#;

    let partial = match partial_from_kdl(kdl) {
        Ok(partial) => partial,
        Err(err) => {
            eprintln!("invalid patch: {err}");
            std::process::exit(1);
        }
    };

    let patcher = Patcher::new("json")
        .skip(ReadOnly::new())
        .coercion(narrow)
        .coercion(single_precision)
        .coercion(optional_string)
        .coercion(unix_seconds);

    let mut deployment = Deployment {
        id: 1,
        note: Some("initial rollout".to_string()),
        ..Default::default()
    };

    println!("before: {deployment:#?}");
    match patcher.apply_with_report(&mut deployment, &partial) {
        Ok(report) => {
            println!("updated: {}", report.updated.join(", "));
            for rejection in &report.rejected {
                println!(
                    "rejected: {} = {} ({})",
                    rejection.field,
                    rejection.value,
                    rejection.value.kind()
                );
            }
        }
        Err(err) => {
            eprintln!("cannot patch: {err}");
            std::process::exit(1);
        }
    }
    println!("after: {deployment:#?}");
}
