use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use facet::Facet;
use facet_patch::{
    DEFAULT_SKIPS, FieldDescriptor, PartialMap, Patcher, ReadOnly, Value, fields_of, patch,
};

#[derive(Facet, Debug, Default)]
struct Account {
    #[facet(json = "id")]
    #[facet(props = "readonly")]
    id: String,
    #[facet(json = "owner")]
    #[facet(props = "internal,readonly")]
    owner: String,
    #[facet(json = "email")]
    #[facet(props = "internal, readonly")]
    email: String,
    #[facet(json = "role")]
    #[facet(props = "ReadOnly")]
    role: String,
    #[facet(json = "note")]
    #[facet(access = "readonly")]
    note: String,
    #[facet(json = "name")]
    name: String,
}

fn everything() -> PartialMap {
    ["id", "owner", "email", "role", "note", "name"]
        .into_iter()
        .map(|key| (key.to_string(), Value::from("patched")))
        .collect()
}

#[test]
fn readonly_token_must_match_exactly() {
    let mut account = Account::default();
    let updated = Patcher::new("json")
        .skip(ReadOnly::new())
        .apply(&mut account, &everything())
        .unwrap();

    // " readonly" and "ReadOnly" are not the token; `access` is not the `props` tag.
    assert_eq!(updated, ["email", "role", "note", "name"]);
    assert_eq!(account.id, "");
    assert_eq!(account.owner, "");
}

#[test]
fn readonly_reads_a_configurable_tag() {
    let mut account = Account::default();
    let updated = Patcher::new("json")
        .skip(ReadOnly::with_tag("access"))
        .apply(&mut account, &everything())
        .unwrap();

    assert_eq!(updated, ["id", "owner", "email", "role", "name"]);
    assert_eq!(account.note, "");
}

#[test]
fn default_skips_exclude_readonly_fields() {
    let mut account = Account::default();
    let updated = patch(&mut account, &everything(), "json", DEFAULT_SKIPS, &[]).unwrap();
    assert_eq!(updated, ["email", "role", "note", "name"]);
    assert_eq!(account.owner, "");

    let mut account = Account::default();
    let updated = Patcher::with_default_skips("json")
        .apply(&mut account, &everything())
        .unwrap();
    assert_eq!(updated, ["email", "role", "note", "name"]);
    assert_eq!(account.id, "");
}

#[test]
fn empty_chain_skips_nothing() {
    let mut account = Account::default();
    let updated = Patcher::new("json")
        .apply(&mut account, &everything())
        .unwrap();
    assert_eq!(updated.len(), 6);
}

#[test]
fn custom_predicates_are_ored() {
    let mut account = Account::default();
    let updated = Patcher::new("json")
        .skip(ReadOnly::new())
        .skip(|field: &FieldDescriptor| field.name() == "name")
        .skip(|field: &FieldDescriptor| field.key().starts_with('r'))
        .apply(&mut account, &everything())
        .unwrap();

    assert_eq!(updated, ["email", "note"]);
    assert_eq!(account.name, "");
}

#[test]
fn chain_short_circuits_on_first_match() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counting = {
        let calls = Arc::clone(&calls);
        move |_: &FieldDescriptor| {
            calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    };

    let mut account = Account::default();
    Patcher::new("json")
        .skip(ReadOnly::new())
        .skip(counting)
        .apply(&mut account, &everything())
        .unwrap();

    // Only the four fields ReadOnly lets through reach the second predicate.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn skip_applies_even_without_a_map_entry() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counting = {
        let calls = Arc::clone(&calls);
        move |_: &FieldDescriptor| {
            calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    };

    let mut account = Account::default();
    let updated = Patcher::new("json")
        .skip(counting)
        .apply(&mut account, &PartialMap::new())
        .unwrap();

    assert!(updated.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[test]
fn descriptors_expose_tags() {
    let fields = fields_of::<Account>("json").unwrap();
    let names: Vec<&str> = fields.iter().map(|f| f.name()).collect();
    assert_eq!(names, ["id", "owner", "email", "role", "note", "name"]);

    assert_eq!(fields[1].key(), "owner");
    assert_eq!(fields[1].tag("props"), Some("internal,readonly"));
    assert_eq!(fields[4].tag("props"), None);
    assert_eq!(fields[4].tag("access"), Some("readonly"));
    assert_eq!(fields[5].index(), 5);
    assert!(fields.iter().all(|f| f.is_mutable()));
    assert!(fields[0].shape() == String::SHAPE);
}

#[test]
fn descriptors_without_the_tag_have_empty_keys() {
    let fields = fields_of::<Account>("yaml").unwrap();
    assert!(fields.iter().all(|f| f.key().is_empty()));
}
