//! Field tags.
//!
//! A tag is an arbitrary facet attribute of the form `#[facet(name = "value")]`.
//! The derive macro keeps such attributes verbatim as
//! [`FieldAttribute::Arbitrary`], so the spacing around `=` is not guaranteed;
//! parsing tolerates both `name = "value"` and `name="value"`.

use facet_core::{Field, FieldAttribute};

/// Returns the value of the tag `name` on `field`, or `None` when the field
/// does not carry it.
pub fn lookup(field: &Field, name: &str) -> Option<&'static str> {
    field.attributes.iter().find_map(|attr| match attr {
        FieldAttribute::Arbitrary(raw) => parse(*raw, name),
        _ => None,
    })
}

/// Same as [`lookup`], but an absent tag reads as the empty string.
pub fn get(field: &Field, name: &str) -> &'static str {
    lookup(field, name).unwrap_or("")
}

/// Splits a tag value into its comma-separated tokens.
///
/// Tokens are not trimmed: `"a, b"` yields `"a"` and `" b"`.
pub fn tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split(',')
}

/// Returns `true` if `token` appears verbatim among the tokens of `value`.
pub fn has_token(value: &str, token: &str) -> bool {
    tokens(value).any(|t| t == token)
}

fn parse(raw: &'static str, name: &str) -> Option<&'static str> {
    let (key, value) = raw.split_once('=')?;
    if key.trim() != name {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some(value)
}
