//! Custom-field normalization.
//!
//! The backend encodes a dozen custom-field types with different value
//! shapes. This module flattens every one of them into a stable
//! `{id, name, type, value}` record whose value is always one of: null, a
//! string, a `{name, id}` / `{name, login}` pair, or a list of such pairs.
//! Normalization is total over arbitrary JSON — one malformed field can
//! never abort processing of its siblings or of the parent issue.

use serde::Serialize;
use serde_json::{json, Value};

use crate::ports::CustomField;

/// The fixed set of custom-field kinds the backend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-value enumeration (`enum`).
    SingleEnum,
    /// Multi-value enumeration (`enum[]`).
    MultiEnum,
    /// Workflow state (`state`).
    State,
    /// Single build (`build`).
    SingleBuild,
    /// Multiple builds (`build[]`).
    MultiBuild,
    /// Single version (`version`).
    SingleVersion,
    /// Multiple versions (`version[]`).
    MultiVersion,
    /// Single owned field (`ownedField`).
    SingleOwned,
    /// Multiple owned fields (`ownedField[]`).
    MultiOwned,
    /// Single user (`user`).
    SingleUser,
    /// Multiple users (`user[]`).
    MultiUser,
    /// Single group (`group`).
    SingleGroup,
    /// Multiple groups (`group[]`).
    MultiGroup,
    /// Simple scalar (`simple`).
    Simple,
    /// Date (`date`).
    Date,
    /// Work period (`period`).
    Period,
    /// Long text (`text`).
    Text,
}

impl FieldKind {
    /// Parses a canonical kind string. Returns `None` for kinds this
    /// module does not know, which then fall back to the string rule.
    #[must_use]
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "enum" => Some(Self::SingleEnum),
            "enum[]" => Some(Self::MultiEnum),
            "state" => Some(Self::State),
            "build" => Some(Self::SingleBuild),
            "build[]" => Some(Self::MultiBuild),
            "version" => Some(Self::SingleVersion),
            "version[]" => Some(Self::MultiVersion),
            "ownedField" => Some(Self::SingleOwned),
            "ownedField[]" => Some(Self::MultiOwned),
            "user" => Some(Self::SingleUser),
            "user[]" => Some(Self::MultiUser),
            "group" => Some(Self::SingleGroup),
            "group[]" => Some(Self::MultiGroup),
            "simple" => Some(Self::Simple),
            "date" => Some(Self::Date),
            "period" => Some(Self::Period),
            "text" => Some(Self::Text),
            _ => None,
        }
    }

    /// The canonical string form of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleEnum => "enum",
            Self::MultiEnum => "enum[]",
            Self::State => "state",
            Self::SingleBuild => "build",
            Self::MultiBuild => "build[]",
            Self::SingleVersion => "version",
            Self::MultiVersion => "version[]",
            Self::SingleOwned => "ownedField",
            Self::MultiOwned => "ownedField[]",
            Self::SingleUser => "user",
            Self::MultiUser => "user[]",
            Self::SingleGroup => "group",
            Self::MultiGroup => "group[]",
            Self::Simple => "simple",
            Self::Date => "date",
            Self::Period => "period",
            Self::Text => "text",
        }
    }

    /// Kinds whose values project to `{name, id}` pairs.
    #[must_use]
    pub fn is_enum_shaped(self) -> bool {
        matches!(self, Self::SingleEnum | Self::MultiEnum)
    }

    /// Kinds whose values project to `{name, login}` pairs.
    #[must_use]
    pub fn is_account_shaped(self) -> bool {
        matches!(
            self,
            Self::SingleUser | Self::MultiUser | Self::SingleGroup | Self::MultiGroup
        )
    }
}

/// A custom field flattened into the stable response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedField {
    /// Field identifier.
    pub id: String,
    /// Field display name.
    pub name: String,
    /// Kind string as the backend reported it, or null.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Flattened value: null, string, pair, or list of pairs.
    pub value: Value,
}

/// Flattens one backend custom field into the stable response shape.
#[must_use]
pub fn normalize_field(field: &CustomField) -> NormalizedField {
    let kind = field.kind.as_deref().and_then(FieldKind::parse);
    let value = match &field.value {
        None => Value::Null,
        Some(raw) => normalize_value(kind, raw),
    };
    NormalizedField { id: field.id.clone(), name: field.name.clone(), kind: field.kind.clone(), value }
}

/// Flattens a raw field value according to its kind.
///
/// Unknown or absent kinds take the string fallback, so new backend field
/// types degrade to a readable rendering instead of failing.
#[must_use]
pub fn normalize_value(kind: Option<FieldKind>, value: &Value) -> Value {
    match kind {
        Some(k) if k.is_enum_shaped() => shape_pairs(value, "id"),
        Some(k) if k.is_account_shaped() => shape_pairs(value, "login"),
        _ => stringify(value),
    }
}

/// Renders a value as its default textual representation: strings pass
/// through, null stays null, everything else becomes compact JSON text.
#[must_use]
pub fn stringify(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// Projects a value into `{name, <second_key>}` pairs.
///
/// Lists keep input order and drop elements that expose no name; a single
/// named object becomes one pair; anything else takes the string fallback.
fn shape_pairs(value: &Value, second_key: &str) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| has_name(item))
                .map(|item| pair(item, second_key))
                .collect(),
        ),
        item if has_name(item) => pair(item, second_key),
        other => stringify(other),
    }
}

fn has_name(item: &Value) -> bool {
    item.get("name").is_some_and(|name| !name.is_null())
}

fn pair(item: &Value, second_key: &str) -> Value {
    json!({
        "name": item.get("name").cloned().unwrap_or(Value::Null),
        second_key: item.get(second_key).cloned().unwrap_or(Value::Null),
    })
}
