//! Profile completion percentage.
//!
//! A profile is reduced to an ordered [`ProfileFieldSet`] by its role
//! manifest, then each field is judged filled or empty by its declared kind:
//!
//! - text: non-empty after trimming
//! - number: strictly greater than zero
//! - tri-state boolean: explicitly `true` or `false`
//! - list: at least one element
//! - anything else: present and not JSON `null`

use serde::Serialize;
use serde_json::Value;

use crate::error::{MetricsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    String,
    Number,
    BooleanTriState,
    Array,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Number(Option<f64>),
    TriState(Option<bool>),
    List(Vec<String>),
    Other(Option<Value>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::String,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::TriState(_) => FieldKind::BooleanTriState,
            FieldValue::List(_) => FieldKind::Array,
            FieldValue::Other(_) => FieldKind::Other,
        }
    }

    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(value) => value.as_deref().is_some_and(|s| !s.trim().is_empty()),
            // Zero reads as "not provided".
            FieldValue::Number(value) => value.is_some_and(|n| n > 0.0),
            FieldValue::TriState(value) => value.is_some(),
            FieldValue::List(items) => !items.is_empty(),
            FieldValue::Other(value) => value.as_ref().is_some_and(|v| !v.is_null()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileField {
    pub name: &'static str,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFieldSet {
    fields: Vec<ProfileField>,
}

impl ProfileFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, name: &'static str, value: FieldValue) -> Self {
        self.fields.push(ProfileField { name, value });
        self
    }

    pub fn text(self, name: &'static str, value: Option<&str>) -> Self {
        self.push(name, FieldValue::Text(value.map(str::to_string)))
    }

    pub fn number(self, name: &'static str, value: Option<f64>) -> Self {
        self.push(name, FieldValue::Number(value))
    }

    pub fn tri_state(self, name: &'static str, value: Option<bool>) -> Self {
        self.push(name, FieldValue::TriState(value))
    }

    pub fn list(self, name: &'static str, items: &[String]) -> Self {
        self.push(name, FieldValue::List(items.to_vec()))
    }

    pub fn fields(&self) -> &[ProfileField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    pub filled_count: usize,
    pub total_count: usize,
    pub percentage: u8,
}

pub fn compute_completion(fields: &ProfileFieldSet) -> Result<CompletionResult> {
    let total_count = fields.len();
    if total_count == 0 {
        return Err(MetricsError::InvalidConfiguration(
            "profile completion manifest has no fields".to_string(),
        ));
    }

    let filled_count = fields
        .fields()
        .iter()
        .filter(|field| field.value.is_filled())
        .count();

    Ok(CompletionResult {
        filled_count,
        total_count,
        percentage: round_percentage(filled_count, total_count),
    })
}

/// Names of the unfilled fields, in manifest order.
pub fn missing_fields(fields: &ProfileFieldSet) -> Vec<&'static str> {
    fields
        .fields()
        .iter()
        .filter(|field| !field.value.is_filled())
        .map(|field| field.name)
        .collect()
}

/// `round(100 * filled / total)` with halves rounded up, computed exactly.
fn round_percentage(filled: usize, total: usize) -> u8 {
    let filled = filled.min(total) as u64;
    let total = total as u64;
    ((200 * filled + total) / (2 * total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_profile() -> ProfileFieldSet {
        ProfileFieldSet::new()
            .text("name", Some("Alice"))
            .number("age", Some(0.0))
            .list("tags", &[])
            .tri_state("verified", Some(false))
    }

    #[test]
    fn mixed_profile_is_half_complete() {
        let result = compute_completion(&mixed_profile()).unwrap();
        assert_eq!(result.filled_count, 2);
        assert_eq!(result.total_count, 4);
        assert_eq!(result.percentage, 50);
    }

    #[test]
    fn explicit_false_counts_as_filled() {
        let fields = ProfileFieldSet::new().tri_state("offers_demo_class", Some(false));
        assert_eq!(compute_completion(&fields).unwrap().percentage, 100);

        let unset = ProfileFieldSet::new().tri_state("offers_demo_class", None);
        assert_eq!(compute_completion(&unset).unwrap().percentage, 0);
    }

    #[test]
    fn whitespace_only_text_is_empty() {
        let fields = ProfileFieldSet::new()
            .text("bio", Some("   \t"))
            .text("city", None)
            .text("phone", Some(" 98450 "));
        let result = compute_completion(&fields).unwrap();
        assert_eq!(result.filled_count, 1);
        assert_eq!(result.percentage, 33);
    }

    #[test]
    fn other_kind_is_filled_unless_null() {
        let fields = ProfileFieldSet::new()
            .push("logo", FieldValue::Other(Some(Value::Null)))
            .push("hours", FieldValue::Other(Some(serde_json::json!({"mon": "9-5"}))))
            .push("social", FieldValue::Other(None));
        assert_eq!(missing_fields(&fields), vec!["logo", "social"]);
        assert_eq!(fields.fields()[1].value.kind(), FieldKind::Other);
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let err = compute_completion(&ProfileFieldSet::new()).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidConfiguration(_)));
    }

    #[test]
    fn percentage_rounds_half_up() {
        for total in 1..=20usize {
            for filled in 0..=total {
                let expected = (100.0 * filled as f64 / total as f64 + 0.5).floor() as u8;
                assert_eq!(round_percentage(filled, total), expected, "{filled}/{total}");
            }
        }
        assert_eq!(round_percentage(1, 8), 13);
        assert_eq!(round_percentage(0, 8), 0);
        assert_eq!(round_percentage(8, 8), 100);
    }

    #[test]
    fn computing_twice_gives_the_same_result() {
        let fields = mixed_profile();
        let first = compute_completion(&fields).unwrap();
        let second = compute_completion(&fields).unwrap();
        assert_eq!(first, second);
        assert_eq!(fields, mixed_profile());
    }
}
