//! Boundary validation of write payloads against the per-resource field schema,
//! and the partial-update [`Patch`] type.

use crate::config::{FieldKind, FieldSchema, ResourceConfig};
use crate::error::AdapterError;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Marker object requesting that an optional field be cleared: `{"$clear": true}`.
pub const CLEAR_MARKER: &str = "$clear";

/// Backend document ids: lowercase alphanumerics, 31 to 37 characters.
const DOCUMENT_ID_PATTERN: &str = "^[0-9a-z]{31,37}$";

static DOCUMENT_ID: OnceLock<Option<Regex>> = OnceLock::new();

/// Whether `s` has the shape of a backend document id (as opposed to a slug).
pub fn is_document_id(s: &str) -> bool {
    DOCUMENT_ID
        .get_or_init(|| Regex::new(DOCUMENT_ID_PATTERN).ok())
        .as_ref()
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatchValue {
    Set(Value),
    Clear,
}

/// Fields to modify in an update. Fields not present are left untouched by the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    fields: BTreeMap<String, PatchValue>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// From form values: `null` is the unset sentinel and is dropped, `{"$clear": true}` clears.
    pub fn from_values(values: Map<String, Value>) -> Self {
        let mut patch = Patch::new();
        for (key, value) in values {
            match value {
                Value::Null => {}
                v if is_clear_marker(&v) => {
                    patch.fields.insert(key, PatchValue::Clear);
                }
                v => {
                    patch.fields.insert(key, PatchValue::Set(v));
                }
            }
        }
        patch
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), PatchValue::Set(value.into()));
        self
    }

    pub fn clear(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), PatchValue::Clear);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PatchValue)> {
        self.fields.iter()
    }

    /// Mutation arguments. A cleared field is sent as `null`.
    pub fn into_args(self) -> Map<String, Value> {
        self.fields
            .into_iter()
            .map(|(k, v)| match v {
                PatchValue::Set(v) => (k, v),
                PatchValue::Clear => (k, Value::Null),
            })
            .collect()
    }
}

fn is_clear_marker(v: &Value) -> bool {
    match v {
        Value::Object(obj) => obj.len() == 1 && obj.get(CLEAR_MARKER) == Some(&Value::Bool(true)),
        _ => false,
    }
}

/// Validate create values: only known fields, required fields present, kinds match.
/// Returns the payload with unset (`null`) values removed.
pub fn prepare_create(
    resource: &str,
    config: &ResourceConfig,
    values: Map<String, Value>,
) -> Result<Map<String, Value>, AdapterError> {
    let values: Map<String, Value> = values.into_iter().filter(|(_, v)| !v.is_null()).collect();
    for (name, value) in &values {
        let field = known_field(resource, config, name)?;
        check_kind(resource, field, value)?;
    }
    for field in config.fields.iter().filter(|f| !f.optional) {
        if !values.contains_key(field.name) {
            return Err(AdapterError::validation(resource, format!("{} is required", field.name)));
        }
    }
    Ok(values)
}

/// Validate only the fields present in the patch. Clearing is allowed on optional fields only.
pub fn validate_patch(resource: &str, config: &ResourceConfig, patch: &Patch) -> Result<(), AdapterError> {
    for (name, value) in patch.iter() {
        let field = known_field(resource, config, name)?;
        match value {
            PatchValue::Set(v) => check_kind(resource, field, v)?,
            PatchValue::Clear if !field.optional => {
                return Err(AdapterError::validation(
                    resource,
                    format!("{} is required and cannot be cleared", name),
                ));
            }
            PatchValue::Clear => {}
        }
    }
    Ok(())
}

fn known_field<'a>(
    resource: &str,
    config: &'a ResourceConfig,
    name: &str,
) -> Result<&'a FieldSchema, AdapterError> {
    config
        .field(name)
        .ok_or_else(|| AdapterError::validation(resource, format!("unknown field '{}'", name)))
}

fn check_kind(resource: &str, field: &FieldSchema, v: &Value) -> Result<(), AdapterError> {
    let ok = match field.kind {
        FieldKind::String => v.is_string(),
        FieldKind::Number => v.is_number(),
        FieldKind::Boolean => v.is_boolean(),
        FieldKind::Id => v.as_str().map(|s| !s.is_empty()).unwrap_or(false),
        FieldKind::Array => v.is_array(),
        FieldKind::Object => v.is_object(),
    };
    if ok {
        Ok(())
    } else {
        Err(AdapterError::validation(
            resource,
            format!("{} must be of type {}", field.name, field.kind.name()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Resource;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn document_id_shape() {
        assert!(is_document_id("jd7f3k2m9x8c4v5b6n1q0w2e3r4t5y6u"));
        assert!(is_document_id(&uuid::Uuid::new_v4().simple().to_string()));
        assert!(!is_document_id("mobile-patrol"));
        assert!(!is_document_id("cctv"));
        assert!(!is_document_id("JD7F3K2M9X8C4V5B6N1Q0W2E3R4T5Y6U"));
    }

    #[test]
    fn patch_drops_unset_and_keeps_clear() {
        let patch = Patch::from_values(obj(json!({
            "quote": "Reliable team",
            "company": null,
            "order": {"$clear": true}
        })));
        assert_eq!(patch.len(), 2);
        assert!(!patch.contains("company"));
        let args = patch.into_args();
        assert_eq!(args.get("quote"), Some(&json!("Reliable team")));
        assert_eq!(args.get("order"), Some(&Value::Null));
    }

    #[test]
    fn create_requires_schema_fields() {
        let config = Resource::Faqs.default_config();
        let err = prepare_create("faqs", &config, obj(json!({"question": "Q?", "order": 1}))).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        assert!(err.detail.contains("answer"));

        let err = prepare_create(
            "faqs",
            &config,
            obj(json!({"question": "Q?", "answer": "A", "order": "1"})),
        )
        .unwrap_err();
        assert!(err.detail.contains("number"));

        let err = prepare_create(
            "faqs",
            &config,
            obj(json!({"question": "Q?", "answer": "A", "order": 1, "color": "red"})),
        )
        .unwrap_err();
        assert!(err.detail.contains("color"));

        let ok = prepare_create(
            "faqs",
            &config,
            obj(json!({"question": "Q?", "answer": "A", "order": 1, "category": null})),
        )
        .unwrap();
        assert!(!ok.contains_key("category"));
    }

    #[test]
    fn patch_validation_guards_required_fields() {
        let config = Resource::Testimonials.default_config();
        assert!(validate_patch("testimonials", &config, &Patch::new().clear("company")).is_ok());
        let err = validate_patch("testimonials", &config, &Patch::new().clear("quote")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
        assert!(validate_patch("testimonials", &config, &Patch::new().set("rating", "five")).is_err());
        assert!(validate_patch("testimonials", &config, &Patch::new().set("_id", "x")).is_err());
    }
}
