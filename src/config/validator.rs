//! Registry validation: function names present, id and slug conventions consistent.

use crate::config::{FieldKind, Registry};
use crate::error::ConfigError;
use std::collections::HashSet;

pub fn validate(registry: &Registry) -> Result<(), ConfigError> {
    let mut tables = HashSet::new();

    for (resource, config) in registry.iter() {
        let invalid = |detail: String| ConfigError::InvalidEntry {
            resource: resource.name().to_string(),
            detail,
        };

        if config.table_name.is_empty() {
            return Err(invalid("table_name is empty".into()));
        }
        if !tables.insert(config.table_name) {
            return Err(invalid(format!("table '{}' is already bound to another resource", config.table_name)));
        }
        if config.list_query.is_empty() || config.get_query.is_empty() {
            return Err(invalid("list_query and get_query are required".into()));
        }
        for (op, mutation) in [
            ("create_mutation", config.create_mutation),
            ("update_mutation", config.update_mutation),
            ("delete_mutation", config.delete_mutation),
            ("slug_query", config.slug_query),
        ] {
            if mutation == Some("") {
                return Err(invalid(format!("{} is empty", op)));
            }
        }
        if config.id_arg.is_empty() {
            return Err(invalid("id_arg is empty".into()));
        }

        let mut names = HashSet::new();
        for field in config.fields {
            if field.name.is_empty() || field.name.starts_with('_') {
                return Err(invalid(format!("field name '{}' is reserved", field.name)));
            }
            if !names.insert(field.name) {
                return Err(invalid(format!("field '{}' declared twice", field.name)));
            }
        }

        if let Some(slug) = config.slug_field {
            match config.field(slug) {
                Some(f) if f.kind == FieldKind::String => {}
                Some(_) => return Err(invalid(format!("slug field '{}' must be a string", slug))),
                None => return Err(invalid(format!("slug field '{}' not in schema", slug))),
            }
        } else if config.slug_query.is_some() {
            return Err(invalid("slug_query set without slug_field".into()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::{FieldKind, FieldSchema, Registry, Resource, ResourceConfig};
    use crate::error::ConfigError;

    const FIELDS: &[FieldSchema] = &[
        FieldSchema::required("question", FieldKind::String),
        FieldSchema::required("order", FieldKind::Number),
    ];

    fn with_faqs(config: ResourceConfig) -> Result<Registry, ConfigError> {
        Registry::builtin().unwrap().with_override(Resource::Faqs, config)
    }

    #[test]
    fn slug_field_must_exist_in_schema() {
        let config = ResourceConfig::read_only("faqs", "faqs:list", "faqs:get", FIELDS).slug("handle", None);
        let err = with_faqs(config).unwrap_err();
        assert!(err.to_string().contains("handle"));
    }

    #[test]
    fn slug_field_must_be_string() {
        let config = ResourceConfig::read_only("faqs", "faqs:list", "faqs:get", FIELDS).slug("order", None);
        assert!(matches!(with_faqs(config), Err(ConfigError::InvalidEntry { .. })));
    }

    #[test]
    fn empty_function_names_are_rejected() {
        let config = ResourceConfig::read_only("faqs", "", "faqs:get", FIELDS);
        assert!(with_faqs(config).is_err());
        let config = ResourceConfig::read_only("faqs", "faqs:list", "faqs:get", FIELDS).create("");
        assert!(with_faqs(config).is_err());
        let config = ResourceConfig::read_only("faqs", "faqs:list", "faqs:get", FIELDS).id_arg("");
        assert!(with_faqs(config).is_err());
    }

    #[test]
    fn tables_are_not_shared() {
        let config = ResourceConfig::read_only("leads", "faqs:list", "faqs:get", FIELDS);
        let err = with_faqs(config).unwrap_err();
        assert!(err.to_string().contains("leads"));
    }
}
