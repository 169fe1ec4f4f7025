//! Static resource config types: backend function names, id conventions, boundary schema.

use serde::Serialize;

/// Default parameter name the backend expects for entity identifiers.
pub const DEFAULT_ID_ARG: &str = "id";

/// Value type a field accepts at the adapter boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// Reference to another document (a backend identifier string).
    Id,
    Array,
    Object,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Id => "id",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub optional: bool,
}

impl FieldSchema {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, optional: false }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, optional: true }
    }
}

/// How a resource's list query handles filter/sort/pagination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// List query returns the whole collection; the adapter filters, sorts and slices.
    #[default]
    Local,
    /// List query accepts `filters`, `sort`, `offset`, `limit` and returns `{ page, total }`.
    Native,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ResourceConfig {
    pub table_name: &'static str,
    pub list_query: &'static str,
    pub get_query: &'static str,
    pub create_mutation: Option<&'static str>,
    pub update_mutation: Option<&'static str>,
    pub delete_mutation: Option<&'static str>,
    pub id_arg: &'static str,
    pub slug_field: Option<&'static str>,
    /// Dedicated slug lookup; `get_query` is called with `{ <slug_field>: slug }` when absent.
    pub slug_query: Option<&'static str>,
    pub list_mode: ListMode,
    pub fields: &'static [FieldSchema],
}

impl ResourceConfig {
    /// Read-only config; writes are added with the builder methods.
    pub fn read_only(
        table_name: &'static str,
        list_query: &'static str,
        get_query: &'static str,
        fields: &'static [FieldSchema],
    ) -> Self {
        Self {
            table_name,
            list_query,
            get_query,
            create_mutation: None,
            update_mutation: None,
            delete_mutation: None,
            id_arg: DEFAULT_ID_ARG,
            slug_field: None,
            slug_query: None,
            list_mode: ListMode::Local,
            fields,
        }
    }

    pub fn create(mut self, mutation: &'static str) -> Self {
        self.create_mutation = Some(mutation);
        self
    }

    pub fn update(mut self, mutation: &'static str) -> Self {
        self.update_mutation = Some(mutation);
        self
    }

    pub fn delete(mut self, mutation: &'static str) -> Self {
        self.delete_mutation = Some(mutation);
        self
    }

    pub fn id_arg(mut self, arg: &'static str) -> Self {
        self.id_arg = arg;
        self
    }

    pub fn slug(mut self, field: &'static str, query: Option<&'static str>) -> Self {
        self.slug_field = Some(field);
        self.slug_query = query;
        self
    }

    pub fn list_mode(mut self, mode: ListMode) -> Self {
        self.list_mode = mode;
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Operation names this resource supports, for discovery.
    pub fn operations(&self) -> Vec<&'static str> {
        let mut ops = vec!["list", "get"];
        if self.create_mutation.is_some() {
            ops.push("create");
        }
        if self.update_mutation.is_some() {
            ops.push("update");
        }
        if self.delete_mutation.is_some() {
            ops.push("delete");
        }
        ops
    }
}
