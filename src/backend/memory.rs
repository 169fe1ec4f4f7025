//! In-process document store serving the registry's function names.
//! Used by tests and for running the admin API without a deployment.

use crate::backend::Backend;
use crate::config::{ListMode, Registry};
use crate::error::BackendError;
use crate::query::{apply_local, FilterParams, Pagination, SortParams};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Query,
    Mutation,
}

/// One function invocation as seen by the backend.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub function: String,
    pub args: Map<String, Value>,
}

#[derive(Clone, Copy, Debug)]
enum Op {
    List(ListMode),
    Get,
    GetBySlug,
    Create,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug)]
struct Route {
    table: &'static str,
    op: Op,
    id_arg: &'static str,
    slug_field: Option<&'static str>,
}

type Document = Map<String, Value>;

pub struct MemoryBackend {
    routes: HashMap<&'static str, Route>,
    tables: RwLock<HashMap<&'static str, Vec<Document>>>,
    calls: Mutex<Vec<RecordedCall>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    /// Serve every function named in the registry against empty tables.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut routes = HashMap::new();
        let mut tables = HashMap::new();
        for (_, config) in registry.iter() {
            tables.insert(config.table_name, Vec::new());
            let route = |op| Route {
                table: config.table_name,
                op,
                id_arg: config.id_arg,
                slug_field: config.slug_field,
            };
            routes.insert(config.list_query, route(Op::List(config.list_mode)));
            routes.insert(config.get_query, route(Op::Get));
            if let Some(f) = config.slug_query {
                routes.insert(f, route(Op::GetBySlug));
            }
            if let Some(f) = config.create_mutation {
                routes.insert(f, route(Op::Create));
            }
            if let Some(f) = config.update_mutation {
                routes.insert(f, route(Op::Update));
            }
            if let Some(f) = config.delete_mutation {
                routes.insert(f, route(Op::Delete));
            }
        }
        Self {
            routes,
            tables: RwLock::new(tables),
            calls: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Insert documents directly, bypassing functions. Returns the assigned ids in order.
    pub fn seed(&self, table: &str, docs: impl IntoIterator<Item = Value>) -> Result<Vec<String>, BackendError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let rows = tables.get_mut(table).ok_or_else(|| BackendError::Rejected {
            message: format!("no table '{}'", table),
            data: None,
        })?;
        let mut ids = Vec::new();
        for doc in docs {
            let fields = match doc {
                Value::Object(m) => m,
                _ => Map::new(),
            };
            let (id, doc) = new_document(fields);
            rows.push(doc);
            ids.push(id);
        }
        Ok(ids)
    }

    /// Snapshot of a table in insertion order.
    pub fn documents(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.get(table).map(|rows| rows.iter().cloned().map(Value::Object).collect()))
            .unwrap_or_default()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Simulate a lost connection: every call fails until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn dispatch(&self, kind: CallKind, function: &str, args: Map<String, Value>) -> Result<Value, BackendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                kind,
                function: function.to_string(),
                args: args.clone(),
            });
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("connection refused".into()));
        }
        let route = self.routes.get(function).copied().ok_or_else(|| BackendError::Rejected {
            message: format!("Could not find public function for '{}'", function),
            data: None,
        })?;
        let is_mutation = matches!(route.op, Op::Create | Op::Update | Op::Delete);
        if is_mutation != (kind == CallKind::Mutation) {
            return Err(BackendError::Rejected {
                message: format!("'{}' called as the wrong function type", function),
                data: None,
            });
        }

        match route.op {
            Op::List(mode) => self.list(route, mode, &args),
            Op::Get => match route.slug_field {
                Some(slug) if !args.contains_key(route.id_arg) => self.find_by(route.table, slug, &args),
                _ => self.find_by(route.table, "_id", &rename(&args, route.id_arg, "_id")),
            },
            Op::GetBySlug => {
                let slug = route.slug_field.unwrap_or("slug");
                self.find_by(route.table, slug, &args)
            }
            Op::Create => self.insert(route.table, args),
            Op::Update => self.patch(route, args),
            Op::Delete => self.remove(route, &args),
        }
    }

    fn list(&self, route: Route, mode: ListMode, args: &Map<String, Value>) -> Result<Value, BackendError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let rows: Vec<Value> = tables
            .get(route.table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default();
        match mode {
            ListMode::Local => Ok(Value::Array(rows)),
            ListMode::Native => {
                let filters: Vec<FilterParams> = arg(args, "filters")?.unwrap_or_default();
                let sort: Option<SortParams> = arg(args, "sort")?;
                let offset: Option<usize> = arg(args, "offset")?;
                let limit: Option<usize> = arg(args, "limit")?;
                let pagination = (offset.is_some() || limit.is_some()).then(|| Pagination {
                    offset: offset.unwrap_or(0),
                    limit,
                });
                let result = apply_local(rows, &filters, sort.as_ref(), pagination);
                Ok(serde_json::json!({ "page": result.data, "total": result.total }))
            }
        }
    }

    fn find_by(&self, table: &str, field: &str, args: &Map<String, Value>) -> Result<Value, BackendError> {
        let Some(wanted) = args.get(field) else {
            return Err(BackendError::Rejected {
                message: format!("ArgumentValidationError: missing '{}'", field),
                data: None,
            });
        };
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|d| d.get(field) == Some(wanted)))
            .cloned()
            .map(Value::Object)
            .unwrap_or(Value::Null))
    }

    fn insert(&self, table: &'static str, args: Map<String, Value>) -> Result<Value, BackendError> {
        let (id, doc) = new_document(args);
        let mut tables = self.tables.write().map_err(poisoned)?;
        tables.entry(table).or_default().push(doc);
        Ok(Value::String(id))
    }

    fn patch(&self, route: Route, mut args: Map<String, Value>) -> Result<Value, BackendError> {
        let id = take_id(&mut args, route.id_arg)?;
        let mut tables = self.tables.write().map_err(poisoned)?;
        let doc = tables
            .get_mut(route.table)
            .and_then(|rows| rows.iter_mut().find(|d| d.get("_id").and_then(Value::as_str) == Some(id.as_str())))
            .ok_or_else(|| BackendError::NotFound(format!("Update on nonexistent document ID {}", id)))?;
        for (k, v) in args {
            if v.is_null() {
                doc.remove(&k);
            } else {
                doc.insert(k, v);
            }
        }
        Ok(Value::Null)
    }

    fn remove(&self, route: Route, args: &Map<String, Value>) -> Result<Value, BackendError> {
        let mut args = args.clone();
        let id = take_id(&mut args, route.id_arg)?;
        let mut tables = self.tables.write().map_err(poisoned)?;
        let rows = tables.entry(route.table).or_default();
        let before = rows.len();
        rows.retain(|d| d.get("_id").and_then(Value::as_str) != Some(id.as_str()));
        if rows.len() == before {
            return Err(BackendError::NotFound(format!("Delete on nonexistent document ID {}", id)));
        }
        Ok(Value::Null)
    }
}

fn new_document(mut fields: Document) -> (String, Document) {
    let id = uuid::Uuid::new_v4().simple().to_string();
    fields.insert("_id".into(), Value::String(id.clone()));
    fields.insert(
        "_creationTime".into(),
        serde_json::json!(chrono::Utc::now().timestamp_millis() as f64),
    );
    (id, fields)
}

fn rename(args: &Map<String, Value>, from: &str, to: &str) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(v) = args.get(from) {
        out.insert(to.to_string(), v.clone());
    }
    out
}

fn take_id(args: &mut Map<String, Value>, id_arg: &str) -> Result<String, BackendError> {
    match args.remove(id_arg) {
        Some(Value::String(id)) => Ok(id),
        _ => Err(BackendError::Rejected {
            message: format!("ArgumentValidationError: missing '{}'", id_arg),
            data: None,
        }),
    }
}

fn arg<T: serde::de::DeserializeOwned>(args: &Map<String, Value>, name: &str) -> Result<Option<T>, BackendError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone()).map(Some).map_err(|e| BackendError::Rejected {
            message: format!("ArgumentValidationError: {}: {}", name, e),
            data: None,
        }),
    }
}

fn poisoned<T>(_: T) -> BackendError {
    BackendError::Unavailable("memory store lock poisoned".into())
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn query(&self, function: &str, args: Map<String, Value>) -> Result<Value, BackendError> {
        self.dispatch(CallKind::Query, function, args)
    }

    async fn mutation(&self, function: &str, args: Map<String, Value>) -> Result<Value, BackendError> {
        self.dispatch(CallKind::Mutation, function, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> MemoryBackend {
        MemoryBackend::from_registry(&Registry::builtin().unwrap())
    }

    fn args(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn create_assigns_system_fields() {
        let b = backend();
        let id = b
            .mutation("faqs:create", args(json!({"question": "Q", "answer": "A", "order": 1})))
            .await
            .unwrap();
        let id = id.as_str().unwrap().to_string();
        let doc = b.query("faqs:get", args(json!({"faqId": id}))).await.unwrap();
        assert_eq!(doc["_id"], json!(id));
        assert!(doc["_creationTime"].is_number());
        assert_eq!(doc["question"], json!("Q"));
    }

    #[tokio::test]
    async fn wrong_function_type_is_rejected() {
        let b = backend();
        let err = b.query("faqs:create", Map::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
        let err = b.query("faqs:nope", Map::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
    }

    #[tokio::test]
    async fn patch_null_removes_field_and_missing_id_is_not_found() {
        let b = backend();
        let ids = b
            .seed("testimonials", [json!({"author": "A", "quote": "Q", "rating": 5, "company": "Acme"})])
            .unwrap();
        b.mutation(
            "testimonials:update",
            args(json!({"id": ids[0], "company": null, "rating": 4})),
        )
        .await
        .unwrap();
        let docs = b.documents("testimonials");
        assert_eq!(docs[0]["rating"], json!(4));
        assert!(docs[0].get("company").is_none());

        let err = b
            .mutation("testimonials:remove", args(json!({"id": "missing"})))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn unavailable_switch_fails_every_call() {
        let b = backend();
        b.set_unavailable(true);
        let err = b.query("faqs:list", Map::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        b.set_unavailable(false);
        assert!(b.query("faqs:list", Map::new()).await.is_ok());
        assert_eq!(b.calls().len(), 2);
    }
}
