//! Generic CRUD dispatch from the UI data-provider contract to per-resource backend functions.

use crate::backend::Backend;
use crate::config::{ListMode, Registry, Resource, ResourceConfig};
use crate::error::{AdapterError, ErrorKind};
use crate::query::{apply_local, FilterParams, ListResult, Pagination, SortParams};
use crate::service::validation::{is_document_id, prepare_create, validate_patch, Patch};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Anything that names a resource: the typed [`Resource`] or a UI-supplied string.
pub trait AsResource {
    fn as_resource(&self) -> Result<Resource, AdapterError>;
}

impl AsResource for Resource {
    fn as_resource(&self) -> Result<Resource, AdapterError> {
        Ok(*self)
    }
}

impl AsResource for str {
    fn as_resource(&self) -> Result<Resource, AdapterError> {
        self.parse()
    }
}

impl AsResource for String {
    fn as_resource(&self) -> Result<Resource, AdapterError> {
        self.parse()
    }
}

impl<T: AsResource + ?Sized> AsResource for &T {
    fn as_resource(&self) -> Result<Resource, AdapterError> {
        (**self).as_resource()
    }
}

/// Stateless between calls. Cloning shares the registry and backend client.
#[derive(Clone)]
pub struct DataAdapter {
    registry: Arc<Registry>,
    backend: Arc<dyn Backend>,
}

impl DataAdapter {
    pub fn new(registry: Arc<Registry>, backend: Arc<dyn Backend>) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn resolve(&self, resource: impl AsResource) -> Result<(Resource, &ResourceConfig), AdapterError> {
        let resource = resource.as_resource()?;
        Ok((resource, self.registry.get(resource)))
    }

    /// List records. Local list queries are filtered, sorted and sliced here; native ones
    /// receive the parameters as arguments.
    pub async fn list(
        &self,
        resource: impl AsResource,
        filters: &[FilterParams],
        sort: Option<&SortParams>,
        pagination: Option<Pagination>,
    ) -> Result<ListResult, AdapterError> {
        let (resource, config) = self.resolve(resource)?;
        let name = resource.name();

        let result = match config.list_mode {
            ListMode::Local => {
                let value = self.query(name, config.list_query, Map::new()).await?;
                let records = records_of(name, value)?;
                apply_local(records, filters, sort, pagination)
            }
            ListMode::Native => {
                let args = native_list_args(name, filters, sort, pagination)?;
                let value = self.query(name, config.list_query, args).await?;
                match value {
                    Value::Object(mut obj) => {
                        let total = obj.get("total").and_then(Value::as_u64);
                        let page = obj.remove("page").unwrap_or(Value::Null);
                        ListResult {
                            data: records_of(name, page)?,
                            total,
                        }
                    }
                    other => ListResult {
                        data: records_of(name, other)?,
                        total: None,
                    },
                }
            }
        };
        tracing::debug!(resource = %name, count = result.data.len(), total = ?result.total, "list");
        Ok(result)
    }

    /// Fetch one record by id, or by slug when the resource has a slug field and `id` is not
    /// shaped like a document id. An id-shaped value that misses is retried as a slug.
    pub async fn get(&self, resource: impl AsResource, id: &str) -> Result<Value, AdapterError> {
        let (resource, config) = self.resolve(resource)?;
        match config.slug_field {
            Some(slug_field) if !is_document_id(id) => self.fetch_by_slug(resource, config, slug_field, id).await,
            Some(slug_field) => match self.fetch_by_id(resource, config, id).await {
                Err(e) if matches!(e.kind, ErrorKind::NotFound | ErrorKind::ValidationFailed) => {
                    tracing::debug!(resource = %resource, id = %id, "id lookup missed, trying slug");
                    self.fetch_by_slug(resource, config, slug_field, id).await
                }
                other => other,
            },
            None => self.fetch_by_id(resource, config, id).await,
        }
    }

    /// Insert one record. The backend assigns the id; the stored record is returned.
    pub async fn create(
        &self,
        resource: impl AsResource,
        values: Map<String, Value>,
    ) -> Result<Value, AdapterError> {
        let (resource, config) = self.resolve(resource)?;
        let name = resource.name();
        let function = config
            .create_mutation
            .ok_or_else(|| AdapterError::unsupported(name, "create"))?;
        let payload = prepare_create(name, config, values)?;
        let value = self.mutation(name, function, payload).await?;
        match value {
            Value::String(id) => {
                tracing::info!(resource = %name, id = %id, "created");
                self.fetch_by_id(resource, config, &id).await
            }
            Value::Object(_) => Ok(value),
            other => Err(unexpected(name, function, &other)),
        }
    }

    /// Apply a partial update. Only fields in the patch reach the backend.
    pub async fn update(
        &self,
        resource: impl AsResource,
        id: &str,
        patch: Patch,
    ) -> Result<Value, AdapterError> {
        let (resource, config) = self.resolve(resource)?;
        let name = resource.name();
        let function = config
            .update_mutation
            .ok_or_else(|| AdapterError::unsupported(name, "update"))?;
        validate_patch(name, config, &patch)?;
        if patch.is_empty() {
            return self.fetch_by_id(resource, config, id).await;
        }
        let mut args = patch.into_args();
        args.insert(config.id_arg.to_string(), Value::String(id.to_string()));
        let value = self.mutation(name, function, args).await?;
        tracing::info!(resource = %name, id = %id, "updated");
        match value {
            Value::Object(_) => Ok(value),
            _ => self.fetch_by_id(resource, config, id).await,
        }
    }

    /// Delete one record. An id that is already gone counts as deleted.
    pub async fn delete(&self, resource: impl AsResource, id: &str) -> Result<(), AdapterError> {
        let (resource, config) = self.resolve(resource)?;
        let name = resource.name();
        let function = config
            .delete_mutation
            .ok_or_else(|| AdapterError::unsupported(name, "delete"))?;
        match self.mutation(name, function, single_arg(config.id_arg, id)).await {
            Ok(_) => {
                tracing::info!(resource = %name, id = %id, "deleted");
                Ok(())
            }
            Err(e) if e.kind == ErrorKind::NotFound => {
                tracing::debug!(resource = %name, id = %id, "delete of absent record");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_by_id(
        &self,
        resource: Resource,
        config: &ResourceConfig,
        id: &str,
    ) -> Result<Value, AdapterError> {
        let value = self
            .query(resource.name(), config.get_query, single_arg(config.id_arg, id))
            .await?;
        found(resource.name(), id, value)
    }

    async fn fetch_by_slug(
        &self,
        resource: Resource,
        config: &ResourceConfig,
        slug_field: &str,
        slug: &str,
    ) -> Result<Value, AdapterError> {
        let function = config.slug_query.unwrap_or(config.get_query);
        let value = self
            .query(resource.name(), function, single_arg(slug_field, slug))
            .await?;
        found(resource.name(), slug, value)
    }

    async fn query(&self, resource: &str, function: &str, args: Map<String, Value>) -> Result<Value, AdapterError> {
        tracing::debug!(resource = %resource, function = %function, "query");
        self.backend
            .query(function, args)
            .await
            .map_err(|e| backend_failure(resource, function, e))
    }

    async fn mutation(&self, resource: &str, function: &str, args: Map<String, Value>) -> Result<Value, AdapterError> {
        tracing::debug!(resource = %resource, function = %function, fields = args.len(), "mutation");
        self.backend
            .mutation(function, args)
            .await
            .map_err(|e| backend_failure(resource, function, e))
    }
}

fn backend_failure(resource: &str, function: &str, e: crate::error::BackendError) -> AdapterError {
    let err = e.into_adapter(resource);
    if err.kind == ErrorKind::BackendUnavailable {
        tracing::warn!(resource = %resource, function = %function, detail = %err.detail, "backend unavailable");
    }
    err
}

fn single_arg(name: &str, value: &str) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert(name.to_string(), Value::String(value.to_string()));
    args
}

fn found(resource: &str, id: &str, value: Value) -> Result<Value, AdapterError> {
    match value {
        Value::Null => Err(AdapterError::not_found(resource, id)),
        v => Ok(v),
    }
}

fn records_of(resource: &str, value: Value) -> Result<Vec<Value>, AdapterError> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut obj) if obj.get("page").map(Value::is_array).unwrap_or(false) => {
            records_of(resource, obj.remove("page").unwrap_or(Value::Null))
        }
        other => Err(AdapterError::new(
            ErrorKind::BackendUnavailable,
            resource,
            format!("list returned {} instead of records", kind_of(&other)),
        )),
    }
}

fn native_list_args(
    resource: &str,
    filters: &[FilterParams],
    sort: Option<&SortParams>,
    pagination: Option<Pagination>,
) -> Result<Map<String, Value>, AdapterError> {
    let encode = |v: serde_json::Result<Value>| {
        v.map_err(|e| AdapterError::validation(resource, e.to_string()))
    };
    let mut args = Map::new();
    if !filters.is_empty() {
        args.insert("filters".into(), encode(serde_json::to_value(filters))?);
    }
    if let Some(sort) = sort {
        args.insert("sort".into(), encode(serde_json::to_value(sort))?);
    }
    if let Some(p) = pagination {
        args.insert("offset".into(), Value::from(p.offset as u64));
        if let Some(limit) = p.limit {
            args.insert("limit".into(), Value::from(limit as u64));
        }
    }
    Ok(args)
}

fn unexpected(resource: &str, function: &str, value: &Value) -> AdapterError {
    AdapterError::new(
        ErrorKind::BackendUnavailable,
        resource,
        format!("{} returned {}", function, kind_of(value)),
    )
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
