//! Resource CRUD handlers: list, create, read, update, delete.

use crate::error::AdapterError;
use crate::query::{FilterOperator, FilterParams, Pagination, SortOrder, SortParams};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::Patch;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Separator between field name and operator in filter query keys, e.g. `rating__gte=4`.
const OPERATOR_SEPARATOR: &str = "__";

#[derive(Debug, Default, PartialEq)]
pub struct ListParams {
    pub filters: Vec<FilterParams>,
    pub sort: Option<SortParams>,
    pub pagination: Option<Pagination>,
}

/// Parse list query parameters: `sort`, `order`, `offset`, `limit`, `page`, `per_page`,
/// and filters as `field=value` (eq) or `field__op=value`.
pub fn parse_list_params(resource: &str, params: BTreeMap<String, String>) -> Result<ListParams, AdapterError> {
    let bad = |detail: String| AdapterError::validation(resource, detail);
    let number = |name: &str, v: &str| {
        v.parse::<usize>()
            .map_err(|_| bad(format!("{} must be a non-negative integer", name)))
    };

    let mut out = ListParams::default();
    let mut sort_field = None;
    let mut order = SortOrder::Asc;
    let (mut offset, mut limit, mut page, mut per_page) = (None, None, None, None);

    for (k, v) in params {
        match k.as_str() {
            "sort" => sort_field = Some(v),
            "order" => order = v.parse().map_err(bad)?,
            "offset" => offset = Some(number("offset", &v)?),
            "limit" => limit = Some(number("limit", &v)?),
            "page" => page = Some(number("page", &v)?),
            "per_page" => per_page = Some(number("per_page", &v)?),
            _ => {
                let (field, operator) = match k.rsplit_once(OPERATOR_SEPARATOR) {
                    Some((field, op)) if !field.is_empty() => (field.to_string(), op.parse().map_err(bad)?),
                    _ => (k.clone(), FilterOperator::Eq),
                };
                let value = match operator {
                    FilterOperator::Contains | FilterOperator::StartsWith | FilterOperator::EndsWith => {
                        Value::String(v)
                    }
                    _ => query_value(v),
                };
                out.filters.push(FilterParams { field, operator, value });
            }
        }
    }

    out.sort = sort_field.map(|field| SortParams { field, order });
    out.pagination = match (page, per_page, offset, limit) {
        (Some(page), Some(size), _, _) => match Pagination::page(page, size) {
            Some(p) => Some(p),
            None => return Err(bad("page * per_page is out of range".into())),
        },
        (Some(_), None, _, _) | (None, Some(_), _, _) => {
            return Err(bad("page and per_page must be given together".into()));
        }
        (None, None, None, None) => None,
        (None, None, offset, limit) => Some(Pagination {
            offset: offset.unwrap_or(0),
            limit,
        }),
    };
    Ok(out)
}

/// Numbers, booleans and null are typed; everything else stays a string.
fn query_value(s: String) -> Value {
    match serde_json::from_str::<Value>(&s) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::String(s),
    }
}

fn body_to_map(resource: &str, value: Value) -> Result<Map<String, Value>, AdapterError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AdapterError::validation(resource, "body must be a JSON object")),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, AdapterError> {
    let ListParams { filters, sort, pagination } = parse_list_params(&resource, params)?;
    let result = state
        .adapter
        .list(&resource, &filters, sort.as_ref(), pagination)
        .await?;
    Ok(success_many(result.data, result.total))
}

pub async fn create(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AdapterError> {
    let values = body_to_map(&resource, body)?;
    let row = state.adapter.create(&resource, values).await?;
    Ok(success_one(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AdapterError> {
    let row = state.adapter.get(&resource, &id).await?;
    Ok(success_one_ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AdapterError> {
    let patch = Patch::from_values(body_to_map(&resource, body)?);
    let row = state.adapter.update(&resource, &id, patch).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AdapterError> {
    state.adapter.delete(&resource, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ResourceSummary {
    pub name: &'static str,
    pub table: &'static str,
    pub operations: Vec<&'static str>,
    pub id_arg: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug_field: Option<&'static str>,
    pub list_mode: crate::config::ListMode,
    pub fields: &'static [crate::config::FieldSchema],
}

/// Registered resources and the operations each supports.
pub async fn resources(State(state): State<AppState>) -> impl IntoResponse {
    let summaries: Vec<ResourceSummary> = state
        .adapter
        .registry()
        .iter()
        .map(|(resource, config)| ResourceSummary {
            name: resource.name(),
            table: config.table_name,
            operations: config.operations(),
            id_arg: config.id_arg,
            slug_field: config.slug_field,
            list_mode: config.list_mode,
            fields: config.fields,
        })
        .collect();
    success_many(summaries, None)
}
