//! List parameters and the local filter, sort, paginate pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SortParams {
    pub field: String,
    pub order: SortOrder,
}

impl SortParams {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: SortOrder::Desc }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    StartsWith,
    EndsWith,
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" => FilterOperator::Eq,
            "ne" => FilterOperator::Ne,
            "gt" => FilterOperator::Gt,
            "gte" => FilterOperator::Gte,
            "lt" => FilterOperator::Lt,
            "lte" => FilterOperator::Lte,
            "contains" => FilterOperator::Contains,
            "startswith" => FilterOperator::StartsWith,
            "endswith" => FilterOperator::EndsWith,
            other => return Err(format!("unknown filter operator '{}'", other)),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterParams {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Whether `record` satisfies this predicate. Missing fields behave as `null`.
    pub fn matches(&self, record: &Value) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        match self.operator {
            FilterOperator::Eq => values_equal(actual, &self.value),
            FilterOperator::Ne => !values_equal(actual, &self.value),
            FilterOperator::Gt => ordered(actual, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(ordered(actual, &self.value), Some(Ordering::Greater | Ordering::Equal)),
            FilterOperator::Lt => ordered(actual, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(ordered(actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
            FilterOperator::Contains => text_test(actual, &self.value, |a, b| a.contains(b)),
            FilterOperator::StartsWith => text_test(actual, &self.value, |a, b| a.starts_with(b)),
            FilterOperator::EndsWith => text_test(actual, &self.value, |a, b| a.ends_with(b)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit: Some(limit) }
    }

    /// 1-based page number and page size. `None` when the offset does not fit in `usize`.
    pub fn page(current: usize, page_size: usize) -> Option<Self> {
        let offset = current.saturating_sub(1).checked_mul(page_size)?;
        Some(Self::new(offset, page_size))
    }
}

/// Result of a list call. `total` is the filtered count before pagination, when known.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub data: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Filter (AND), then stable sort, then slice. Retrieval order breaks sort ties.
pub fn apply_local(
    records: Vec<Value>,
    filters: &[FilterParams],
    sort: Option<&SortParams>,
    pagination: Option<Pagination>,
) -> ListResult {
    let mut rows: Vec<Value> = records
        .into_iter()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .collect();

    if let Some(sort) = sort {
        let key = |r: &Value| r.get(&sort.field).cloned().unwrap_or(Value::Null);
        match sort.order {
            SortOrder::Asc => rows.sort_by(|a, b| compare_for_sort(&key(a), &key(b))),
            SortOrder::Desc => rows.sort_by(|a, b| compare_for_sort(&key(b), &key(a))),
        }
    }

    let total = rows.len() as u64;
    let data = match pagination {
        Some(p) => {
            let iter = rows.into_iter().skip(p.offset);
            match p.limit {
                Some(limit) => iter.take(limit).collect(),
                None => iter.collect(),
            }
        }
        None => rows,
    };
    ListResult { data, total: Some(total) }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

/// Numeric for numbers, lexicographic for strings; `None` when the types disagree.
fn ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64()?.partial_cmp(&m.as_f64()?),
        (Value::String(s), Value::String(t)) => Some(s.as_str().cmp(t.as_str())),
        _ => None,
    }
}

fn coerce_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_test(actual: &Value, needle: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (coerce_text(actual), coerce_text(needle)) {
        (Some(a), Some(b)) => test(&a, &b),
        _ => false,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values for sorting: nulls first, then by type, then by value.
fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(_), Value::Number(_)) | (Value::String(_), Value::String(_)) => {
            ordered(a, b).unwrap_or(Ordering::Equal)
        }
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(result: &ListResult) -> Vec<Value> {
        result.data.iter().map(|r| r["id"].clone()).collect()
    }

    #[test]
    fn gte_keeps_matching_rows_in_retrieval_order() {
        let rows = vec![
            json!({"id": "a", "rating": 3}),
            json!({"id": "b", "rating": 4}),
            json!({"id": "c", "rating": 5}),
        ];
        let filters = [FilterParams::new("rating", FilterOperator::Gte, 4)];
        let out = apply_local(rows, &filters, None, None);
        assert_eq!(ids(&out), vec![json!("b"), json!("c")]);
        assert_eq!(out.total, Some(2));
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let rows = vec![
            json!({"id": "x", "order": 3}),
            json!({"id": "y", "order": 1}),
            json!({"id": "z", "order": 2}),
            json!({"id": "y2", "order": 1}),
        ];
        let asc = apply_local(rows.clone(), &[], Some(&SortParams::asc("order")), None);
        assert_eq!(ids(&asc), vec![json!("y"), json!("y2"), json!("z"), json!("x")]);

        let desc = apply_local(rows, &[], Some(&SortParams::desc("order")), None);
        assert_eq!(ids(&desc), vec![json!("x"), json!("z"), json!("y"), json!("y2")]);
    }

    #[test]
    fn filters_are_anded() {
        let rows = vec![
            json!({"id": 1, "category": "guarding", "order": 1}),
            json!({"id": 2, "category": "guarding", "order": 5}),
            json!({"id": 3, "category": "cctv", "order": 6}),
        ];
        let filters = [
            FilterParams::new("category", FilterOperator::Eq, "guarding"),
            FilterParams::new("order", FilterOperator::Gt, 2),
        ];
        let out = apply_local(rows, &filters, None, None);
        assert_eq!(ids(&out), vec![json!(2)]);
    }

    #[test]
    fn text_operators_are_case_sensitive_and_coerce() {
        let row = json!({"title": "Mobile Patrol", "order": 120, "note": null});
        assert!(FilterParams::new("title", FilterOperator::Contains, "Patrol").matches(&row));
        assert!(!FilterParams::new("title", FilterOperator::Contains, "patrol").matches(&row));
        assert!(FilterParams::new("title", FilterOperator::StartsWith, "Mob").matches(&row));
        assert!(FilterParams::new("title", FilterOperator::EndsWith, "trol").matches(&row));
        assert!(FilterParams::new("order", FilterOperator::StartsWith, "12").matches(&row));
        assert!(!FilterParams::new("note", FilterOperator::Contains, "").matches(&row));
        assert!(!FilterParams::new("missing", FilterOperator::Contains, "x").matches(&row));
    }

    #[test]
    fn comparison_needs_matching_types() {
        let row = json!({"rating": 4, "name": "Bravo"});
        assert!(!FilterParams::new("rating", FilterOperator::Gt, "3").matches(&row));
        assert!(FilterParams::new("name", FilterOperator::Gt, "Alpha").matches(&row));
        assert!(FilterParams::new("name", FilterOperator::Lte, "Bravo").matches(&row));
        assert!(FilterParams::new("rating", FilterOperator::Eq, 4.0).matches(&row));
        assert!(FilterParams::new("missing", FilterOperator::Ne, 1).matches(&row));
    }

    #[test]
    fn pagination_slices_after_sort_and_reports_total() {
        let rows: Vec<Value> = (1..=7).rev().map(|n| json!({"id": n, "order": n})).collect();
        let out = apply_local(rows, &[], Some(&SortParams::asc("order")), Pagination::page(2, 3));
        assert_eq!(ids(&out), vec![json!(4), json!(5), json!(6)]);
        assert_eq!(out.total, Some(7));
        assert_eq!(Pagination::page(usize::MAX, 2), None);

        let rows: Vec<Value> = (1..=3).map(|n| json!({"id": n})).collect();
        let out = apply_local(rows, &[], None, Some(Pagination::new(5, 10)));
        assert!(out.data.is_empty());
        assert_eq!(out.total, Some(3));
    }

    #[test]
    fn missing_sort_keys_come_first_ascending() {
        let rows = vec![json!({"id": "a", "order": 2}), json!({"id": "b"}), json!({"id": "c", "order": 1})];
        let out = apply_local(rows, &[], Some(&SortParams::asc("order")), None);
        assert_eq!(ids(&out), vec![json!("b"), json!("c"), json!("a")]);
    }

    #[test]
    fn operators_parse_from_query_names() {
        assert_eq!("startswith".parse::<FilterOperator>().unwrap(), FilterOperator::StartsWith);
        assert!("like".parse::<FilterOperator>().is_err());
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
    }
}
