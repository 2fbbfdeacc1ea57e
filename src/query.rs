//!
//! Query grammar serializer
//! ------------------------
//! Turns a structural [`QueryDescription`] into the query-string fragment of a
//! fielded (OData-style) grammar: `$expand`, `$select`, `$filter`, `$orderby`,
//! `$count`, `$top`, `$skip`.
//!
//! Serialization is pure and deterministic: the same description always yields
//! byte-identical output. Nothing is validated; filter and ordering expressions
//! are passed through verbatim.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field selection: a pre-joined string or an ordered list of names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Select {
    Raw(String),
    Fields(Vec<String>),
}

/// Boolean filter: one expression, or several combined with `and`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Expr(String),
    All(Vec<String>),
}

/// Ordering: a pre-joined string or ordered `field [asc|desc]` clauses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderBy {
    Raw(String),
    Clauses(Vec<String>),
}

/// Sub-resource expansion. Nested entries serialize in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expand {
    Raw(String),
    Nested(BTreeMap<String, QueryDescription>),
}

/// Recursive query description. Every facet is optional; an empty
/// description serializes to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Select>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<Expand>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub count: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

// String-or-sequence conversions shared by the text facets.
macro_rules! text_facet_from {
    ($ty:ident, $one:ident, $many:ident) => {
        impl From<&str> for $ty {
            fn from(s: &str) -> Self { $ty::$one(s.to_string()) }
        }
        impl From<String> for $ty {
            fn from(s: String) -> Self { $ty::$one(s) }
        }
        impl From<Vec<String>> for $ty {
            fn from(v: Vec<String>) -> Self { $ty::$many(v) }
        }
        impl From<Vec<&str>> for $ty {
            fn from(v: Vec<&str>) -> Self { $ty::$many(v.into_iter().map(str::to_string).collect()) }
        }
        impl From<&[&str]> for $ty {
            fn from(v: &[&str]) -> Self { $ty::$many(v.iter().map(|s| s.to_string()).collect()) }
        }
        impl<const N: usize> From<[&str; N]> for $ty {
            fn from(v: [&str; N]) -> Self { $ty::$many(v.iter().map(|s| s.to_string()).collect()) }
        }
    };
}

text_facet_from!(Select, Raw, Fields);
text_facet_from!(Filter, Expr, All);
text_facet_from!(OrderBy, Raw, Clauses);

impl From<&str> for Expand {
    fn from(s: &str) -> Self { Expand::Raw(s.to_string()) }
}

impl From<String> for Expand {
    fn from(s: String) -> Self { Expand::Raw(s) }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn comma_joined(items: &[String]) -> Option<String> {
    if items.is_empty() { None } else { Some(items.join(",")) }
}

impl Select {
    fn render(&self) -> Option<String> {
        match self {
            Select::Raw(s) => non_empty(s),
            Select::Fields(fields) => comma_joined(fields),
        }
    }
}

impl OrderBy {
    fn render(&self) -> Option<String> {
        match self {
            OrderBy::Raw(s) => non_empty(s),
            OrderBy::Clauses(clauses) => comma_joined(clauses),
        }
    }
}

impl Filter {
    fn render(&self) -> Option<String> {
        match self {
            Filter::Expr(s) => non_empty(s),
            Filter::All(exprs) if exprs.is_empty() => None,
            Filter::All(exprs) => Some(
                exprs.iter().map(|e| format!("({e})")).collect::<Vec<_>>().join(" and "),
            ),
        }
    }
}

impl Expand {
    fn render(&self) -> Option<String> {
        match self {
            Expand::Raw(s) => non_empty(s),
            Expand::Nested(entries) if entries.is_empty() => None,
            Expand::Nested(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(name, sub)| {
                        // nested clauses use ';' where the top level uses '&'
                        let inner = clauses(sub);
                        if inner.is_empty() { name.clone() } else { format!("{}({})", name, inner.join(";")) }
                    })
                    .collect();
                Some(parts.join(","))
            }
        }
    }
}

/// Ordered `key=value` clauses: expand, select, filter, orderby, count, top, skip.
fn clauses(q: &QueryDescription) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(v) = q.expand.as_ref().and_then(Expand::render) {
        out.push(format!("$expand={v}"));
    }
    if let Some(v) = q.select.as_ref().and_then(Select::render) {
        out.push(format!("$select={v}"));
    }
    if let Some(v) = q.filter.as_ref().and_then(Filter::render) {
        out.push(format!("$filter={v}"));
    }
    if let Some(v) = q.order_by.as_ref().and_then(OrderBy::render) {
        out.push(format!("$orderby={v}"));
    }
    if q.count {
        out.push("$count=true".to_string());
    }
    if let Some(top) = q.top {
        out.push(format!("$top={top}"));
    }
    if let Some(skip) = q.skip {
        out.push(format!("$skip={skip}"));
    }
    out
}

/// Serialize a description to `?clause&clause...`, or `""` when no facet is set.
pub fn to_query_string(q: &QueryDescription) -> String {
    let parts = clauses(q);
    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

impl QueryDescription {
    pub fn new() -> Self { Self::default() }

    pub fn select(mut self, select: impl Into<Select>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Add one more expression to be AND-ed with any existing filter.
    pub fn and_filter(mut self, expr: impl Into<String>) -> Self {
        let expr = expr.into();
        self.filter = Some(match self.filter.take() {
            None => Filter::All(vec![expr]),
            Some(Filter::Expr(prev)) => Filter::All(vec![prev, expr]),
            Some(Filter::All(mut all)) => {
                all.push(expr);
                Filter::All(all)
            }
        });
        self
    }

    pub fn order_by(mut self, order_by: impl Into<OrderBy>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Expand `name` with a nested description. A previously set raw
    /// expansion string is replaced.
    pub fn expand(mut self, name: impl Into<String>, sub: QueryDescription) -> Self {
        let mut entries = match self.expand.take() {
            Some(Expand::Nested(entries)) => entries,
            _ => BTreeMap::new(),
        };
        entries.insert(name.into(), sub);
        self.expand = Some(Expand::Nested(entries));
        self
    }

    pub fn expand_raw(mut self, raw: impl Into<String>) -> Self {
        self.expand = Some(Expand::Raw(raw.into()));
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// True when serialization would produce no clause at all.
    pub fn is_empty(&self) -> bool { clauses(self).is_empty() }

    pub fn to_query_string(&self) -> String { to_query_string(self) }
}

impl fmt::Display for QueryDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_query_string(self))
    }
}
