use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub const DEFAULT_SORT_FIELD: &str = "title";

/// A collaboration site as returned by the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_site_id: Option<String>,
    // any other descriptive fields, usable as sort keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Site {
    pub fn new(id: &str, title: &str, url: &str) -> Self {
        Site {
            id: id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            web_id: None,
            site_id: None,
            hub_site_id: None,
            extra: BTreeMap::new(),
        }
    }

    // Look up a field by name for sorting. Accepts the camelCase names used by
    // the directory as well as the snake_case struct names. Null, array and
    // object values count as missing.
    pub fn field(&self, name: &str) -> Option<SortKey<'_>> {
        match name {
            "id" => Some(SortKey::Text(&self.id)),
            "title" => Some(SortKey::Text(&self.title)),
            "url" => Some(SortKey::Text(&self.url)),
            "webId" | "web_id" => self.web_id.as_deref().map(SortKey::Text),
            "siteId" | "site_id" => self.site_id.as_deref().map(SortKey::Text),
            "hubSiteId" | "hub_site_id" => self.hub_site_id.as_deref().map(SortKey::Text),
            other => match self.extra.get(other)? {
                Value::Number(n) => n.as_f64().map(SortKey::Number),
                Value::Bool(b) => Some(SortKey::Bool(*b)),
                Value::String(t) => Some(SortKey::Text(t)),
                _ => None,
            },
        }
    }
}

/// A field value as seen by the Orderer. Variants of different kinds order
/// numbers first, then booleans, then text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    Number(f64),
    Bool(bool),
    Text(&'a str),
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Bool(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    fn cmp_key(&self, other: &SortKey<'_>) -> Ordering {
        match (self, other) {
            (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
            (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(y),
            (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Field and direction governing catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            field: DEFAULT_SORT_FIELD.to_string(),
            descending: false,
        }
    }
}

impl SortSpec {
    /// Build a sort spec from the caller's `order_by` / `is_desc` inputs. An absent or
    /// blank field falls back to the title.
    pub fn new(order_by: Option<&str>, is_desc: bool) -> Self {
        let field = order_by
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_SORT_FIELD);
        SortSpec {
            field: field.to_string(),
            descending: is_desc,
        }
    }
}

// Missing values order after present ones; the whole comparison is reversed
// for descending specs.
fn compare_field(a: Option<SortKey<'_>>, b: Option<SortKey<'_>>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp_key(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Return a copy of `sites` ordered by `spec`. Equal keys keep their input order.
pub fn order_sites(sites: &[Site], spec: &SortSpec) -> Vec<Site> {
    let mut out = sites.to_vec();
    // sort_by is stable
    out.sort_by(|a, b| {
        let ord = compare_field(a.field(&spec.field), b.field(&spec.field));
        if spec.descending {
            ord.reverse()
        } else {
            ord
        }
    });
    out
}

/// Strip scheme and host from an absolute URL, leaving the server-relative path.
pub fn to_relative_url(url: &str) -> String {
    let rest = match url.find("://") {
        Some(i) => &url[i + 3..],
        None => return url.to_string(),
    };
    match rest.find('/') {
        Some(i) => rest[i..].to_string(),
        None => "/".to_string(),
    }
}
