//! Parsed query string: `fields[entity]`, `filter[attr]`, `sort`, `include`, `exclude`, `page[offset|limit]`.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// How much of an excluded association to hide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExcludeScope {
    /// `name`: keep the association itself, hide its nested relations.
    Own,
    /// `name.*`: hide the association entirely.
    All,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExcludeEntry {
    pub name: String,
    pub scope: ExcludeScope,
}

impl ExcludeEntry {
    fn parse(token: &str) -> Self {
        let mut parts = token.splitn(2, '.');
        let name = parts.next().unwrap_or_default().to_string();
        let scope = match parts.next() {
            Some("*") => ExcludeScope::All,
            _ => ExcludeScope::Own,
        };
        ExcludeEntry { name, scope }
    }
}

/// Raw `page[...]` values; interpreted leniently by the clause builder.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct QueryRequest {
    /// Entity name -> comma-separated attribute list, in arrival order.
    pub fields: Vec<(String, String)>,
    pub filter: Option<Map<String, Value>>,
    pub sort: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<ExcludeEntry>,
    pub page: PageParams,
}

fn bracket_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\[([^\[\]]+)\]$").expect("static regex"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl QueryRequest {
    /// Build from decoded query pairs. Unknown or malformed keys are ignored; later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut req = QueryRequest::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                "sort" => req.sort = Some(value).filter(|s| !s.is_empty()),
                "include" => req.include = split_list(&value),
                "exclude" => req.exclude = split_list(&value).iter().map(|t| ExcludeEntry::parse(t)).collect(),
                _ => {
                    let Some(caps) = bracket_key().captures(key) else { continue };
                    let sub = caps[2].to_string();
                    match &caps[1] {
                        "fields" => {
                            req.fields.retain(|(entity, _)| *entity != sub);
                            req.fields.push((sub, value));
                        }
                        "filter" => {
                            req.filter.get_or_insert_with(Map::new).insert(sub, Value::String(value));
                        }
                        "page" => match sub.as_str() {
                            "offset" => req.page.offset = Some(value),
                            "limit" => req.page.limit = Some(value),
                            _ => {}
                        },
                        _ => {}
                    }
                }
            }
        }
        req
    }

    pub fn exclusion(&self, matches: impl Fn(&str) -> bool) -> Option<&ExcludeEntry> {
        self.exclude.iter().find(|e| matches(&e.name))
    }
}
