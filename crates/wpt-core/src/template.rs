use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Placeholder values keyed by template key (`firstViewFirstByte`, `id`, ...).
/// Values are inserted verbatim, so they must already be valid SQL.
pub type Params = BTreeMap<String, String>;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex"))
}

/// Replaces every `{{key}}` with its value. Unknown keys render as the empty
/// string; callers are responsible for supplying every key.
pub fn render(template: &str, params: &Params) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| {
            params.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

/// Keys referenced by a template, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for caps in placeholder().captures_iter(template) {
        let key = caps[1].to_string();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Redshift string literal. Backslash is an escape character there, so it is
/// doubled along with the single quote.
pub fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

pub fn sql_timestamp(value: DateTime<Utc>) -> String {
    format!("'{}'", value.format("%Y-%m-%d %H:%M:%S"))
}

pub fn sql_integer(value: i64) -> String {
    value.to_string()
}
