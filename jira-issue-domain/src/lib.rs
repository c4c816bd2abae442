use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const ICON_FIELD: &str = "icon";

/// Raw `/issue/{key}` payload, kept as received apart from the derived `icon` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JiraIssue(Value);

impl JiraIssue {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn key(&self) -> Option<&str> {
        self.0.get("key").and_then(Value::as_str)
    }

    pub fn issue_type_icon_url(&self) -> Option<&str> {
        self.0
            .pointer("/fields/issuetype/iconUrl")
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
    }

    pub fn status_name(&self) -> Option<&str> {
        self.0.pointer("/fields/status/name").and_then(Value::as_str)
    }

    pub fn icon(&self) -> Option<&str> {
        self.0.get(ICON_FIELD).and_then(Value::as_str)
    }

    /// Stores the inlined issue type icon. Payloads that are not JSON objects are left untouched.
    pub fn set_icon(&mut self, data_uri: String) {
        if let Value::Object(map) = &mut self.0 {
            map.insert(ICON_FIELD.to_string(), Value::String(data_uri));
        }
    }
}

/// Raw `/search` payload, passed through unmodified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResults(Value);

impl SearchResults {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn issues(&self) -> Vec<JiraIssue> {
        self.0
            .get("issues")
            .and_then(Value::as_array)
            .map(|issues| issues.iter().cloned().map(JiraIssue::from_value).collect())
            .unwrap_or_default()
    }

    pub fn total(&self) -> Option<u64> {
        self.0.get("total").and_then(Value::as_u64)
    }

    pub fn start_at(&self) -> Option<u64> {
        self.0.get("startAt").and_then(Value::as_u64)
    }

    pub fn max_results(&self) -> Option<u64> {
        self.0.get("maxResults").and_then(Value::as_u64)
    }
}

/// Status name to status category color. Entries are never refreshed or evicted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusColorCache(BTreeMap<String, String>);

impl StatusColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, status: &str) -> Option<&str> {
        self.0.get(status).map(String::as_str)
    }

    pub fn contains(&self, status: &str) -> bool {
        self.0.contains_key(status)
    }

    /// Inserts `color` unless `status` is already cached; returns the cached color either way.
    pub fn insert_if_absent(&mut self, status: &str, color: String) -> &str {
        self.0.entry(status.to_string()).or_insert(color).as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(status, color)| (status.as_str(), color.as_str()))
    }
}

impl FromIterator<(String, String)> for StatusColorCache {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{JiraIssue, SearchResults, StatusColorCache};

    #[test]
    fn reads_issue_type_icon_and_status() {
        let issue = JiraIssue::from_value(json!({
            "key": "ABC-1",
            "fields": {
                "issuetype": {"iconUrl": "https://jira.example.com/icon.svg"},
                "status": {"name": "In Progress"}
            }
        }));

        assert_eq!(issue.key(), Some("ABC-1"));
        assert_eq!(
            issue.issue_type_icon_url(),
            Some("https://jira.example.com/icon.svg")
        );
        assert_eq!(issue.status_name(), Some("In Progress"));
        assert_eq!(issue.icon(), None);
    }

    #[test]
    fn set_icon_only_adds_the_icon_field() {
        let original = json!({"key": "ABC-1", "fields": {"summary": "hello"}});
        let mut issue = JiraIssue::from_value(original.clone());
        issue.set_icon("data:image/png;base64,AAAA".to_string());

        let mut expected = original;
        expected["icon"] = json!("data:image/png;base64,AAAA");
        assert_eq!(issue.as_value(), &expected);
    }

    #[test]
    fn set_icon_ignores_non_object_payloads() {
        let mut issue = JiraIssue::from_value(json!("not an object"));
        issue.set_icon("data:x;base64,".to_string());
        assert_eq!(issue.as_value(), &json!("not an object"));
    }

    #[test]
    fn search_results_expose_pagination_and_issues() {
        let results = SearchResults::from_value(json!({
            "startAt": 0,
            "maxResults": 10,
            "total": 2,
            "issues": [{"key": "ABC-1"}, {"key": "ABC-2"}]
        }));

        assert_eq!(results.start_at(), Some(0));
        assert_eq!(results.max_results(), Some(10));
        assert_eq!(results.total(), Some(2));
        let keys = results
            .issues()
            .iter()
            .filter_map(|issue| issue.key().map(str::to_string))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["ABC-1", "ABC-2"]);
    }

    #[test]
    fn cache_keeps_first_color() {
        let mut cache = StatusColorCache::new();
        assert_eq!(cache.insert_if_absent("Done", "green".to_string()), "green");
        assert_eq!(cache.insert_if_absent("Done", "yellow".to_string()), "green");
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("Done"));
    }

    #[test]
    fn cache_serializes_as_plain_map() {
        let cache: StatusColorCache = vec![("Done".to_string(), "green".to_string())]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_value(&cache).unwrap(), json!({"Done": "green"}));
    }
}
