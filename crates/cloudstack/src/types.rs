//! Response types shared across API categories

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Response of commands that only report success, e.g. `deleteVolume`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    #[serde(default, deserialize_with = "flexible_bool")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaytext: Option<String>,
}

/// A resource tag as returned inside resources and by `listTags`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resourceid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resourcetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Initial response of an async command: the job to poll and, for some
/// commands, the id of the resource being created
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobSubmission {
    pub jobid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Common shape of `list*` responses: a count plus a list under a
/// command-specific key
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        Self {
            count: 0,
            items: Vec::new(),
        }
    }
}

impl<T> ListResponse<T> {
    /// Returns true if the page holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for ListResponse<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Extra fields not modelled explicitly
pub type Extra = HashMap<String, Value>;

/// Accept `true`, `"true"` and `1` as true. CloudStack is inconsistent about
/// how it encodes booleans across commands and versions.
pub fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64() == Some(1),
        _ => false,
    })
}

/// Accept numbers encoded either as JSON numbers or as strings
pub fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response_accepts_string_bool() {
        let r: SuccessResponse = serde_json::from_value(json!({"success": "true"})).unwrap();
        assert!(r.success);

        let r: SuccessResponse =
            serde_json::from_value(json!({"success": false, "displaytext": "nope"})).unwrap();
        assert!(!r.success);
        assert_eq!(r.displaytext.as_deref(), Some("nope"));
    }

    #[test]
    fn test_job_submission() {
        let s: JobSubmission =
            serde_json::from_value(json!({"id": "vm-1", "jobid": "job-1"})).unwrap();
        assert_eq!(s.jobid, "job-1");
        assert_eq!(s.id.as_deref(), Some("vm-1"));
    }

    #[test]
    fn test_flexible_i64() {
        #[derive(Deserialize)]
        struct N {
            #[serde(default, deserialize_with = "flexible_i64")]
            n: Option<i64>,
        }
        let v: N = serde_json::from_value(json!({"n": "42"})).unwrap();
        assert_eq!(v.n, Some(42));
        let v: N = serde_json::from_value(json!({"n": 7})).unwrap();
        assert_eq!(v.n, Some(7));
        let v: N = serde_json::from_value(json!({})).unwrap();
        assert_eq!(v.n, None);
    }
}
