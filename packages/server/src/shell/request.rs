use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String key/value pairs. Missing keys read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    /// `key[0]`, `key[1]`, ... up to the first missing or empty value.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        (0..)
            .map(|i| self.get(&format!("{}[{}]", key, i)))
            .take_while(|value| !value.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Command,
    Query,
    Unknown,
}

/// A transport-neutral request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub headers: Parameters,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Request {
    pub fn command(name: &str) -> Self {
        Self::default().header("kind", "command").header("name", name)
    }

    pub fn query(name: &str) -> Self {
        Self::default().header("kind", "query").header("name", name)
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key, value);
        self
    }

    pub fn kind(&self) -> RequestKind {
        match self.headers.get("kind") {
            "command" => RequestKind::Command,
            "query" => RequestKind::Query,
            _ => RequestKind::Unknown,
        }
    }

    /// The builder to use.
    pub fn name(&self) -> &str {
        self.headers.get("name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_all_stops_at_first_gap() {
        let params: Parameters = [("scope[0]", "replies"), ("scope[1]", "submissions"), ("scope[3]", "late")]
            .into_iter()
            .collect();

        assert_eq!(params.get_all("scope"), vec!["replies", "submissions"]);
        assert!(params.get_all("missing").is_empty());
        assert_eq!(params.get("missing"), "");
    }

    #[test]
    fn test_request_from_json() {
        let request: Request = serde_json::from_str(
            r#"{"headers": {"kind": "query", "name": "GetFrontpage"}, "parameters": {"after": "10"}}"#,
        )
        .unwrap();

        assert_eq!(request.kind(), RequestKind::Query);
        assert_eq!(request.name(), "GetFrontpage");
        assert_eq!(request.parameters.get("after"), "10");

        let bare: Request = serde_json::from_str("{}").unwrap();
        assert_eq!(bare.kind(), RequestKind::Unknown);
    }
}
