//! A framework-agnostic multi-value header bag.
//!
//! `redir-core` never depends on an HTTP framework (the framework itself is
//! an external collaborator per the specification's scope). Callers such as
//! `redir-server` adapt `actix_web::HttpRequest` headers into this type.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct HeaderBag {
    values: HashMap<String, Vec<String>>,
}

impl HeaderBag {
    pub fn new() -> Self {
        HeaderBag {
            values: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// All raw values for a header name, case-insensitively, in insertion order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(|s| s.as_str())
    }
}
