//! Seams toward the host HTTP layer.
//!
//! The core never opens sockets or owns a response object; it mutates
//! headers through [`ResponseHeaders`] and receives request-scoped context
//! as a [`RequestContext`]. [`HeaderMap`] is a minimal owned implementation
//! for tests and hosts without a header type of their own.

/// Mutable view of the in-flight response headers.
pub trait ResponseHeaders {
    /// Current value of `name`, matched case-insensitively.
    fn get(&self, name: &str) -> Option<&str>;
    /// Set `name` to `value`, replacing any existing value.
    fn set(&mut self, name: &str, value: String);
}

/// Owned header map with case-insensitive names.
#[derive(Debug, Default, Clone)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResponseHeaders for HeaderMap {
    fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn set(&mut self, name: &str, value: String) {
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }
}

/// Request-scoped information handed to prehooks and posthooks.
///
/// The core never inspects these fields itself; they exist so hooks can make
/// per-request decisions without reaching outside the render call.
#[derive(Debug, Default, Clone)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}
