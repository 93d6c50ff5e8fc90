//! Hyperlink interning (OSC 8).
//!
//! Cells carry a small handle instead of the URI; this store deduplicates
//! `(uri, id)` pairs and hands out handles starting at 1 (0 means no link).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub uri: String,
    /// The `id=` parameter from OSC 8, empty when anonymous.
    pub id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Hyperlinks {
    by_key: HashMap<(String, String), u32>,
    links: Vec<Hyperlink>,
}

impl Hyperlinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a hyperlink and return its handle. The same `(uri, id)` pair
    /// always returns the same handle.
    pub fn put(&mut self, uri: &str, id: Option<&str>) -> u32 {
        let id = id.unwrap_or("");
        if let Some(&handle) = self.by_key.get(&(uri.to_string(), id.to_string())) {
            return handle;
        }
        self.links.push(Hyperlink {
            uri: uri.to_string(),
            id: id.to_string(),
        });
        let handle = self.links.len() as u32;
        self.by_key.insert((uri.to_string(), id.to_string()), handle);
        handle
    }

    pub fn get(&self, handle: u32) -> Option<&Hyperlink> {
        if handle == 0 {
            return None;
        }
        self.links.get(handle as usize - 1)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
