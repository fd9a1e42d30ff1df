//! Path-keyed access to the router configuration tree.
//!
//! The tree is the exported JSON form of the router configuration. Every
//! accessor takes the full space-separated path from the root, e.g.
//! `"system flow-accounting netflow server"`, so there is no implicit
//! "current level" shared between callers.
//!
//! Node encoding:
//!
//! | Config node | JSON |
//! |-------------|------|
//! | leaf | string, number or boolean |
//! | leaf-list | array of scalars |
//! | tag node | object keyed by tag value |
//! | valueless flag | `{}`, `null` or `true` |

use serde_json::{Map, Value};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{FlowAcctError, FlowAcctResult};

/// Read-only snapshot of the configuration tree.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    root: Value,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl ConfigTree {
    /// Wraps an already parsed JSON document.
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Parses a tree from JSON text.
    pub fn from_json_str(json: &str) -> FlowAcctResult<Self> {
        let root: Value = serde_json::from_str(json)
            .map_err(|e| FlowAcctError::invalid_config("config tree", e.to_string()))?;
        if !root.is_object() {
            return Err(FlowAcctError::invalid_config(
                "config tree",
                "top level must be a JSON object",
            ));
        }
        Ok(Self { root })
    }

    /// Loads the tree from a file. A missing file is an empty tree.
    pub fn load(path: impl AsRef<Path>) -> FlowAcctResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::from_json_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Config tree {} not found, using empty tree", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(FlowAcctError::io(path, e)),
        }
    }

    fn node(&self, path: &str) -> Option<&Value> {
        path.split_whitespace()
            .try_fold(&self.root, |node, segment| node.as_object()?.get(segment))
    }

    /// Returns true if the node at `path` is present.
    ///
    /// A leaf explicitly set to `false` counts as absent.
    pub fn exists(&self, path: &str) -> bool {
        !matches!(self.node(path), None | Some(Value::Bool(false)))
    }

    /// Returns the scalar value at `path`.
    pub fn value(&self, path: &str) -> Option<String> {
        self.node(path).and_then(scalar)
    }

    /// Returns the values of a leaf-list. A single scalar is a one-element
    /// list.
    pub fn values(&self, path: &str) -> Vec<String> {
        match self.node(path) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
            Some(other) => scalar(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Returns the child names of a tag node, in document order.
    pub fn nodes(&self, path: &str) -> Vec<String> {
        match self.node(path) {
            Some(Value::Object(children)) => children.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Parses the scalar at `path` into `T`.
    ///
    /// Absent is `Ok(None)`; an unparsable value is an
    /// [`FlowAcctError::InvalidConfig`] naming the path.
    pub fn parse<T>(&self, path: &str) -> FlowAcctResult<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.value(path) {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| FlowAcctError::invalid_config(path, format!("'{}': {}", raw, e))),
            None => Ok(None),
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
