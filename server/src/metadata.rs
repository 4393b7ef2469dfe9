// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Static instance metadata served under `/latest/meta-data`.
//!
//! The tree is built once at startup, usually from a JSON document, and is
//! read-only afterwards so it can be shared between requests without locking.
//!
//! # Resolution
//!
//! Paths are split on `/` and walked one segment at a time:
//!
//! | Node reached | Remaining segments | Result |
//! |--------------|--------------------|--------|
//! | missing, empty leaf, empty subtree | any | [`Resolution::NotFound`] |
//! | subtree | some | descend |
//! | subtree | none | [`Resolution::Listing`] of its sorted keys |
//! | leaf | any | [`Resolution::Leaf`] |
//!
//! Once a leaf is reached any trailing segments are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::errors::AppError;

/// A value stored under a key of a [`MetadataTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataNode {
    Leaf(String),
    Tree(MetadataTree),
}

impl MetadataNode {
    fn is_empty(&self) -> bool {
        match self {
            MetadataNode::Leaf(value) => value.is_empty(),
            MetadataNode::Tree(tree) => tree.entries.is_empty(),
        }
    }
}

impl From<&str> for MetadataNode {
    fn from(value: &str) -> Self {
        MetadataNode::Leaf(value.to_string())
    }
}

impl From<String> for MetadataNode {
    fn from(value: String) -> Self {
        MetadataNode::Leaf(value)
    }
}

impl From<MetadataTree> for MetadataNode {
    fn from(tree: MetadataTree) -> Self {
        MetadataNode::Tree(tree)
    }
}

/// Outcome of [`MetadataTree::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Leaf(&'a str),
    Listing(String),
    NotFound,
}

/// Nested key/value tree of instance attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataTree {
    entries: BTreeMap<String, MetadataNode>,
}

impl MetadataTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<MetadataNode>) {
        self.entries.insert(key.into(), node.into());
    }

    /// Resolves a slash-delimited path. Empty segments are skipped, so
    /// `"placement//availability-zone/"` walks the same keys as
    /// `"placement/availability-zone"`, and `""` lists the root.
    pub fn resolve(&self, path: &str) -> Resolution<'_> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.walk(&segments)
    }

    fn walk(&self, segments: &[&str]) -> Resolution<'_> {
        let Some((head, rest)) = segments.split_first() else {
            return Resolution::Listing(self.listing());
        };

        match self.entries.get(*head) {
            None => Resolution::NotFound,
            Some(node) if node.is_empty() => Resolution::NotFound,
            Some(MetadataNode::Leaf(value)) => Resolution::Leaf(value),
            Some(MetadataNode::Tree(tree)) => tree.walk(rest),
        }
    }

    /// Sorted immediate child keys, one per line.
    fn listing(&self) -> String {
        self.entries
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Builds a tree from a JSON object.
    ///
    /// Objects become subtrees and strings become leaves. Numbers and booleans
    /// are stored as their JSON text, arrays as their items joined by newlines,
    /// and `null` values are dropped.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            other => Err(AppError::ConfigError(format!(
                "metadata root must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_object(map: serde_json::Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .filter_map(|(key, value)| node_from_value(value).map(|node| (key, node)))
            .collect();
        Self { entries }
    }

    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    #[tracing::instrument]
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!("[imds] unable to read {}: {}", path.display(), e);
            AppError::ConfigError(format!("missing configuration file: {}", path.display()))
        })?;
        let tree = Self::from_json_str(&contents)?;

        tracing::debug!("[imds] loaded {} top-level metadata keys", tree.entries.len());

        Ok(tree)
    }
}

fn node_from_value(value: Value) -> Option<MetadataNode> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(MetadataNode::Leaf(s)),
        Value::Bool(_) | Value::Number(_) => Some(MetadataNode::Leaf(value.to_string())),
        Value::Array(items) => Some(MetadataNode::Leaf(
            items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )),
        Value::Object(map) => Some(MetadataNode::Tree(MetadataTree::from_object(map))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
