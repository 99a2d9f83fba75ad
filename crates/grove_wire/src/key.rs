//! Hierarchical entity keys.

use crate::error::{WireError, WireResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The identifying component of one key path element.
///
/// A path element is identified by exactly one of a numeric id or a
/// string name; the variant makes that exclusivity structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyId {
    /// Numeric identifier.
    Id(i64),
    /// String identifier.
    Name(String),
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Id(id) => write!(f, "{id}"),
            KeyId::Name(name) => write!(f, "{name:?}"),
        }
    }
}

/// One element of a flattened key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathElement {
    /// The entity kind of this element.
    pub kind: String,
    /// The id or name of this element.
    pub id: KeyId,
}

/// The wire form of a key-valued property: an application id plus a
/// flattened, root-first key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Application the referenced entity belongs to.
    pub app_id: String,
    /// Root-first key path.
    pub path: Vec<PathElement>,
}

/// A hierarchical entity key.
///
/// A key names one entity: a kind plus an id or name, optionally
/// scoped under a parent key. Parents are shared immutably; cloning a
/// key never deep-copies its ancestor chain.
///
/// The root of the ancestor chain (the key with no parent) is the
/// entity-group root used for ancestor grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    app_id: String,
    kind: String,
    id: KeyId,
    parent: Option<Arc<Key>>,
}

impl Key {
    /// Creates a new root key.
    pub fn new(app_id: impl Into<String>, kind: impl Into<String>, id: KeyId) -> Self {
        Self {
            app_id: app_id.into(),
            kind: kind.into(),
            id,
            parent: None,
        }
    }

    /// Returns this key re-rooted under `parent`.
    #[must_use]
    pub fn with_parent(mut self, parent: Key) -> Self {
        self.parent = Some(Arc::new(parent));
        self
    }

    /// Returns the application id, which may be empty.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns the entity kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the id or name of this key's own path element.
    pub fn id(&self) -> &KeyId {
        &self.id
    }

    /// Returns the parent key, if any.
    pub fn parent(&self) -> Option<&Key> {
        self.parent.as_deref()
    }

    /// Returns the root of this key's ancestor chain.
    ///
    /// A key without a parent is its own root.
    pub fn root(&self) -> &Key {
        let mut key = self;
        while let Some(parent) = key.parent() {
            key = parent;
        }
        key
    }

    /// Returns the flattened, root-first key path.
    pub fn path(&self) -> Vec<PathElement> {
        let mut elements = Vec::new();
        let mut key = Some(self);
        while let Some(k) = key {
            elements.push(PathElement {
                kind: k.kind.clone(),
                id: k.id.clone(),
            });
            key = k.parent();
        }
        elements.reverse();
        elements
    }

    /// Converts this key into its wire reference form.
    ///
    /// `default_app_id` is used when the key itself carries no
    /// application id.
    pub fn to_reference(&self, default_app_id: &str) -> Reference {
        let app_id = if self.app_id.is_empty() {
            default_app_id.to_string()
        } else {
            self.app_id.clone()
        };
        Reference {
            app_id,
            path: self.path(),
        }
    }

    /// Reconstructs a key from its wire reference form.
    ///
    /// Fails if the reference path is empty.
    pub fn from_reference(reference: &Reference) -> WireResult<Self> {
        let mut key: Option<Key> = None;
        for element in &reference.path {
            let mut next = Key::new(
                reference.app_id.clone(),
                element.kind.clone(),
                element.id.clone(),
            );
            if let Some(parent) = key.take() {
                next = next.with_parent(parent);
            }
            key = Some(next);
        }
        key.ok_or_else(|| WireError::invalid_reference("empty key path"))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent() {
            write!(f, "{parent}/")?;
        }
        write!(f, "{},{}", self.kind, self.id)
    }
}
