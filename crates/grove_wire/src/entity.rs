//! Schema-less entity records and their property values.

use crate::key::{Key, PathElement, Reference};
use serde::{Deserialize, Serialize};

/// Default upper bound on the number of indexed properties one entity
/// may carry. Exceeding the configured limit is a hard encode
/// failure, never a silent truncation.
pub const MAX_INDEXED_PROPERTIES: usize = 20_000;

/// The closed set of wire value variants a property may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer.
    Int64(i64),
    /// Boolean.
    Boolean(bool),
    /// Byte string. Carries UTF-8 text unless a meaning tag refines
    /// it to raw bytes or a blob handle.
    Str(Vec<u8>),
    /// 64-bit float.
    Double(f64),
    /// Reference to another entity's key.
    Reference(Reference),
}

/// A tag refining an otherwise ambiguous wire value into a richer
/// semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meaning {
    /// The string value carries raw bytes.
    Blob,
    /// The string value carries an opaque blob handle.
    BlobKey,
    /// The integer value carries microseconds since the Unix epoch.
    Timestamp,
}

/// One named, typed, optionally-repeated value within an entity.
///
/// `value` is optional because the store's wire format expresses the
/// variant set as a bag of optional fields: a property with no
/// populated variant is representable on the wire, and the decoder
/// must treat it as a wire-format-invariant violation rather than
/// silently inventing a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name. Names are not required to be unique within an
    /// entity; repeated names carry `multiple = true`.
    pub name: String,
    /// The populated value variant, if any.
    pub value: Option<Value>,
    /// Semantic refinement of `value`.
    pub meaning: Option<Meaning>,
    /// Declares that this name is expected to repeat.
    pub multiple: bool,
}

/// The schema-less wire record: a key plus indexed and raw property
/// lists.
///
/// Property order within each list is significant and preserved; a
/// decoder always observes indexed properties in original order, then
/// raw properties in original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// The entity's key.
    pub key: Key,
    /// The root path of the key's ancestor chain, or empty when the
    /// entity is itself a root.
    pub entity_group: Vec<PathElement>,
    /// Properties that participate in server-side indexing.
    pub properties: Vec<Property>,
    /// Properties excluded from indexing.
    pub raw_properties: Vec<Property>,
}

impl Entity {
    /// Creates an empty entity under `key`, deriving the entity group
    /// from the key's ancestor chain.
    pub fn new(key: Key) -> Self {
        let entity_group = if key.parent().is_none() {
            Vec::new()
        } else {
            key.root().path()
        };
        Self {
            key,
            entity_group,
            properties: Vec::new(),
            raw_properties: Vec::new(),
        }
    }

    /// Iterates all properties in decode order: indexed properties in
    /// original order, then raw properties in original order. The
    /// second element of each item is true for raw properties.
    pub fn iter_all(&self) -> impl Iterator<Item = (&Property, bool)> {
        self.properties
            .iter()
            .map(|p| (p, false))
            .chain(self.raw_properties.iter().map(|p| (p, true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyId;

    #[test]
    fn root_key_has_empty_entity_group() {
        let entity = Entity::new(Key::new("app", "Org", KeyId::Id(1)));
        assert!(entity.entity_group.is_empty());
    }

    #[test]
    fn child_key_entity_group_is_root_path() {
        let root = Key::new("app", "Org", KeyId::Name("acme".into()));
        let child = Key::new("app", "User", KeyId::Id(7)).with_parent(root);
        let entity = Entity::new(child);

        assert_eq!(entity.entity_group.len(), 1);
        assert_eq!(entity.entity_group[0].kind, "Org");
        assert_eq!(entity.entity_group[0].id, KeyId::Name("acme".into()));
    }

    #[test]
    fn iter_all_yields_indexed_then_raw() {
        let mut entity = Entity::new(Key::new("app", "Org", KeyId::Id(1)));
        entity.properties.push(Property {
            name: "a".into(),
            value: Some(Value::Int64(1)),
            meaning: None,
            multiple: false,
        });
        entity.raw_properties.push(Property {
            name: "b".into(),
            value: Some(Value::Int64(2)),
            meaning: None,
            multiple: false,
        });

        let order: Vec<_> = entity
            .iter_all()
            .map(|(p, raw)| (p.name.clone(), raw))
            .collect();
        assert_eq!(order, vec![("a".to_string(), false), ("b".to_string(), true)]);
    }
}
