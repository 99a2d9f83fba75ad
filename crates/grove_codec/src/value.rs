//! The host-side value universe.

use grove_wire::Key;
use std::collections::BTreeMap;

/// Microseconds since the Unix epoch.
///
/// The store's wire format carries timestamps as tagged 64-bit
/// integers; this newtype keeps them distinct from plain integers on
/// the host side.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from microseconds since the epoch.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Returns the microseconds since the epoch.
    pub const fn micros(self) -> i64 {
        self.0
    }
}

/// A dynamically-typed host value.
///
/// This is the complete universe of values the codec can move in and
/// out of an entity property. Anything outside it is unsupported.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// 64-bit signed integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Text(String),
    /// 64-bit float.
    Double(f64),
    /// Raw bytes. Byte values are never indexed.
    Bytes(Vec<u8>),
    /// Opaque handle to an externally stored blob.
    BlobKey(String),
    /// Microseconds since the Unix epoch.
    Timestamp(Timestamp),
    /// Reference to another entity. `None` is the nil key, which
    /// encoding silently skips to support optional key fields.
    Key(Option<Key>),
}

impl PropValue {
    /// Returns the name used for this value's type in mismatch
    /// diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropValue::Int(_) => "int",
            PropValue::Bool(_) => "bool",
            PropValue::Text(_) => "string",
            PropValue::Double(_) => "float",
            PropValue::Bytes(_) => "[]byte",
            PropValue::BlobKey(_) => "BlobKey",
            PropValue::Timestamp(_) => "Time",
            PropValue::Key(_) => "*Key",
        }
    }

    /// Returns true when this value is a nil key.
    pub fn is_nil_key(&self) -> bool {
        matches!(self, PropValue::Key(None))
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Int(n)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.to_string())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s)
    }
}

impl From<f64> for PropValue {
    fn from(f: f64) -> Self {
        PropValue::Double(f)
    }
}

impl From<Vec<u8>> for PropValue {
    fn from(b: Vec<u8>) -> Self {
        PropValue::Bytes(b)
    }
}

impl From<Timestamp> for PropValue {
    fn from(t: Timestamp) -> Self {
        PropValue::Timestamp(t)
    }
}

impl From<Key> for PropValue {
    fn from(k: Key) -> Self {
        PropValue::Key(Some(k))
    }
}

impl From<Option<Key>> for PropValue {
    fn from(k: Option<Key>) -> Self {
        PropValue::Key(k)
    }
}

/// One entry of a [`PropertyMap`]: a scalar or a slice of scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum MapValue {
    /// A single value, stored as one property.
    Single(PropValue),
    /// A slice of values, stored as one property per element with
    /// the multiple flag set.
    List(Vec<PropValue>),
}

/// A map-like host value: an open mapping from property name to a
/// dynamically-typed value.
///
/// No iteration order is guaranteed or required when encoding; the
/// ordered map merely keeps round trips deterministic.
pub type PropertyMap = BTreeMap<String, MapValue>;

/// One decoded property as seen by streaming load/save
/// implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// The property's value.
    pub value: PropValue,
    /// Excludes the property from indexing. Byte values must be
    /// flagged unindexed.
    pub no_index: bool,
    /// Declares that this name is expected to repeat.
    pub multiple: bool,
}
