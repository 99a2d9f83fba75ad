//! # Grove Codec
//!
//! Bidirectional mapping between host values and the schema-less
//! entity wire representation: a hierarchical key plus an unordered
//! bag of named, typed, optionally-repeated properties.
//!
//! Three host value kinds are supported on both directions:
//!
//! - **Map-like** ([`PropertyMap`]): an open mapping from property
//!   name to a dynamically-typed value.
//! - **Structured record** ([`Record`]): a fixed, named set of typed
//!   fields registered once per type and served from a build-once
//!   descriptor cache.
//! - **Streaming** ([`PropertyLoadSave`]): a caller-supplied type
//!   that produces or consumes the property sequence itself, over a
//!   bounded backpressured bridge.
//!
//! Decoding is best-effort with one aggregated error; encoding is
//! all-or-nothing.
//!
//! ## Usage
//!
//! ```
//! use grove_codec::{Codec, Key, KeyId, MapValue, PropValue, PropertyMap};
//!
//! let codec = Codec::default();
//! let key = Key::new("demo", "Greeting", KeyId::Id(1));
//!
//! let mut map = PropertyMap::new();
//! map.insert("text".into(), MapValue::Single(PropValue::Text("hello".into())));
//!
//! let entity = codec.save_map(&key, &map).unwrap();
//!
//! let mut restored = PropertyMap::new();
//! codec.load_map(&mut restored, &entity).unwrap();
//! assert_eq!(restored, map);
//! ```

mod bridge;
mod config;
mod decoder;
mod descriptor;
mod encoder;
mod error;
mod value;

pub use bridge::{property_channel, PropertyLoadSave, PropertySink, PropertySource};
pub use config::CodecConfig;
pub use descriptor::{
    descriptor_of, FieldGet, FieldSpec, FieldType, Record, TypeDescriptor,
};
pub use error::{CodecError, CodecResult, MismatchReason};
pub use value::{MapValue, PropValue, Property, PropertyMap, Timestamp};

// Re-exported for convenience; entities and keys are the codec's
// input and output.
pub use grove_wire::{Entity, Key, KeyId, PathElement, Reference};

/// The entity codec.
///
/// A codec is cheap to construct and stateless apart from its
/// configuration; the per-type descriptor cache behind
/// [`Record`] destinations is shared process-wide.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Creates a codec with the given configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Returns the codec's configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}
