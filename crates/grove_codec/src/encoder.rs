//! Host value encoding into fully-formed entities.
//!
//! Encoding is all-or-nothing: any failure aborts the call and no
//! partial entity is ever returned. All three source kinds feed the
//! same [`EntityBuilder`], which owns the multiplicity, byte-indexing
//! and indexed-count rules.

use crate::bridge::{join_scoped, property_channel, PropertyLoadSave};
use crate::config::CodecConfig;
use crate::descriptor::{descriptor_of, FieldGet, FieldSpec, FieldType, Record};
use crate::error::{CodecError, CodecResult};
use crate::value::{MapValue, PropValue, Property, PropertyMap};
use crate::Codec;
use grove_wire::{Entity, Key, Meaning, Value};
use std::collections::HashMap;
use std::thread;

/// Accumulates wire properties into an entity under construction.
struct EntityBuilder {
    entity: Entity,
    /// Multiple flag of the first property seen under each name.
    prev_multiple: HashMap<String, bool>,
    limit: usize,
    app_id: String,
}

impl EntityBuilder {
    fn new(key: &Key, config: &CodecConfig) -> Self {
        Self {
            entity: Entity::new(key.clone()),
            prev_multiple: HashMap::new(),
            limit: config.max_indexed_properties,
            app_id: config.app_id.clone(),
        }
    }

    /// Converts one host property to wire form and places it.
    ///
    /// Nil keys are skipped silently. Every other failure is fatal.
    fn push(&mut self, property: Property) -> CodecResult<()> {
        match self.prev_multiple.get(&property.name) {
            Some(&prev) => {
                if !prev || !property.multiple {
                    return Err(CodecError::inconsistent_multiple(&property.name));
                }
            }
            None => {
                self.prev_multiple
                    .insert(property.name.clone(), property.multiple);
            }
        }

        let mut meaning = None;
        let no_index = property.no_index;
        let value = match property.value {
            PropValue::Int(n) => Value::Int64(n),
            PropValue::Bool(b) => Value::Boolean(b),
            PropValue::Text(s) => Value::Str(s.into_bytes()),
            PropValue::Double(f) => Value::Double(f),
            PropValue::Timestamp(t) => {
                meaning = Some(Meaning::Timestamp);
                Value::Int64(t.micros())
            }
            PropValue::BlobKey(s) => {
                meaning = Some(Meaning::BlobKey);
                Value::Str(s.into_bytes())
            }
            PropValue::Bytes(b) => {
                if !no_index {
                    return Err(CodecError::indexed_bytes(&property.name));
                }
                meaning = Some(Meaning::Blob);
                Value::Str(b)
            }
            PropValue::Key(None) => return Ok(()),
            PropValue::Key(Some(key)) => Value::Reference(key.to_reference(&self.app_id)),
        };

        let wire_property = grove_wire::Property {
            name: property.name,
            value: Some(value),
            meaning,
            multiple: property.multiple,
        };
        if no_index {
            self.entity.raw_properties.push(wire_property);
        } else {
            self.entity.properties.push(wire_property);
            if self.entity.properties.len() > self.limit {
                return Err(CodecError::TooManyIndexedProperties { limit: self.limit });
            }
        }
        Ok(())
    }

    fn finish(self) -> Entity {
        self.entity
    }
}

/// Pushes one record field value through the builder, applying the
/// field's indexing directive. Byte values are unindexed regardless
/// of the directive.
fn push_field(
    builder: &mut EntityBuilder,
    spec: &FieldSpec,
    value: PropValue,
    multiple: bool,
) -> CodecResult<()> {
    let no_index = spec.unindexed || matches!(value, PropValue::Bytes(_));
    builder.push(Property {
        name: spec.property_name().to_string(),
        value,
        no_index,
        multiple,
    })
}

impl Codec {
    /// Encodes a map-like source into an entity saved under `key`.
    ///
    /// Single entries become one property each; list entries become
    /// one property per element with the multiple flag set. Byte
    /// values go to the raw list, everything else is indexed.
    pub fn save_map(&self, key: &Key, map: &PropertyMap) -> CodecResult<Entity> {
        let mut builder = EntityBuilder::new(key, &self.config);
        for (name, entry) in map {
            match entry {
                MapValue::Single(value) => {
                    builder.push(Property {
                        name: name.clone(),
                        value: value.clone(),
                        no_index: matches!(value, PropValue::Bytes(_)),
                        multiple: false,
                    })?;
                }
                MapValue::List(values) => {
                    for value in values {
                        builder.push(Property {
                            name: name.clone(),
                            value: value.clone(),
                            no_index: matches!(value, PropValue::Bytes(_)),
                            multiple: true,
                        })?;
                    }
                }
            }
        }
        Ok(builder.finish())
    }

    /// Encodes a structured record into an entity saved under `key`.
    ///
    /// Fields are visited in declared order, ignored fields skipped.
    /// A repeated field with N elements yields N properties flagged
    /// multiple, nil key elements skipped. A field outside the
    /// supported value universe aborts the whole encode.
    pub fn save_record<T: Record>(&self, key: &Key, record: &T) -> CodecResult<Entity> {
        let descriptor = descriptor_of::<T>();
        let mut builder = EntityBuilder::new(key, &self.config);

        for (slot, spec) in descriptor.iter() {
            if spec.is_ignored() {
                continue;
            }
            if let FieldType::Unsupported(declared) = spec.ty {
                return Err(CodecError::unsupported_field_type(
                    descriptor.type_name(),
                    spec.property_name(),
                    declared,
                ));
            }
            match record.get(slot) {
                FieldGet::Unsupported => {
                    return Err(CodecError::unsupported_field_type(
                        descriptor.type_name(),
                        spec.property_name(),
                        spec.ty.name(),
                    ));
                }
                FieldGet::Single(value) => push_field(&mut builder, spec, value, false)?,
                FieldGet::Repeated(values) => {
                    for value in values {
                        push_field(&mut builder, spec, value, true)?;
                    }
                }
            }
        }
        Ok(builder.finish())
    }

    /// Encodes a custom streaming source into an entity saved under
    /// `key`.
    ///
    /// The source's `save` runs on the calling thread while a
    /// consumer task converts pushed properties to wire form. On a
    /// fatal conversion error the consumer drains the remainder of
    /// the queue before returning, so the source is never left
    /// parked on a full queue. The source's own error takes
    /// precedence over the consumer's.
    pub fn save_stream<S: PropertyLoadSave>(&self, key: &Key, source: &S) -> CodecResult<Entity> {
        let (sink, properties) = property_channel(self.config.stream_capacity);
        let config = &self.config;

        thread::scope(|scope| {
            let consumer = scope.spawn(move || -> CodecResult<Entity> {
                let mut builder = EntityBuilder::new(key, config);
                // An early return drops `properties`, whose drop
                // drains whatever the producer still pushes.
                for property in properties {
                    builder.push(property)?;
                }
                Ok(builder.finish())
            });

            let save_result = source.save(sink);
            let entity_result = join_scoped(consumer);
            save_result?;
            entity_result
        })
    }
}
