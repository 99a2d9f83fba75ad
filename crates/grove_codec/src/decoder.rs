//! Entity decoding into the three destination kinds.
//!
//! Decoding is best-effort: per-property conversion and field
//! mismatches are collected while the loop keeps going, and one
//! aggregated error is reported after every property has been
//! processed. Everything that did decode stays in the destination.
//! Only a wire-format-invariant violation (a property with no
//! populated value variant) aborts outright.

use crate::bridge::{join_scoped, property_channel, PropertyLoadSave};
use crate::descriptor::{descriptor_of, FieldType, Record, TypeDescriptor};
use crate::error::{CodecError, CodecResult, MismatchReason};
use crate::value::{MapValue, PropValue, Property, PropertyMap, Timestamp};
use crate::Codec;
use grove_wire::{Entity, Key, Meaning, Value};
use std::thread;

/// How decoding one wire property failed.
enum PropertyError {
    /// No value variant was populated: a wire-invariant violation.
    Missing,
    /// The populated variant could not be converted to a host value.
    Convert(MismatchReason),
}

/// Converts one wire property into a host value, applying the
/// meaning tag to refine the decoded type.
fn decode_value(property: &grove_wire::Property) -> Result<PropValue, PropertyError> {
    let value = property.value.as_ref().ok_or(PropertyError::Missing)?;
    let decoded = match value {
        Value::Int64(n) => match property.meaning {
            Some(Meaning::Timestamp) => PropValue::Timestamp(Timestamp::from_micros(*n)),
            _ => PropValue::Int(*n),
        },
        Value::Boolean(b) => PropValue::Bool(*b),
        Value::Str(bytes) => match property.meaning {
            Some(Meaning::Blob) => PropValue::Bytes(bytes.clone()),
            Some(Meaning::BlobKey) => PropValue::BlobKey(
                String::from_utf8(bytes.clone())
                    .map_err(|_| PropertyError::Convert(MismatchReason::InvalidString))?,
            ),
            _ => PropValue::Text(
                String::from_utf8(bytes.clone())
                    .map_err(|_| PropertyError::Convert(MismatchReason::InvalidString))?,
            ),
        },
        Value::Double(f) => PropValue::Double(*f),
        Value::Reference(reference) => {
            let key = Key::from_reference(reference).map_err(|e| {
                PropertyError::Convert(MismatchReason::InvalidReference {
                    reason: e.to_string(),
                })
            })?;
            PropValue::Key(Some(key))
        }
    };
    Ok(decoded)
}

/// Coerces a decoded value to a field's declared type, checking
/// numeric range for narrower fields. On success the returned value's
/// variant matches the declared type exactly, so record `set`
/// implementations can narrow-cast without re-checking.
fn coerce(ty: FieldType, value: PropValue) -> Result<PropValue, MismatchReason> {
    fn mismatch(value: &PropValue, ty: FieldType) -> MismatchReason {
        MismatchReason::TypeMismatch {
            property: value.type_name(),
            field: ty.name(),
        }
    }

    fn narrow(value: PropValue, ty: FieldType, min: i64, max: i64) -> Result<PropValue, MismatchReason> {
        match value {
            PropValue::Int(n) if (min..=max).contains(&n) => Ok(PropValue::Int(n)),
            PropValue::Int(n) => Err(MismatchReason::Overflow {
                value: n.to_string(),
                field: ty.name(),
            }),
            other => Err(mismatch(&other, ty)),
        }
    }

    match ty {
        FieldType::I8 => narrow(value, ty, i64::from(i8::MIN), i64::from(i8::MAX)),
        FieldType::I16 => narrow(value, ty, i64::from(i16::MIN), i64::from(i16::MAX)),
        FieldType::I32 => narrow(value, ty, i64::from(i32::MIN), i64::from(i32::MAX)),
        FieldType::I64 => match value {
            PropValue::Int(n) => Ok(PropValue::Int(n)),
            PropValue::Timestamp(t) => Ok(PropValue::Int(t.micros())),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::Timestamp => match value {
            PropValue::Timestamp(t) => Ok(PropValue::Timestamp(t)),
            PropValue::Int(n) => Ok(PropValue::Timestamp(Timestamp::from_micros(n))),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::Bool => match value {
            PropValue::Bool(b) => Ok(PropValue::Bool(b)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::Text => match value {
            PropValue::Text(s) => Ok(PropValue::Text(s)),
            PropValue::BlobKey(s) => Ok(PropValue::Text(s)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::BlobKey => match value {
            PropValue::BlobKey(s) => Ok(PropValue::BlobKey(s)),
            PropValue::Text(s) => Ok(PropValue::BlobKey(s)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::F64 => match value {
            PropValue::Double(f) => Ok(PropValue::Double(f)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::F32 => match value {
            PropValue::Double(f) if f.is_finite() && f.abs() > f64::from(f32::MAX) => {
                Err(MismatchReason::Overflow {
                    value: f.to_string(),
                    field: ty.name(),
                })
            }
            PropValue::Double(f) => Ok(PropValue::Double(f)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::Bytes => match value {
            PropValue::Bytes(b) => Ok(PropValue::Bytes(b)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::Key => match value {
            PropValue::Key(k) => Ok(PropValue::Key(k)),
            other => Err(mismatch(&other, ty)),
        },
        FieldType::Unsupported(_) => Err(mismatch(&value, ty)),
    }
}

/// Loads one decoded property into a record field.
fn load_record_field<T: Record>(
    descriptor: &TypeDescriptor,
    dst: &mut T,
    name: &str,
    value: PropValue,
    multiple: bool,
) -> Result<(), MismatchReason> {
    let slot = descriptor.slot_of(name).ok_or(MismatchReason::NoSuchField)?;
    let spec = descriptor.field(slot);
    if multiple && !spec.repeated {
        return Err(MismatchReason::RequiresSlice);
    }
    let value = coerce(spec.ty, value)?;
    dst.set(slot, value);
    Ok(())
}

impl Codec {
    /// Decodes an entity into a map-like destination.
    ///
    /// Properties are visited in source order, indexed first then
    /// raw. A multiple-flagged property appends to a list entry
    /// created on first sight; a single-valued property overwrites
    /// (last write wins on duplicate names). Conversion errors are
    /// collected and reported once after the loop; entries that did
    /// decode stay in the destination.
    pub fn load_map(&self, dst: &mut PropertyMap, entity: &Entity) -> CodecResult<()> {
        let mut last: Option<(String, MismatchReason)> = None;

        for (property, _raw) in entity.iter_all() {
            let value = match decode_value(property) {
                Ok(value) => value,
                Err(PropertyError::Missing) => {
                    return Err(CodecError::missing_value(&property.name));
                }
                Err(PropertyError::Convert(reason)) => {
                    last = Some((property.name.clone(), reason));
                    continue;
                }
            };

            if property.multiple {
                let entry = dst
                    .entry(property.name.clone())
                    .or_insert_with(|| MapValue::List(Vec::new()));
                if !matches!(entry, MapValue::List(_)) {
                    *entry = MapValue::List(Vec::new());
                }
                if let MapValue::List(items) = entry {
                    // The first-seen element fixes the list's type.
                    if let Some(first) = items.first() {
                        if std::mem::discriminant(first) != std::mem::discriminant(&value) {
                            last = Some((
                                property.name.clone(),
                                MismatchReason::TypeMismatch {
                                    property: value.type_name(),
                                    field: first.type_name(),
                                },
                            ));
                            continue;
                        }
                    }
                    items.push(value);
                }
            } else {
                dst.insert(property.name.clone(), MapValue::Single(value));
            }
        }

        match last {
            Some((name, reason)) => Err(CodecError::invalid_property(name, reason)),
            None => Ok(()),
        }
    }

    /// Decodes an entity into a structured record.
    ///
    /// Field resolution goes through the cached type descriptor.
    /// Mismatches never abort the loop; after all properties are
    /// processed, one aggregated error names the record type, the
    /// last offending property, and its reason. Fields that did
    /// decode remain populated either way.
    pub fn load_record<T: Record>(&self, dst: &mut T, entity: &Entity) -> CodecResult<()> {
        let descriptor = descriptor_of::<T>();
        let mut last: Option<(String, MismatchReason)> = None;

        for (property, _raw) in entity.iter_all() {
            let value = match decode_value(property) {
                Ok(value) => value,
                Err(PropertyError::Missing) => {
                    return Err(CodecError::missing_value(&property.name));
                }
                Err(PropertyError::Convert(reason)) => {
                    last = Some((property.name.clone(), reason));
                    continue;
                }
            };
            if let Err(reason) =
                load_record_field(descriptor, dst, &property.name, value, property.multiple)
            {
                last = Some((property.name.clone(), reason));
            }
        }

        match last {
            Some((field_name, reason)) => {
                tracing::debug!(
                    type_name = descriptor.type_name(),
                    field = field_name.as_str(),
                    %reason,
                    "partial decode"
                );
                Err(CodecError::field_mismatch(
                    descriptor.type_name(),
                    field_name,
                    reason,
                ))
            }
            None => Ok(()),
        }
    }

    /// Decodes an entity into a custom streaming destination.
    ///
    /// A producer task converts wire properties in source order and
    /// pushes them over the bounded bridge; the destination's `load`
    /// runs on the calling thread. The destination may stop early
    /// without stranding the producer. The producer's error is
    /// surfaced only after it completes, and only when `load` itself
    /// succeeded.
    pub fn load_stream<L: PropertyLoadSave>(&self, dst: &mut L, entity: &Entity) -> CodecResult<()> {
        let (sink, source) = property_channel(self.config.stream_capacity);

        thread::scope(|scope| {
            let producer = scope.spawn(move || -> CodecResult<()> {
                for (property, raw) in entity.iter_all() {
                    let value = match decode_value(property) {
                        Ok(value) => value,
                        Err(PropertyError::Missing) => {
                            return Err(CodecError::missing_value(&property.name));
                        }
                        Err(PropertyError::Convert(reason)) => {
                            return Err(CodecError::invalid_property(&property.name, reason));
                        }
                    };
                    let host = Property {
                        name: property.name.clone(),
                        value,
                        no_index: raw,
                        multiple: property.multiple,
                    };
                    if sink.send(host).is_err() {
                        // Consumer torn down entirely; nothing left
                        // to deliver.
                        return Ok(());
                    }
                }
                Ok(())
            });

            let load_result = dst.load(source);
            let producer_result = join_scoped(producer);
            load_result?;
            producer_result
        })
    }
}
