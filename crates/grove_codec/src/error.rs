//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Why one property could not be loaded into one record field.
///
/// Mismatches are recoverable: the decoder records them and keeps
/// going, so a destination may be partially populated even when the
/// overall call reports an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// The property name matches no registered field.
    #[error("no such struct field")]
    NoSuchField,

    /// A multiple-valued property targeted a non-repeated field.
    #[error("multiple-valued property requires a slice field type")]
    RequiresSlice,

    /// The property's value does not assignment-convert to the field.
    #[error("type mismatch: {property} versus {field}")]
    TypeMismatch {
        /// Name of the decoded property value's type.
        property: &'static str,
        /// Name of the field's declared type.
        field: &'static str,
    },

    /// The value does not fit the field's narrower numeric type.
    #[error("value {value} overflows struct field of type {field}")]
    Overflow {
        /// The out-of-range value, rendered for diagnostics.
        value: String,
        /// Name of the field's declared type.
        field: &'static str,
    },

    /// A key-valued property carried an unusable reference.
    #[error("invalid key reference: {reason}")]
    InvalidReference {
        /// Description of what made the reference invalid.
        reason: String,
    },

    /// An untagged string property did not hold valid UTF-8.
    #[error("string property is not valid UTF-8")]
    InvalidString,
}

/// Errors that can occur while encoding or decoding entities.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    /// A stored property has no populated value variant. This is a
    /// wire-format-invariant violation: a bug in the upstream
    /// producer, never recoverable data.
    #[error("stored property {name:?} has no value")]
    MissingValue {
        /// Name of the offending property.
        name: String,
    },

    /// One or more properties could not be loaded into the
    /// destination record. Reports the last mismatch observed; the
    /// destination retains every field that did decode.
    #[error("cannot load field {field_name:?} into a {type_name:?}: {reason}")]
    FieldMismatch {
        /// Name of the destination record type.
        type_name: &'static str,
        /// Name of the last offending property.
        field_name: String,
        /// Why that property could not be loaded.
        reason: MismatchReason,
    },

    /// A property's value could not be converted during decode.
    /// Outside record destinations this is the aggregated form of a
    /// collected conversion error.
    #[error("cannot decode property {name:?}: {reason}")]
    InvalidProperty {
        /// Name of the offending property.
        name: String,
        /// Why the value could not be converted.
        reason: MismatchReason,
    },

    /// The indexed-property limit was exceeded during encode.
    #[error("too many indexed properties (limit {limit})")]
    TooManyIndexedProperties {
        /// The configured limit.
        limit: usize,
    },

    /// Two same-named properties disagreed on the multiple flag.
    #[error("multiple properties with name {name:?}, but multiple is false")]
    InconsistentMultiple {
        /// The repeated property name.
        name: String,
    },

    /// A byte-valued property was flagged for indexing.
    #[error("cannot index a byte-valued property with name {name:?}")]
    IndexedBytes {
        /// Name of the offending property.
        name: String,
    },

    /// A record field's type is outside the supported value universe.
    #[error("cannot store field {field:?} from a {type_name:?}: unsupported field type {declared}")]
    UnsupportedFieldType {
        /// Name of the source record type.
        type_name: &'static str,
        /// Name of the offending field.
        field: String,
        /// The declared type that is not supported.
        declared: &'static str,
    },

    /// The property channel closed before the producer finished.
    #[error("property channel closed")]
    ChannelClosed,
}

impl CodecError {
    /// Create a wire-invariant violation error for `name`.
    pub fn missing_value(name: impl Into<String>) -> Self {
        Self::MissingValue { name: name.into() }
    }

    /// Create an aggregated field mismatch error.
    pub fn field_mismatch(
        type_name: &'static str,
        field_name: impl Into<String>,
        reason: MismatchReason,
    ) -> Self {
        Self::FieldMismatch {
            type_name,
            field_name: field_name.into(),
            reason,
        }
    }

    /// Create an invalid property error.
    pub fn invalid_property(name: impl Into<String>, reason: MismatchReason) -> Self {
        Self::InvalidProperty {
            name: name.into(),
            reason,
        }
    }

    /// Create a multiplicity consistency error for `name`.
    pub fn inconsistent_multiple(name: impl Into<String>) -> Self {
        Self::InconsistentMultiple { name: name.into() }
    }

    /// Create an indexed-bytes error for `name`.
    pub fn indexed_bytes(name: impl Into<String>) -> Self {
        Self::IndexedBytes { name: name.into() }
    }

    /// Create an unsupported field type error.
    pub fn unsupported_field_type(
        type_name: &'static str,
        field: impl Into<String>,
        declared: &'static str,
    ) -> Self {
        Self::UnsupportedFieldType {
            type_name,
            field: field.into(),
            declared,
        }
    }
}
