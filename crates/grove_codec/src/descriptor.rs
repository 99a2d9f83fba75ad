//! Per-record-type descriptors and the build-once descriptor cache.
//!
//! A [`Record`] describes its fields once, in declared order, through
//! explicit registration. The codec turns that description into an
//! immutable [`TypeDescriptor`] the first time the type is used and
//! reuses it for every later encode/decode call; construction is the
//! only write the cache ever sees.

use crate::value::PropValue;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

/// The declared type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 8-bit signed integer.
    I8,
    /// 16-bit signed integer.
    I16,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Text,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Raw bytes. Byte fields are always stored unindexed.
    Bytes,
    /// Opaque blob handle.
    BlobKey,
    /// Microseconds since the Unix epoch.
    Timestamp,
    /// Optional key reference.
    Key,
    /// A type outside the supported value universe. Carries the
    /// declared type's name for diagnostics; encoding such a field
    /// is a hard failure.
    Unsupported(&'static str),
}

impl FieldType {
    /// Returns the name used for this type in mismatch diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::I8 => "int8",
            FieldType::I16 => "int16",
            FieldType::I32 => "int32",
            FieldType::I64 => "int64",
            FieldType::Bool => "bool",
            FieldType::Text => "string",
            FieldType::F32 => "float32",
            FieldType::F64 => "float64",
            FieldType::Bytes => "[]byte",
            FieldType::BlobKey => "BlobKey",
            FieldType::Timestamp => "Time",
            FieldType::Key => "*Key",
            FieldType::Unsupported(name) => name,
        }
    }
}

/// The registration of one record field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The field's name in the record.
    pub field: &'static str,
    /// Stores the field under a different property name. A rename of
    /// `-` marks the field ignored.
    pub rename: Option<&'static str>,
    /// The field's declared type.
    pub ty: FieldType,
    /// The field holds a slice; each element becomes one property
    /// with the multiple flag set.
    pub repeated: bool,
    /// Forces the field's properties out of the index.
    pub unindexed: bool,
    /// Excludes the field from encoding and decoding entirely.
    pub ignored: bool,
}

impl FieldSpec {
    /// Creates a field registration with no annotations.
    pub fn new(field: &'static str, ty: FieldType) -> Self {
        Self {
            field,
            rename: None,
            ty,
            repeated: false,
            unindexed: false,
            ignored: false,
        }
    }

    /// Stores the field under `name` instead of its own name.
    #[must_use]
    pub fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    /// Marks the field as slice-valued.
    #[must_use]
    pub const fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Forces the field's properties out of the index.
    #[must_use]
    pub const fn unindexed(mut self) -> Self {
        self.unindexed = true;
        self
    }

    /// Excludes the field from the codec.
    #[must_use]
    pub const fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Returns the property name this field maps to.
    pub fn property_name(&self) -> &'static str {
        self.rename.unwrap_or(self.field)
    }

    /// Returns true when the field takes no part in the codec.
    pub fn is_ignored(&self) -> bool {
        self.ignored || self.rename == Some("-")
    }
}

/// A record field's value as produced for encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldGet {
    /// A scalar field: one property with the multiple flag clear.
    Single(PropValue),
    /// A slice field: one property per element, multiple flag set.
    Repeated(Vec<PropValue>),
    /// The field's runtime value cannot be expressed in the
    /// supported universe.
    Unsupported,
}

/// A structured record with a fixed, named set of typed fields.
///
/// Implementations register their fields once via [`Record::fields`]
/// (declared order, not alphabetical) and expose slot-indexed access
/// for the codec. Slots are positions in the registered field list.
///
/// # Contract
///
/// [`Record::set`] is only invoked with a value already validated
/// against the slot's declared [`FieldType`], including integer and
/// float range checks, so implementations may narrow-cast without
/// further checks. For repeated slots, `set` is called once per
/// element and must append.
pub trait Record: 'static {
    /// The record type's name, used in error reports.
    fn type_name() -> &'static str;

    /// The field registrations, in declared order.
    fn fields() -> Vec<FieldSpec>;

    /// Reads the field at `slot` for encoding.
    fn get(&self, slot: usize) -> FieldGet;

    /// Writes a decoded value into the field at `slot`.
    fn set(&mut self, slot: usize, value: PropValue);
}

/// Immutable per-type reflection metadata: property name to field
/// slot, plus the per-field directives.
#[derive(Debug)]
pub struct TypeDescriptor {
    type_name: &'static str,
    fields: Vec<FieldSpec>,
    by_name: HashMap<&'static str, usize>,
}

impl TypeDescriptor {
    fn build(type_name: &'static str, fields: Vec<FieldSpec>) -> Self {
        let mut by_name = HashMap::new();
        for (slot, spec) in fields.iter().enumerate() {
            if spec.is_ignored() {
                continue;
            }
            by_name.insert(spec.property_name(), slot);
        }
        Self {
            type_name,
            fields,
            by_name,
        }
    }

    /// Returns the record type's name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Resolves a property name to a field slot.
    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the registration of the field at `slot`.
    pub fn field(&self, slot: usize) -> &FieldSpec {
        &self.fields[slot]
    }

    /// Iterates all field registrations in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldSpec)> {
        self.fields.iter().enumerate()
    }
}

static DESCRIPTORS: LazyLock<RwLock<HashMap<TypeId, &'static TypeDescriptor>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Returns the descriptor for `T`, building it on first use.
///
/// Descriptors live for the rest of the process. Concurrent first
/// uses of the same type are serialized so exactly one build happens;
/// reads after that take only the shared lock.
pub fn descriptor_of<T: Record>() -> &'static TypeDescriptor {
    let id = TypeId::of::<T>();
    if let Some(descriptor) = DESCRIPTORS.read().get(&id).copied() {
        return descriptor;
    }

    let mut cache = DESCRIPTORS.write();
    if let Some(descriptor) = cache.get(&id).copied() {
        return descriptor;
    }
    let descriptor: &'static TypeDescriptor =
        Box::leak(Box::new(TypeDescriptor::build(T::type_name(), T::fields())));
    tracing::debug!(
        type_name = descriptor.type_name,
        fields = descriptor.fields.len(),
        "built type descriptor"
    );
    cache.insert(id, descriptor);
    descriptor
}
