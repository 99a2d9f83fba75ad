//! End-to-end encode/decode behavior across all three host value
//! kinds.

use grove_codec::{
    Codec, CodecConfig, CodecError, FieldGet, FieldSpec, FieldType, MapValue, MismatchReason,
    PropValue, Property, PropertyLoadSave, PropertyMap, PropertySink, PropertySource, Record,
    Timestamp,
};
use grove_wire::{Key, KeyId, Meaning, Value};
use proptest::prelude::*;

fn item_key() -> Key {
    Key::new("app", "Profile", KeyId::Id(7))
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Profile {
    name: String,
    age: i32,
    score: f64,
    active: bool,
    tags: Vec<String>,
    avatar: Vec<u8>,
    manager: Option<Key>,
    joined: Timestamp,
}

impl Record for Profile {
    fn type_name() -> &'static str {
        "Profile"
    }

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("Name", FieldType::Text),
            FieldSpec::new("Age", FieldType::I32),
            FieldSpec::new("Score", FieldType::F64),
            FieldSpec::new("Active", FieldType::Bool),
            FieldSpec::new("Tags", FieldType::Text).repeated(),
            FieldSpec::new("Avatar", FieldType::Bytes),
            FieldSpec::new("Manager", FieldType::Key),
            FieldSpec::new("Joined", FieldType::Timestamp),
        ]
    }

    fn get(&self, slot: usize) -> FieldGet {
        match slot {
            0 => FieldGet::Single(PropValue::Text(self.name.clone())),
            1 => FieldGet::Single(PropValue::Int(i64::from(self.age))),
            2 => FieldGet::Single(PropValue::Double(self.score)),
            3 => FieldGet::Single(PropValue::Bool(self.active)),
            4 => FieldGet::Repeated(self.tags.iter().cloned().map(PropValue::Text).collect()),
            5 => FieldGet::Single(PropValue::Bytes(self.avatar.clone())),
            6 => FieldGet::Single(PropValue::Key(self.manager.clone())),
            7 => FieldGet::Single(PropValue::Timestamp(self.joined)),
            _ => unreachable!(),
        }
    }

    fn set(&mut self, slot: usize, value: PropValue) {
        match (slot, value) {
            (0, PropValue::Text(s)) => self.name = s,
            (1, PropValue::Int(n)) => self.age = n as i32,
            (2, PropValue::Double(f)) => self.score = f,
            (3, PropValue::Bool(b)) => self.active = b,
            (4, PropValue::Text(s)) => self.tags.push(s),
            (5, PropValue::Bytes(b)) => self.avatar = b,
            (6, PropValue::Key(k)) => self.manager = k,
            (7, PropValue::Timestamp(t)) => self.joined = t,
            _ => unreachable!(),
        }
    }
}

fn sample_profile() -> Profile {
    Profile {
        name: "Alice".into(),
        age: 34,
        score: 9.25,
        active: true,
        tags: vec!["a".into(), "b".into(), "c".into()],
        avatar: vec![0xde, 0xad, 0xbe, 0xef],
        manager: Some(Key::new("app", "Profile", KeyId::Name("bob".into()))),
        joined: Timestamp::from_micros(1_600_000_000_000_000),
    }
}

#[test]
fn record_roundtrip_is_field_for_field() {
    let codec = Codec::default();
    let original = sample_profile();

    let entity = codec.save_record(&item_key(), &original).unwrap();
    let mut restored = Profile::default();
    codec.load_record(&mut restored, &entity).unwrap();

    assert_eq!(restored, original);
}

#[test]
fn repeated_field_yields_one_property_per_element() {
    let codec = Codec::default();
    let entity = codec.save_record(&item_key(), &sample_profile()).unwrap();

    let tags: Vec<_> = entity
        .properties
        .iter()
        .filter(|p| p.name == "Tags")
        .collect();
    assert_eq!(tags.len(), 3);
    assert!(tags.iter().all(|p| p.multiple));
    let order: Vec<_> = tags.iter().map(|p| p.value.clone()).collect();
    assert_eq!(
        order,
        vec![
            Some(Value::Str(b"a".to_vec())),
            Some(Value::Str(b"b".to_vec())),
            Some(Value::Str(b"c".to_vec())),
        ]
    );
}

#[test]
fn byte_fields_are_raw_and_tagged() {
    let codec = Codec::default();
    let entity = codec.save_record(&item_key(), &sample_profile()).unwrap();

    assert!(entity.properties.iter().all(|p| p.name != "Avatar"));
    let avatar = entity
        .raw_properties
        .iter()
        .find(|p| p.name == "Avatar")
        .unwrap();
    assert_eq!(avatar.meaning, Some(Meaning::Blob));
    assert_eq!(avatar.value, Some(Value::Str(vec![0xde, 0xad, 0xbe, 0xef])));
}

#[test]
fn nil_key_field_is_omitted_without_error() {
    let codec = Codec::default();
    let mut profile = sample_profile();
    profile.manager = None;

    let entity = codec.save_record(&item_key(), &profile).unwrap();
    assert!(entity.iter_all().all(|(p, _)| p.name != "Manager"));

    let mut restored = Profile::default();
    codec.load_record(&mut restored, &entity).unwrap();
    assert_eq!(restored.manager, None);
}

#[test]
fn indexed_limit_fails_record_encode() {
    let codec = Codec::new(CodecConfig::new().max_indexed_properties(2));
    let err = codec
        .save_record(&item_key(), &sample_profile())
        .unwrap_err();
    assert_eq!(err, CodecError::TooManyIndexedProperties { limit: 2 });
}

#[test]
fn unsupported_field_type_aborts_encode() {
    #[derive(Default)]
    struct Odd {
        #[allow(dead_code)]
        weird: (),
    }
    impl Record for Odd {
        fn type_name() -> &'static str {
            "Odd"
        }
        fn fields() -> Vec<FieldSpec> {
            vec![FieldSpec::new("Weird", FieldType::Unsupported("()"))]
        }
        fn get(&self, _slot: usize) -> FieldGet {
            FieldGet::Unsupported
        }
        fn set(&mut self, _slot: usize, _value: PropValue) {}
    }

    let err = Codec::default()
        .save_record(&item_key(), &Odd::default())
        .unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedFieldType { .. }));
}

#[test]
fn partial_decode_reports_one_aggregated_error() {
    let codec = Codec::default();
    let mut entity = codec.save_record(&item_key(), &sample_profile()).unwrap();
    entity.properties.push(grove_wire::Property {
        name: "Unknown".into(),
        value: Some(Value::Int64(5)),
        meaning: None,
        multiple: false,
    });

    let mut restored = Profile::default();
    let err = codec.load_record(&mut restored, &entity).unwrap_err();

    assert_eq!(
        err,
        CodecError::FieldMismatch {
            type_name: "Profile",
            field_name: "Unknown".into(),
            reason: MismatchReason::NoSuchField,
        }
    );
    // Everything that did match decoded anyway.
    assert_eq!(restored, sample_profile());
}

/// The concrete scenario from the wire contract: Name/Tags/Tags in,
/// same three properties out.
#[test]
fn alice_tags_scenario() {
    #[derive(Debug, Default, PartialEq)]
    struct Doc {
        name: String,
        tags: Vec<String>,
    }
    impl Record for Doc {
        fn type_name() -> &'static str {
            "Doc"
        }
        fn fields() -> Vec<FieldSpec> {
            vec![
                FieldSpec::new("Name", FieldType::Text),
                FieldSpec::new("Tags", FieldType::Text).repeated(),
            ]
        }
        fn get(&self, slot: usize) -> FieldGet {
            match slot {
                0 => FieldGet::Single(PropValue::Text(self.name.clone())),
                1 => FieldGet::Repeated(self.tags.iter().cloned().map(PropValue::Text).collect()),
                _ => unreachable!(),
            }
        }
        fn set(&mut self, slot: usize, value: PropValue) {
            match (slot, value) {
                (0, PropValue::Text(s)) => self.name = s,
                (1, PropValue::Text(s)) => self.tags.push(s),
                _ => unreachable!(),
            }
        }
    }

    let wire_props = vec![
        grove_wire::Property {
            name: "Name".into(),
            value: Some(Value::Str(b"Alice".to_vec())),
            meaning: None,
            multiple: false,
        },
        grove_wire::Property {
            name: "Tags".into(),
            value: Some(Value::Str(b"a".to_vec())),
            meaning: None,
            multiple: true,
        },
        grove_wire::Property {
            name: "Tags".into(),
            value: Some(Value::Str(b"b".to_vec())),
            meaning: None,
            multiple: true,
        },
    ];

    let codec = Codec::default();
    let key = Key::new("app", "Doc", KeyId::Id(1));
    let mut entity = grove_wire::Entity::new(key.clone());
    entity.properties = wire_props.clone();

    let mut doc = Doc::default();
    codec.load_record(&mut doc, &entity).unwrap();
    assert_eq!(doc.name, "Alice");
    assert_eq!(doc.tags, vec!["a".to_string(), "b".to_string()]);

    let reencoded = codec.save_record(&key, &doc).unwrap();
    assert_eq!(reencoded.properties, wire_props);
    assert!(reencoded.raw_properties.is_empty());
}

struct TwoFlagSource;

impl PropertyLoadSave for TwoFlagSource {
    fn load(&mut self, _properties: PropertySource) -> grove_codec::CodecResult<()> {
        Ok(())
    }

    fn save(&self, out: PropertySink) -> grove_codec::CodecResult<()> {
        out.send(Property {
            name: "t".into(),
            value: PropValue::Text("a".into()),
            no_index: false,
            multiple: true,
        })?;
        out.send(Property {
            name: "t".into(),
            value: PropValue::Text("b".into()),
            no_index: false,
            multiple: false,
        })?;
        Ok(())
    }
}

#[test]
fn inconsistent_multiple_fails_stream_encode() {
    let err = Codec::default()
        .save_stream(&item_key(), &TwoFlagSource)
        .unwrap_err();
    assert_eq!(
        err,
        CodecError::InconsistentMultiple { name: "t".into() }
    );
}

#[test]
fn map_roundtrip_preserves_entries() {
    let codec = Codec::default();
    let mut map = PropertyMap::new();
    map.insert("n".into(), MapValue::Single(PropValue::Int(5)));
    map.insert("s".into(), MapValue::Single(PropValue::Text("x".into())));
    map.insert(
        "tags".into(),
        MapValue::List(vec![PropValue::Text("a".into()), PropValue::Text("b".into())]),
    );
    map.insert(
        "blob".into(),
        MapValue::Single(PropValue::Bytes(vec![1, 2, 3])),
    );

    let entity = codec.save_map(&item_key(), &map).unwrap();
    let mut restored = PropertyMap::new();
    codec.load_map(&mut restored, &entity).unwrap();

    assert_eq!(restored, map);
}

fn map_value_strategy() -> impl Strategy<Value = MapValue> {
    let scalar = prop_oneof![
        any::<i64>().prop_map(PropValue::Int),
        any::<bool>().prop_map(PropValue::Bool),
        "[a-z]{0,12}".prop_map(PropValue::Text),
        (-1.0e9..1.0e9f64).prop_map(PropValue::Double),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(PropValue::Bytes),
    ];
    prop_oneof![
        scalar.prop_map(MapValue::Single),
        proptest::collection::vec("[a-z]{0,8}".prop_map(PropValue::Text), 1..4)
            .prop_map(MapValue::List),
    ]
}

proptest! {
    #[test]
    fn map_roundtrip_holds_for_arbitrary_maps(
        entries in proptest::collection::btree_map("[A-Za-z][A-Za-z0-9]{0,10}", map_value_strategy(), 0..12)
    ) {
        let codec = Codec::default();
        let map: PropertyMap = entries;

        let entity = codec.save_map(&item_key(), &map).unwrap();
        let mut restored = PropertyMap::new();
        codec.load_map(&mut restored, &entity).unwrap();

        prop_assert_eq!(restored, map);
    }
}
