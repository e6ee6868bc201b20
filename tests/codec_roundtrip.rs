use std::collections::BTreeMap;

use chrono::NaiveDate;
use stowage::datatype::{Blob, EncodingTier, Storable, StoredValue, Structured, tier_of};
use stowage::schema::TypeTag;

fn roundtrip<T: Storable + PartialEq + std::fmt::Debug>(value: T) {
    let stored = value.to_stored();
    assert_eq!(T::from_stored(&stored), Some(value));
}

#[test]
fn native_scalars_roundtrip() {
    roundtrip(true);
    roundtrip(false);
    roundtrip(0i64);
    roundtrip(-42i64);
    roundtrip(3.25f64);
    roundtrip(1.5f32);
    roundtrip(String::from("hello"));
    roundtrip(String::new());
    roundtrip(Blob(vec![0u8, 1, 255]));
    roundtrip(NaiveDate::from_ymd_opt(2024, 7, 6).unwrap());
    roundtrip(
        NaiveDate::from_ymd_opt(2024, 12, 11)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    );
}

#[test]
fn native_collections_roundtrip() {
    roundtrip(vec![1i64, 2, 3]);
    roundtrip(vec![String::from("a"), String::from("b")]);
    let mut map = BTreeMap::new();
    map.insert("name".to_owned(), "ada".to_owned());
    map.insert("color".to_owned(), "teal".to_owned());
    roundtrip(map);
    // nesting keeps working as long as the elements do
    roundtrip(vec![vec![1i64], vec![2, 3]]);
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Profile {
    name: String,
    age: u8,
    tags: Vec<String>,
}

#[test]
fn structured_values_roundtrip() {
    let profile = Structured(Profile {
        name: "ada".to_owned(),
        age: 36,
        tags: vec!["math".to_owned(), "engines".to_owned()],
    });
    let stored = profile.to_stored();
    assert!(matches!(stored, StoredValue::Encoded(_)));
    assert_eq!(Storable::from_stored(&stored), Some(profile));
}

#[test]
fn decode_of_wrong_shape_is_none() {
    assert_eq!(bool::from_stored(&StoredValue::Integer(1)), None);
    assert_eq!(i64::from_stored(&StoredValue::Text("7".to_owned())), None);
    assert_eq!(String::from_stored(&StoredValue::Boolean(true)), None);
    assert_eq!(
        Vec::<i64>::from_stored(&StoredValue::List(vec![StoredValue::Text("x".to_owned())])),
        None,
        "one element of the wrong shape sinks the collection"
    );
    assert_eq!(
        <Structured<Profile> as Storable>::from_stored(&StoredValue::Encoded(b"not json".to_vec())),
        None
    );
}

#[test]
fn unencodable_structured_value_falls_back_on_decode() {
    // JSON cannot represent non-string map keys, so encoding produces an
    // empty payload that never decodes back.
    let awkward: Structured<BTreeMap<(u8, u8), i64>> =
        Structured(BTreeMap::from([((1, 2), 3)]));
    let stored = awkward.to_stored();
    assert_eq!(stored, StoredValue::Encoded(Vec::new()));
    assert_eq!(
        <Structured<BTreeMap<(u8, u8), i64>> as Storable>::from_stored(&stored),
        None
    );
}

#[test]
fn tier_follows_the_declared_type() {
    assert_eq!(tier_of(&TypeTag::Boolean), EncodingTier::Native);
    assert_eq!(tier_of(&TypeTag::Integer), EncodingTier::Native);
    assert_eq!(tier_of(&TypeTag::Float), EncodingTier::Native);
    assert_eq!(tier_of(&TypeTag::Text), EncodingTier::Native);
    assert_eq!(tier_of(&TypeTag::Blob), EncodingTier::Native);
    assert_eq!(tier_of(&TypeTag::Date), EncodingTier::Native);
    assert_eq!(tier_of(&TypeTag::Timestamp), EncodingTier::Native);
    assert_eq!(
        tier_of(&TypeTag::List(Box::new(TypeTag::Integer))),
        EncodingTier::Native
    );
    assert_eq!(
        tier_of(&TypeTag::Map(Box::new(TypeTag::Text))),
        EncodingTier::Native
    );
    assert_eq!(tier_of(&TypeTag::Structured), EncodingTier::Structured);
    // a collection of structured values is itself structured
    assert_eq!(
        tier_of(&TypeTag::List(Box::new(TypeTag::Structured))),
        EncodingTier::Structured
    );
}

#[test]
fn stored_value_identifiers_are_stable() {
    assert_eq!(StoredValue::Boolean(true).uid(), 1);
    assert_eq!(StoredValue::Boolean(true).data_type(), "Boolean");
    assert_eq!(StoredValue::Encoded(Vec::new()).uid(), 10);
    assert_eq!(StoredValue::Encoded(Vec::new()).data_type(), "Encoded");
}
