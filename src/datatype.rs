// used for timestamps among the natively storable types
use chrono::{NaiveDate, NaiveDateTime};
// used for the structured encoding tier
use serde::Serialize;
use serde::de::DeserializeOwned;
// used for ordered mappings in the native tier
use std::collections::BTreeMap;
// used to let the blob wrapper read as a byte vector
use std::ops;

use crate::schema::TypeTag;

// ------------- StoredRepresentation -------------
/// The backend-native representation of a stored value.
///
/// Scalar and collection variants make up the native tier; `Encoded` holds
/// the opaque byte payload of the structured tier. How a backend maps these
/// onto its own columns or records is its business and invisible up here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StoredValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    List(Vec<StoredValue>),
    Map(BTreeMap<String, StoredValue>),
    Encoded(Vec<u8>),
}

impl StoredValue {
    /// Stable identifier for the value's shape, used by backends that keep
    /// a data type dimension alongside the entries.
    pub fn uid(&self) -> u8 {
        match self {
            StoredValue::Boolean(_) => 1,
            StoredValue::Integer(_) => 2,
            StoredValue::Float(_) => 3,
            StoredValue::Text(_) => 4,
            StoredValue::Blob(_) => 5,
            StoredValue::Date(_) => 6,
            StoredValue::Timestamp(_) => 7,
            StoredValue::List(_) => 8,
            StoredValue::Map(_) => 9,
            StoredValue::Encoded(_) => 10,
        }
    }
    pub fn data_type(&self) -> &'static str {
        match self {
            StoredValue::Boolean(_) => "Boolean",
            StoredValue::Integer(_) => "Integer",
            StoredValue::Float(_) => "Float",
            StoredValue::Text(_) => "Text",
            StoredValue::Blob(_) => "Blob",
            StoredValue::Date(_) => "Date",
            StoredValue::Timestamp(_) => "Timestamp",
            StoredValue::List(_) => "List",
            StoredValue::Map(_) => "Map",
            StoredValue::Encoded(_) => "Encoded",
        }
    }
}

// ------------- Encoding tiers -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingTier {
    /// Written directly in the backend's native representation.
    Native,
    /// Serialized to a self-describing byte payload before writing.
    Structured,
}

/// Decides, for a declared type, which encoding tier its values take.
/// Collections stay native only as long as their element type does.
pub fn tier_of(tag: &TypeTag) -> EncodingTier {
    match tag {
        TypeTag::Boolean
        | TypeTag::Integer
        | TypeTag::Float
        | TypeTag::Text
        | TypeTag::Blob
        | TypeTag::Date
        | TypeTag::Timestamp => EncodingTier::Native,
        TypeTag::List(inner) | TypeTag::Map(inner) => tier_of(inner),
        TypeTag::Structured => EncodingTier::Structured,
    }
}

// ------------- Storable -------------
/// A type whose values can travel through the store.
///
/// `to_stored` never fails and `from_stored` never raises: a missing entry,
/// a wrong variant or a malformed payload all come back as `None`, and the
/// caller supplies the fallback.
pub trait Storable: Clone {
    const DATA_TYPE: &'static str;
    fn type_tag() -> TypeTag;
    fn to_stored(&self) -> StoredValue;
    fn from_stored(value: &StoredValue) -> Option<Self>;
}

// ------------- Native tier --------------
impl Storable for bool {
    const DATA_TYPE: &'static str = "bool";
    fn type_tag() -> TypeTag {
        TypeTag::Boolean
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Boolean(*self)
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}
impl Storable for i64 {
    const DATA_TYPE: &'static str = "i64";
    fn type_tag() -> TypeTag {
        TypeTag::Integer
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Integer(*self)
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}
impl Storable for f64 {
    const DATA_TYPE: &'static str = "f64";
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Float(*self)
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}
impl Storable for f32 {
    const DATA_TYPE: &'static str = "f32";
    fn type_tag() -> TypeTag {
        TypeTag::Float
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Float(f64::from(*self))
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Float(f) => Some(*f as f32),
            _ => None,
        }
    }
}
impl Storable for String {
    const DATA_TYPE: &'static str = "String";
    fn type_tag() -> TypeTag {
        TypeTag::Text
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Text(self.clone())
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}
impl Storable for Blob {
    const DATA_TYPE: &'static str = "Blob";
    fn type_tag() -> TypeTag {
        TypeTag::Blob
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Blob(self.0.clone())
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Blob(b) => Some(Blob(b.clone())),
            _ => None,
        }
    }
}
impl Storable for NaiveDate {
    const DATA_TYPE: &'static str = "NaiveDate";
    fn type_tag() -> TypeTag {
        TypeTag::Date
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Date(*self)
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}
impl Storable for NaiveDateTime {
    const DATA_TYPE: &'static str = "NaiveDateTime";
    fn type_tag() -> TypeTag {
        TypeTag::Timestamp
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Timestamp(*self)
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

// Collections stay in the native tier as long as every element does; a
// single element that fails to convert sinks the whole collection to None.
impl<T: Storable> Storable for Vec<T> {
    const DATA_TYPE: &'static str = "List";
    fn type_tag() -> TypeTag {
        TypeTag::List(Box::new(T::type_tag()))
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::List(self.iter().map(Storable::to_stored).collect())
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::List(items) => items.iter().map(T::from_stored).collect(),
            _ => None,
        }
    }
}
impl<T: Storable> Storable for BTreeMap<String, T> {
    const DATA_TYPE: &'static str = "Map";
    fn type_tag() -> TypeTag {
        TypeTag::Map(Box::new(T::type_tag()))
    }
    fn to_stored(&self) -> StoredValue {
        StoredValue::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_stored()))
                .collect(),
        )
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| T::from_stored(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => None,
        }
    }
}

// Special types below
/// An opaque byte value. Distinct from `Vec<u8>` so that byte payloads and
/// sequences of storable elements cannot be confused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blob(pub Vec<u8>);

impl ops::Deref for Blob {
    type Target = Vec<u8>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl ops::DerefMut for Blob {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

// ------------- Structured tier --------------
/// Wrapper routing a value through the structured encoding tier.
///
/// Anything serde can round-trip is accepted. A value that cannot encode
/// stores an empty payload, which later fails to decode and so yields the
/// caller's fallback instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T>(pub T);

impl<T> Storable for Structured<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    const DATA_TYPE: &'static str = "Structured";
    fn type_tag() -> TypeTag {
        TypeTag::Structured
    }
    fn to_stored(&self) -> StoredValue {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => StoredValue::Encoded(bytes),
            Err(_) => StoredValue::Encoded(Vec::new()),
        }
    }
    fn from_stored(value: &StoredValue) -> Option<Self> {
        match value {
            StoredValue::Encoded(bytes) => serde_json::from_slice(bytes).ok().map(Structured),
            _ => None,
        }
    }
}
