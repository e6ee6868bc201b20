// used to print out readable forms of the schema constructs
use std::fmt;

// ------------- TypeTag -------------
/// The declared type of a property, as handed over by the host environment.
///
/// The tag is what the value codec consults when it picks an encoding tier,
/// see [`crate::datatype::tier_of`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Boolean,
    Integer,
    Float,
    Text,
    Blob,
    Date,
    Timestamp,
    /// Homogeneous sequence of the inner type.
    List(Box<TypeTag>),
    /// String-keyed mapping onto the inner type.
    Map(Box<TypeTag>),
    /// Anything else; routed through the structured encoding tier.
    Structured,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeTag::Boolean => write!(f, "Boolean"),
            TypeTag::Integer => write!(f, "Integer"),
            TypeTag::Float => write!(f, "Float"),
            TypeTag::Text => write!(f, "Text"),
            TypeTag::Blob => write!(f, "Blob"),
            TypeTag::Date => write!(f, "Date"),
            TypeTag::Timestamp => write!(f, "Timestamp"),
            TypeTag::List(inner) => write!(f, "List<{}>", inner),
            TypeTag::Map(inner) => write!(f, "Map<{}>", inner),
            TypeTag::Structured => write!(f, "Structured"),
        }
    }
}

// ------------- Modifier -------------
/// A persistence/observation annotation on a declared property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Overrides the storage key; the key is used verbatim, with no
    /// class-name prefix.
    CustomKey(String),
    /// Disables persistence. The property keeps in-memory mutability and
    /// still participates in notification.
    Transient,
    /// Disables both persistence and notification.
    Ignored,
}

// ------------- Mutability -------------
/// Storage characteristics of the declaration. Only `Mutable` properties
/// are transformed; constants and author-written accessors are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    Constant,
    Computed,
}

// ------------- ClassKind -------------
/// What kind of type the enclosing declaration is. Only `Class` can hold
/// the mutable per-instance storage the transformation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    ValueType,
    Actor,
}

// ------------- StoreConfig -------------
/// Which key-value namespace a property reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreConfig {
    /// The single namespace shared by the whole process.
    Default,
    /// An isolated namespace identified by name.
    NamedSuite(String),
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreConfig::Default => write!(f, "default"),
            StoreConfig::NamedSuite(name) => write!(f, "suite:{}", name),
        }
    }
}

// ------------- Disposition -------------
/// The resolved persistence/notification behavior of a property. Derived
/// from the modifier set by [`classify`], never stored on the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Tracked,
    CustomKeyed(String),
    Transient,
    Ignored,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Disposition::Tracked => write!(f, "tracked"),
            Disposition::CustomKeyed(key) => write!(f, "custom-keyed({})", key),
            Disposition::Transient => write!(f, "transient"),
            Disposition::Ignored => write!(f, "ignored"),
        }
    }
}

// ------------- PropertyDescriptor -------------
/// One declared property of a class. Immutable once classification begins.
// It's intentional to encapsulate the fields in the struct and only expose
// them using "getters", because this yields true immutability for
// descriptors after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    name: String,
    type_tag: TypeTag,
    mutability: Mutability,
    modifiers: Vec<Modifier>,
    store: StoreConfig,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            mutability: Mutability::Mutable,
            modifiers: Vec::new(),
            store: StoreConfig::Default,
        }
    }
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }
    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }
}

// ------------- ClassDescriptor -------------
/// A class name plus its ordered property list, as extracted by the host
/// environment. The class name doubles as the default key namespace prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    name: String,
    kind: ClassKind,
    properties: Vec<PropertyDescriptor>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: Vec::new(),
        }
    }
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> ClassKind {
        self.kind
    }
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }
}

// ------------- Classification -------------
/// Resolves a property's modifier set into one disposition.
///
/// Precedence, highest to lowest: `Ignored` > `Transient` > `CustomKey` >
/// default `Tracked`. Opting fully out always wins over a narrower
/// override, so a property marked as ignored is never coerced back into
/// persistence by a stray key annotation. When several `CustomKey`
/// modifiers appear, the first in declaration order wins.
pub fn classify(property: &PropertyDescriptor) -> Disposition {
    let mut custom_key = None;
    let mut transient = false;
    for modifier in property.modifiers() {
        match modifier {
            Modifier::Ignored => return Disposition::Ignored,
            Modifier::Transient => transient = true,
            Modifier::CustomKey(key) => {
                if custom_key.is_none() {
                    custom_key = Some(key.clone());
                }
            }
        }
    }
    if transient {
        return Disposition::Transient;
    }
    match custom_key {
        Some(key) => Disposition::CustomKeyed(key),
        None => Disposition::Tracked,
    }
}

// ------------- Key resolution -------------
/// Computes the storage key for a property, or `None` when the disposition
/// carries no backend wiring.
///
/// A pure function of (class name, property name, disposition): repeated
/// resolution of the same schema is idempotent.
pub fn resolve_key(
    class: &ClassDescriptor,
    property: &PropertyDescriptor,
    disposition: &Disposition,
) -> Option<String> {
    match disposition {
        Disposition::Tracked => Some(format!("{}.{}", class.name(), property.name())),
        Disposition::CustomKeyed(key) => Some(key.clone()),
        Disposition::Transient | Disposition::Ignored => None,
    }
}
