//! Stowage – transparently key-value-backed, change-tracked properties for
//! declared class schemas.
//!
//! Stowage centers on the transformation plan: given a class's declared
//! properties (each with a name, a [`schema::TypeTag`] and zero or more
//! [`schema::Modifier`]s), it decides per property whether and how to
//! * route reads and writes through a pluggable key-value backend,
//! * fall back to a self-describing structured encoding for values the
//!   backend cannot store natively, and
//! * bracket every access and mutation with observation notifications.
//!
//! ## Modules
//! * [`schema`] – Schema constructs ([`schema::ClassDescriptor`],
//!   [`schema::PropertyDescriptor`]), the modifier classifier and the key
//!   resolver.
//! * [`datatype`] – The [`datatype::Storable`] trait, the backend-native
//!   [`datatype::StoredValue`] representation and the structured encoding
//!   tier ([`datatype::Structured`]).
//! * [`persist`] – SQLite key-value store with a default namespace and
//!   isolated named suites.
//! * [`registrar`] – Per-instance observation hub with access tracking and
//!   mutation bracketing.
//! * [`accessor`] – The synthesizer that turns a descriptor into a
//!   [`accessor::ClassPlan`], plus the typed accessor handles
//!   ([`accessor::Persisted`], [`accessor::Transient`],
//!   [`accessor::Ignored`]).
//! * [`error`] – Crate error type and `Result` alias.
//!
//! ## Dispositions
//! A property with no modifiers is tracked under the key
//! `"{ClassName}.{propertyName}"`. `CustomKey` overrides the key verbatim,
//! `Transient` keeps the property in memory only, and `Ignored` opts out of
//! notification as well. Opting out always wins over a narrower override.
//!
//! ## Persistence
//! Persistence is advisory: a missing entry, an undecodable payload or an
//! unopenable suite never raises, the accessor yields its backing value
//! instead. Writes are last-write-wins per key with no cross-key
//! transactions.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use stowage::accessor::{synthesize, Persisted};
//! use stowage::persist::{PersistenceMode, Store};
//! use stowage::registrar::ObservationRegistrar;
//! use stowage::schema::{ClassDescriptor, ClassKind, PropertyDescriptor, TypeTag};
//!
//! let class = ClassDescriptor::new("Settings", ClassKind::Class)
//!     .with_property(PropertyDescriptor::new("enabled", TypeTag::Boolean));
//! let plan = synthesize(&class).unwrap();
//!
//! let store = Arc::new(Store::new(PersistenceMode::InMemory).unwrap());
//! let registrar = Arc::new(ObservationRegistrar::new());
//! let mut enabled = Persisted::<bool>::from_plan(
//!     plan.property("enabled").unwrap(),
//!     false,
//!     store,
//!     registrar,
//! )
//! .unwrap();
//!
//! assert!(!enabled.get());
//! enabled.set(true);
//! assert!(enabled.get());
//! ```
//!
//! ## Status & Roadmap
//! The plan surface (disposition, key, namespace, tier per property) is
//! what a host environment weaves into a class's accessors. Cross-process
//! synchronization, multi-key transactions and schema migration are out of
//! scope by design.

pub mod accessor;
pub mod datatype;
pub mod error;
pub mod persist;
pub mod registrar;
pub mod schema;
