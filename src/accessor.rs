use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::datatype::{EncodingTier, Storable, tier_of};
use crate::error::{Result, StowageError};
use crate::persist::KeyValueStore;
use crate::registrar::ObservationRegistrar;
use crate::schema::{
    ClassDescriptor, ClassKind, Disposition, Mutability, StoreConfig, classify, resolve_key,
};

// ------------- PropertyPlan -------------
/// The synthesized behavior of one property: its disposition, the resolved
/// storage key and namespace for the dispositions that carry backend
/// wiring, and the encoding tier its declared type falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPlan {
    name: String,
    disposition: Disposition,
    key: Option<String>,
    store: StoreConfig,
    tier: Option<EncodingTier>,
}

impl PropertyPlan {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn disposition(&self) -> &Disposition {
        &self.disposition
    }
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }
    pub fn tier(&self) -> Option<EncodingTier> {
        self.tier
    }
}

// ------------- ClassPlan -------------
/// The full transformation plan for a class: one entry per property that
/// survived the mutability filter, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPlan {
    class: String,
    properties: Vec<PropertyPlan>,
}

impl ClassPlan {
    pub fn class(&self) -> &str {
        &self.class
    }
    pub fn properties(&self) -> &[PropertyPlan] {
        &self.properties
    }
    pub fn property(&self, name: &str) -> Option<&PropertyPlan> {
        self.properties.iter().find(|p| p.name == name)
    }
}

// ------------- Synthesis -------------
/// Turns a class descriptor into a transformation plan.
///
/// Only class types can hold the mutable per-instance storage the
/// transformation needs; value types and actors are rejected outright.
/// Constants and computed properties are excluded before classification,
/// and two properties resolving to the same storage key are a
/// configuration error, reported here rather than silently accepted.
pub fn synthesize(class: &ClassDescriptor) -> Result<ClassPlan> {
    match class.kind() {
        ClassKind::Class => (),
        kind => {
            return Err(StowageError::Unsupported {
                class: class.name().to_owned(),
                kind: format!("{kind:?}"),
            });
        }
    }
    let mut properties = Vec::new();
    let mut resolved_keys = HashSet::new();
    for property in class.properties() {
        if property.mutability() != Mutability::Mutable {
            continue;
        }
        let disposition = classify(property);
        let key = resolve_key(class, property, &disposition);
        if let Some(key) = &key {
            if !resolved_keys.insert(key.clone()) {
                return Err(StowageError::DuplicateKey {
                    class: class.name().to_owned(),
                    key: key.clone(),
                });
            }
        }
        let tier = key.as_ref().map(|_| tier_of(property.type_tag()));
        debug!(
            class = class.name(),
            property = property.name(),
            %disposition,
            key = key.as_deref().unwrap_or("-"),
            "synthesized"
        );
        properties.push(PropertyPlan {
            name: property.name().to_owned(),
            disposition,
            key,
            store: property.store().clone(),
            tier,
        });
    }
    Ok(ClassPlan {
        class: class.name().to_owned(),
        properties,
    })
}

// ------------- Persisted -------------
/// Accessor handle for a tracked or custom-keyed property: reads and
/// writes go through the store, bracketed by registrar notifications.
///
/// The backing value seeds the first read and absorbs decode failures. It
/// is never written to the store until the first explicit write.
pub struct Persisted<T: Storable> {
    name: String,
    key: String,
    config: StoreConfig,
    backing: T,
    store: Arc<dyn KeyValueStore>,
    registrar: Arc<ObservationRegistrar>,
}

impl<T: Storable> Persisted<T> {
    pub fn from_plan(
        plan: &PropertyPlan,
        initial: T,
        store: Arc<dyn KeyValueStore>,
        registrar: Arc<ObservationRegistrar>,
    ) -> Result<Self> {
        match plan.disposition() {
            Disposition::Tracked | Disposition::CustomKeyed(_) => (),
            other => {
                return Err(StowageError::Config(format!(
                    "property '{}' is {other}, not persisted",
                    plan.name()
                )));
            }
        }
        let key = plan.key().map(str::to_owned).ok_or_else(|| {
            StowageError::Config(format!("property '{}' has no storage key", plan.name()))
        })?;
        Ok(Self {
            name: plan.name().to_owned(),
            key,
            config: plan.store().clone(),
            backing: initial,
            store,
            registrar,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Records the access, then reads through the store with the backing
    /// value as fallback.
    pub fn get(&self) -> T {
        self.registrar.access(&self.name);
        self.store
            .get(&self.config, &self.key)
            .and_then(|value| T::from_stored(&value))
            .unwrap_or_else(|| self.backing.clone())
    }

    /// Writes through the store and updates the backing value, bracketed
    /// by one will/did notification pair. The store absorbs its own
    /// failures, so the completing notification always fires.
    pub fn set(&mut self, value: T) {
        self.registrar.will_mutate(&self.name);
        self.store.set(&self.config, &self.key, value.to_stored());
        self.backing = value;
        self.registrar.did_mutate(&self.name);
    }

    /// Mutates the backing value in place and writes the result through,
    /// with exactly one notification pair no matter how many internal
    /// steps the mutation takes.
    pub fn modify<R>(&mut self, mutation: impl FnOnce(&mut T) -> R) -> R {
        self.registrar.access(&self.name);
        self.registrar.will_mutate(&self.name);
        let result = mutation(&mut self.backing);
        self.store
            .set(&self.config, &self.key, self.backing.to_stored());
        self.registrar.did_mutate(&self.name);
        result
    }
}

// ------------- Transient -------------
/// Accessor handle for a transient property: ordinary in-memory storage
/// with the same notification bracketing, and no backend wiring at all.
pub struct Transient<T: Clone> {
    name: String,
    backing: T,
    registrar: Arc<ObservationRegistrar>,
}

impl<T: Clone> Transient<T> {
    pub fn from_plan(
        plan: &PropertyPlan,
        initial: T,
        registrar: Arc<ObservationRegistrar>,
    ) -> Result<Self> {
        if *plan.disposition() != Disposition::Transient {
            return Err(StowageError::Config(format!(
                "property '{}' is {}, not transient",
                plan.name(),
                plan.disposition()
            )));
        }
        Ok(Self {
            name: plan.name().to_owned(),
            backing: initial,
            registrar,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn get(&self) -> T {
        self.registrar.access(&self.name);
        self.backing.clone()
    }
    pub fn set(&mut self, value: T) {
        self.registrar.will_mutate(&self.name);
        self.backing = value;
        self.registrar.did_mutate(&self.name);
    }
    pub fn modify<R>(&mut self, mutation: impl FnOnce(&mut T) -> R) -> R {
        self.registrar.access(&self.name);
        self.registrar.will_mutate(&self.name);
        let result = mutation(&mut self.backing);
        self.registrar.did_mutate(&self.name);
        result
    }
}

// ------------- Ignored -------------
/// Accessor handle for an ignored property: plain storage, no persistence
/// and no notifications.
pub struct Ignored<T: Clone> {
    backing: T,
}

impl<T: Clone> Ignored<T> {
    pub fn from_plan(plan: &PropertyPlan, initial: T) -> Result<Self> {
        if *plan.disposition() != Disposition::Ignored {
            return Err(StowageError::Config(format!(
                "property '{}' is {}, not ignored",
                plan.name(),
                plan.disposition()
            )));
        }
        Ok(Self { backing: initial })
    }

    pub fn get(&self) -> T {
        self.backing.clone()
    }
    pub fn set(&mut self, value: T) {
        self.backing = value;
    }
    pub fn modify<R>(&mut self, mutation: impl FnOnce(&mut T) -> R) -> R {
        mutation(&mut self.backing)
    }
}
