use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use stowage::accessor::{Ignored, Persisted, Transient, synthesize};
use stowage::datatype::{StoredValue, Structured};
use stowage::persist::{KeyValueStore, PersistenceMode, Store};
use stowage::registrar::ObservationRegistrar;
use stowage::schema::{
    ClassDescriptor, ClassKind, Modifier, PropertyDescriptor, StoreConfig, TypeTag,
};

fn settings_class() -> ClassDescriptor {
    ClassDescriptor::new("Settings", ClassKind::Class)
        .with_property(PropertyDescriptor::new("enabled", TypeTag::Boolean))
        .with_property(
            PropertyDescriptor::new("count", TypeTag::Integer)
                .with_modifier(Modifier::CustomKey("user_count".to_owned())),
        )
        .with_property(
            PropertyDescriptor::new("cache", TypeTag::Boolean).with_modifier(Modifier::Transient),
        )
        .with_property(
            PropertyDescriptor::new("hidden", TypeTag::Boolean).with_modifier(Modifier::Ignored),
        )
        .with_property(PropertyDescriptor::new("labels", TypeTag::Structured))
        .with_property(PropertyDescriptor::new("recent", TypeTag::List(Box::new(TypeTag::Integer))))
}

fn fixture() -> (Arc<Store>, Arc<ObservationRegistrar>, stowage::accessor::ClassPlan) {
    let store = Arc::new(Store::new(PersistenceMode::InMemory).expect("store"));
    let registrar = Arc::new(ObservationRegistrar::new());
    let plan = synthesize(&settings_class()).expect("plan");
    (store, registrar, plan)
}

#[test]
fn first_read_returns_the_initial_value_then_writes_stick() {
    let (store, registrar, plan) = fixture();
    let mut enabled = Persisted::<bool>::from_plan(
        plan.property("enabled").unwrap(),
        false,
        store.clone(),
        registrar,
    )
    .expect("handle");
    // nothing in the store yet, the backing value answers
    assert!(!enabled.get());
    enabled.set(true);
    assert!(enabled.get());
    // and the store now holds the value under the resolved key
    assert_eq!(
        store.get(&StoreConfig::Default, "Settings.enabled"),
        Some(StoredValue::Boolean(true))
    );
}

#[test]
fn custom_keyed_property_stores_under_its_own_key() {
    let (store, registrar, plan) = fixture();
    let mut count = Persisted::<i64>::from_plan(
        plan.property("count").unwrap(),
        0,
        store.clone(),
        registrar,
    )
    .expect("handle");
    count.set(5);
    assert_eq!(
        store.get(&StoreConfig::Default, "user_count"),
        Some(StoredValue::Integer(5))
    );
    assert_eq!(store.get(&StoreConfig::Default, "Settings.count"), None);
}

#[test]
fn transient_property_never_reaches_the_backend() {
    let (store, registrar, plan) = fixture();
    let mut cache = Transient::<bool>::from_plan(
        plan.property("cache").unwrap(),
        false,
        registrar.clone(),
    )
    .expect("handle");
    cache.set(true);
    assert!(cache.get());
    // a fresh instance starts from the class's stated initial value again
    let fresh =
        Transient::<bool>::from_plan(plan.property("cache").unwrap(), false, registrar)
            .expect("handle");
    assert!(!fresh.get());
    assert_eq!(store.get(&StoreConfig::Default, "Settings.cache"), None);
}

#[test]
fn structured_mapping_roundtrips_through_the_store() {
    let (store, registrar, plan) = fixture();
    let mut labels = Persisted::<Structured<HashMap<String, String>>>::from_plan(
        plan.property("labels").unwrap(),
        Structured(HashMap::new()),
        store.clone(),
        registrar.clone(),
    )
    .expect("handle");
    let mut mapping = HashMap::new();
    mapping.insert("en".to_owned(), "Settings".to_owned());
    mapping.insert("sv".to_owned(), "Inställningar".to_owned());
    labels.set(Structured(mapping.clone()));

    // a second handle over the same store decodes an equal mapping
    let other = Persisted::<Structured<HashMap<String, String>>>::from_plan(
        plan.property("labels").unwrap(),
        Structured(HashMap::new()),
        store,
        registrar,
    )
    .expect("handle");
    assert_eq!(other.get().0, mapping);
}

#[test]
fn write_fires_exactly_one_completed_notification() {
    let (store, registrar, plan) = fixture();
    let notified = Arc::new(AtomicUsize::new(0));
    let observed_value = {
        let store = store.clone();
        let notified = notified.clone();
        move |_property: &str| {
            // by notification time the store already holds the new value
            assert_eq!(
                store.get(&StoreConfig::Default, "Settings.enabled"),
                Some(StoredValue::Boolean(true))
            );
            notified.fetch_add(1, Ordering::SeqCst);
        }
    };
    registrar.observe("enabled", observed_value);
    let mut enabled = Persisted::<bool>::from_plan(
        plan.property("enabled").unwrap(),
        false,
        store,
        registrar,
    )
    .expect("handle");
    enabled.set(true);
    assert_eq!(notified.load(Ordering::SeqCst), 1);
}

#[test]
fn in_place_mutation_fires_one_notification_pair() {
    let (store, registrar, plan) = fixture();
    let notified = Arc::new(AtomicUsize::new(0));
    {
        let notified = notified.clone();
        registrar.observe("recent", move |_| {
            notified.fetch_add(1, Ordering::SeqCst);
        });
    }
    let mut recent = Persisted::<Vec<i64>>::from_plan(
        plan.property("recent").unwrap(),
        Vec::new(),
        store.clone(),
        registrar,
    )
    .expect("handle");
    // several internal steps, one bracket
    recent.modify(|list| {
        list.push(1);
        list.push(2);
        list.push(3);
    });
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(recent.get(), vec![1, 2, 3]);
    assert_eq!(
        store.get(&StoreConfig::Default, "Settings.recent"),
        Some(StoredValue::List(vec![
            StoredValue::Integer(1),
            StoredValue::Integer(2),
            StoredValue::Integer(3),
        ]))
    );
}

#[test]
fn reads_are_recorded_by_the_tracking_scope() {
    let (store, registrar, plan) = fixture();
    let enabled = Persisted::<bool>::from_plan(
        plan.property("enabled").unwrap(),
        false,
        store,
        registrar.clone(),
    )
    .expect("handle");
    let cache =
        Transient::<bool>::from_plan(plan.property("cache").unwrap(), false, registrar)
            .expect("handle");
    let hidden =
        Ignored::<bool>::from_plan(plan.property("hidden").unwrap(), false).expect("handle");

    let ((), accessed) = ObservationRegistrar::track(|| {
        enabled.get();
        cache.get();
        hidden.get();
    });
    assert!(accessed.contains("enabled"));
    assert!(accessed.contains("cache"), "transient reads are tracked");
    assert!(!accessed.contains("hidden"), "ignored reads are not");
    assert_eq!(accessed.len(), 2);
}

#[test]
fn transient_mutation_notifies_but_ignored_does_not() {
    let (_store, registrar, plan) = fixture();
    let notified = Arc::new(AtomicUsize::new(0));
    {
        let notified = notified.clone();
        registrar.observe("cache", move |_| {
            notified.fetch_add(1, Ordering::SeqCst);
        });
    }
    {
        let notified = notified.clone();
        registrar.observe("hidden", move |_| {
            notified.fetch_add(1, Ordering::SeqCst);
        });
    }
    let mut cache = Transient::<bool>::from_plan(
        plan.property("cache").unwrap(),
        false,
        registrar,
    )
    .expect("handle");
    let mut hidden =
        Ignored::<bool>::from_plan(plan.property("hidden").unwrap(), false).expect("handle");
    cache.set(true);
    hidden.set(true);
    assert_eq!(notified.load(Ordering::SeqCst), 1, "only the transient write notifies");
}

#[test]
fn handles_reject_a_mismatched_plan() {
    let (store, registrar, plan) = fixture();
    assert!(
        Persisted::<bool>::from_plan(
            plan.property("cache").unwrap(),
            false,
            store,
            registrar.clone(),
        )
        .is_err()
    );
    assert!(
        Transient::<bool>::from_plan(plan.property("enabled").unwrap(), false, registrar).is_err()
    );
    assert!(Ignored::<bool>::from_plan(plan.property("enabled").unwrap(), false).is_err());
}

#[test]
fn suite_scoped_property_writes_into_its_suite() {
    let class = ClassDescriptor::new("Settings", ClassKind::Class).with_property(
        PropertyDescriptor::new("shared_flag", TypeTag::Boolean)
            .with_store(StoreConfig::NamedSuite("group.demo".to_owned())),
    );
    let plan = synthesize(&class).expect("plan");
    let store = Arc::new(Store::new(PersistenceMode::InMemory).expect("store"));
    let registrar = Arc::new(ObservationRegistrar::new());
    let mut flag = Persisted::<bool>::from_plan(
        plan.property("shared_flag").unwrap(),
        false,
        store.clone(),
        registrar,
    )
    .expect("handle");
    flag.set(true);
    assert_eq!(
        store.get(
            &StoreConfig::NamedSuite("group.demo".to_owned()),
            "Settings.shared_flag"
        ),
        Some(StoredValue::Boolean(true))
    );
    assert_eq!(store.get(&StoreConfig::Default, "Settings.shared_flag"), None);
}

#[test]
fn unopenable_suite_still_yields_the_backing_value() {
    let class = ClassDescriptor::new("Settings", ClassKind::Class).with_property(
        PropertyDescriptor::new("flag", TypeTag::Boolean)
            .with_store(StoreConfig::NamedSuite("not a suite".to_owned())),
    );
    let plan = synthesize(&class).expect("plan");
    let store = Arc::new(Store::new(PersistenceMode::InMemory).expect("store"));
    let registrar = Arc::new(ObservationRegistrar::new());
    let mut flag = Persisted::<bool>::from_plan(
        plan.property("flag").unwrap(),
        false,
        store,
        registrar,
    )
    .expect("handle");
    // the write is silently dropped, the backing value keeps answering
    flag.set(true);
    assert!(flag.get(), "backing value was still updated");
}
