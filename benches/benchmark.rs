use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use stowage::accessor::synthesize;
use stowage::datatype::{Storable, StoredValue};
use stowage::persist::{KeyValueStore, PersistenceMode, Store};
use stowage::schema::{
    ClassDescriptor, ClassKind, Modifier, PropertyDescriptor, StoreConfig, TypeTag,
};

fn class_with(properties: usize) -> ClassDescriptor {
    let mut class = ClassDescriptor::new("Bench", ClassKind::Class);
    for n in 0..properties {
        let mut property = PropertyDescriptor::new(format!("property_{n}"), TypeTag::Integer);
        if n % 7 == 0 {
            property = property.with_modifier(Modifier::CustomKey(format!("custom_{n}")));
        }
        if n % 11 == 0 {
            property = property.with_modifier(Modifier::Transient);
        }
        class = class.with_property(property);
    }
    class
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let small = class_with(10);
    c.bench_function("synthesize 10", |b| b.iter(|| synthesize(black_box(&small))));
    let large = class_with(1000);
    c.bench_function("synthesize 1k", |b| b.iter(|| synthesize(black_box(&large))));

    let list: Vec<i64> = (0..100).collect();
    c.bench_function("encode list 100", |b| b.iter(|| black_box(&list).to_stored()));
    let stored = list.to_stored();
    c.bench_function("decode list 100", |b| {
        b.iter(|| Vec::<i64>::from_stored(black_box(&stored)))
    });

    let store = Store::new(PersistenceMode::InMemory).unwrap();
    c.bench_function("store set", |b| {
        b.iter(|| {
            store.set(
                &StoreConfig::Default,
                black_box("Bench.property"),
                StoredValue::Integer(42),
            )
        })
    });
    store.set(&StoreConfig::Default, "Bench.property", StoredValue::Integer(42));
    c.bench_function("store get", |b| {
        b.iter(|| store.get(&StoreConfig::Default, black_box("Bench.property")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
