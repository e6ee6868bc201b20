//! Demo client for the stowage engine.
//!
//! Declares a `Settings` class the way a host environment would hand it
//! over, synthesizes the transformation plan and exercises every
//! disposition: tracked, custom-keyed, transient and ignored. Run twice
//! against a file-backed store to watch the tracked values survive a
//! restart while the transient ones reset.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use stowage::accessor::{Ignored, Persisted, Transient, synthesize};
use stowage::datatype::Structured;
use stowage::error::Result;
use stowage::persist::{PersistenceMode, Store};
use stowage::registrar::ObservationRegistrar;
use stowage::schema::{ClassDescriptor, ClassKind, Modifier, PropertyDescriptor, TypeTag};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct WindowState {
    width: u32,
    height: u32,
}

fn settings_class() -> ClassDescriptor {
    ClassDescriptor::new("Settings", ClassKind::Class)
        .with_property(PropertyDescriptor::new("enabled", TypeTag::Boolean))
        .with_property(PropertyDescriptor::new("launch_count", TypeTag::Integer))
        .with_property(PropertyDescriptor::new("volume", TypeTag::Float))
        .with_property(PropertyDescriptor::new("greeting", TypeTag::Text))
        .with_property(PropertyDescriptor::new("window", TypeTag::Structured))
        .with_property(
            PropertyDescriptor::new("accent", TypeTag::Text)
                .with_modifier(Modifier::CustomKey("Accent".to_owned())),
        )
        .with_property(
            PropertyDescriptor::new("scratch", TypeTag::Boolean).with_modifier(Modifier::Transient),
        )
        .with_property(
            PropertyDescriptor::new("hidden", TypeTag::Boolean).with_modifier(Modifier::Ignored),
        )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // An optional stowage.toml (or STOWAGE_DATABASE) selects a file-backed
    // store; without it everything stays in memory.
    let settings = config::Config::builder()
        .add_source(config::File::with_name("stowage").required(false))
        .add_source(config::Environment::with_prefix("STOWAGE"))
        .build()?;
    let mode = match settings.get_string("database") {
        Ok(path) => PersistenceMode::File(path),
        Err(_) => PersistenceMode::InMemory,
    };
    info!(?mode, "opening store");
    let store: Arc<Store> = Arc::new(Store::new(mode)?);

    let class = settings_class();
    let plan = synthesize(&class)?;
    for property in plan.properties() {
        info!(
            property = property.name(),
            disposition = %property.disposition(),
            key = property.key().unwrap_or("-"),
            "planned"
        );
    }

    let registrar = Arc::new(ObservationRegistrar::new());
    let mut enabled = Persisted::<bool>::from_plan(
        plan.property("enabled").unwrap(),
        false,
        store.clone(),
        registrar.clone(),
    )?;
    let mut launch_count = Persisted::<i64>::from_plan(
        plan.property("launch_count").unwrap(),
        0,
        store.clone(),
        registrar.clone(),
    )?;
    let mut volume = Persisted::<f64>::from_plan(
        plan.property("volume").unwrap(),
        0.5,
        store.clone(),
        registrar.clone(),
    )?;
    let mut greeting = Persisted::<String>::from_plan(
        plan.property("greeting").unwrap(),
        String::new(),
        store.clone(),
        registrar.clone(),
    )?;
    let mut window = Persisted::<Structured<WindowState>>::from_plan(
        plan.property("window").unwrap(),
        Structured(WindowState {
            width: 800,
            height: 600,
        }),
        store.clone(),
        registrar.clone(),
    )?;
    let mut accent = Persisted::<String>::from_plan(
        plan.property("accent").unwrap(),
        "blue".to_owned(),
        store.clone(),
        registrar.clone(),
    )?;
    let mut scratch =
        Transient::<bool>::from_plan(plan.property("scratch").unwrap(), false, registrar.clone())?;
    let mut hidden = Ignored::<bool>::from_plan(plan.property("hidden").unwrap(), false)?;

    registrar.observe("enabled", |property| {
        info!(property, "observer notified");
    });

    // A tracking scope collects the dependencies of a computation.
    let (count, read) = ObservationRegistrar::track(|| launch_count.get());
    info!(count, ?read, "tracked read");

    enabled.set(!enabled.get());
    launch_count.modify(|n| *n += 1);
    volume.set(0.8);
    greeting.set("hello again".to_owned());
    window.modify(|w| w.0.width += 160);
    accent.set("teal".to_owned());
    scratch.set(true);
    hidden.set(true);

    info!(enabled = enabled.get(), "enabled");
    info!(launch_count = launch_count.get(), "launch count");
    info!(volume = volume.get(), "volume");
    info!(greeting = %greeting.get(), "greeting");
    info!(window = ?window.get().0, "window");
    info!(accent = %accent.get(), key = accent.key(), "accent");
    info!(scratch = scratch.get(), "scratch (memory only)");
    info!(hidden = hidden.get(), "hidden (unobserved)");

    Ok(())
}
