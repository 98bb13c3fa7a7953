//! End-to-end tests over a refrigerator resource
//!
//! Exercises the full path: tag-set composition, schema cache
//! invalidation on `rt` changes, interface-filtered retrieve/update, and
//! the load/save collaborator hooks.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use ocf_model::rt::{BINARY_SWITCH, BRIGHTNESS, REFRIGERATION};
use ocf_model::{
    Interface, OcfError, Params, Resource, ResourceHooks, ResourceState, TypeRegistry, Value,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fridge(registry: &Arc<TypeRegistry>) -> Resource {
    Resource::from_json(
        Arc::clone(registry),
        r#"{
            "defrost": false,
            "filter": 99,
            "if": ["oic.if.baseline", "oic.if.a"],
            "n": "my_fridge",
            "rapidCool": true,
            "rapidFreeze": false,
            "rt": ["oic.r.refrigeration"]
        }"#,
    )
    .unwrap()
}

fn no_params() -> Params {
    Params::new()
}

#[derive(Default)]
struct RecordingHooks {
    loaded: Arc<Mutex<Vec<Vec<String>>>>,
    saved: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ResourceHooks for RecordingHooks {
    fn load(
        &mut self,
        state: &mut ResourceState,
        names: &[String],
        _params: &Params,
    ) -> ocf_model::Result<()> {
        self.loaded.lock().push(names.to_vec());
        // Just-in-time value, as a live sensor read would produce
        if names.iter().any(|n| n == "filter") {
            state.set("filter", 42i64);
        }
        Ok(())
    }

    fn save(
        &mut self,
        _state: &mut ResourceState,
        names: &[String],
        _params: &Params,
    ) -> ocf_model::Result<()> {
        self.saved.lock().push(names.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Composition over a live resource
// ---------------------------------------------------------------------------

#[test]
fn test_multi_type_resource_exposes_both_schemas() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    resource.set_rt([REFRIGERATION, BINARY_SWITCH]);
    assert!(resource.get("defrost").is_ok());
    resource.set("value", true).unwrap();
    assert_eq!(resource.get("value").unwrap(), Value::Bool(true));

    // Dropping refrigeration from the tag set makes defrost inaccessible
    // while value stays reachable
    resource.set_rt([BINARY_SWITCH]);
    assert!(matches!(
        resource.get("defrost"),
        Err(OcfError::UnknownProperty(name)) if name == "defrost"
    ));
    assert_eq!(resource.get("value").unwrap(), Value::Bool(true));
}

#[test]
fn test_rt_reassignment_rederives_without_manual_invalidation() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let before = resource.type_of().unwrap();
    resource.set_rt([BRIGHTNESS]);
    let after = resource.type_of().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert!(Arc::ptr_eq(&after, &registry.lookup(BRIGHTNESS).unwrap()));
    // Stable until the tag set changes again
    assert!(Arc::ptr_eq(&after, &resource.type_of().unwrap()));
}

// ---------------------------------------------------------------------------
// Interface-filtered retrieve
// ---------------------------------------------------------------------------

#[test]
fn test_baseline_retrieve_includes_metadata() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = resource
        .retrieve_named("oic.if.baseline", &no_params())
        .unwrap();
    assert_eq!(data.get("filter"), Some(&Value::Int(99)));
    assert_eq!(data.get("rt"), Some(&Value::strings([REFRIGERATION])));
    assert_eq!(data.get("n"), Some(&Value::string("my_fridge")));
    // Never set and not required: omitted, not defaulted
    assert!(!data.contains_key("id"));
}

#[test]
fn test_read_write_retrieve_excludes_read_only() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = resource.retrieve(Interface::ReadWrite, &no_params()).unwrap();
    assert!(data.contains_key("n"));
    assert!(data.contains_key("defrost"));
    assert!(!data.contains_key("rt"));
    assert!(!data.contains_key("filter"));
}

#[test]
fn test_sensor_retrieve_is_read_only_operational() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = resource.retrieve(Interface::Sensor, &no_params()).unwrap();
    assert_eq!(
        data.keys().map(|s| s.as_str()).collect::<Vec<_>>(),
        ["filter"],
        "sensor view must hold only read-only operational properties"
    );
}

#[test]
fn test_actuator_retrieve_is_writable_operational() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = resource.retrieve(Interface::Actuator, &no_params()).unwrap();
    let keys: Vec<_> = data.keys().map(|s| s.as_str()).collect();
    assert_eq!(keys, ["defrost", "rapidCool", "rapidFreeze"]);
}

#[test]
fn test_required_but_absent_reports_default() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = Resource::from_json(
        Arc::clone(&registry),
        r#"{"rt": ["oic.r.light.brightness"]}"#,
    )
    .unwrap();

    let data = resource
        .retrieve(Interface::Baseline, &no_params())
        .unwrap();
    // `if` is required, so its default appears even though never set
    assert_eq!(data.get("if"), Some(&Value::Null));
    // unset optional properties are omitted
    assert!(!data.contains_key("brightness"));
    assert!(!data.contains_key("n"));
}

#[test]
fn test_unknown_interface_name() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);
    assert!(matches!(
        resource.retrieve_named("oic.if.nonexistent", &no_params()),
        Err(OcfError::UnknownInterface(_))
    ));
}

// ---------------------------------------------------------------------------
// Interface-filtered update
// ---------------------------------------------------------------------------

#[test]
fn test_actuator_update_ignores_invisible_properties() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = BTreeMap::from([
        ("rapidFreeze".to_string(), Value::Bool(true)),
        ("n".to_string(), Value::string("ignored_name")),
    ]);
    resource
        .update_named("oic.if.a", &data, &no_params())
        .unwrap();

    assert_eq!(resource.get("rapidFreeze").unwrap(), Value::Bool(true));
    assert_eq!(resource.get("n").unwrap(), Value::string("my_fridge"));
}

#[test]
fn test_update_rejects_all_read_only_names_at_once() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = BTreeMap::from([
        ("filter".to_string(), Value::Int(1)),
        ("id".to_string(), Value::string("forged")),
        ("defrost".to_string(), Value::Bool(true)),
    ]);
    let err = resource
        .update(Interface::Baseline, &data, &no_params())
        .unwrap_err();
    match err {
        OcfError::NotWritable(names) => {
            assert_eq!(names, vec!["filter".to_string(), "id".to_string()]);
        }
        other => panic!("expected NotWritable, got {other:?}"),
    }
    // Validation is all-or-nothing: the writable property was not applied
    assert_eq!(resource.get("defrost").unwrap(), Value::Bool(false));
}

#[test]
fn test_update_apply_is_best_effort_in_name_order() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut resource = fridge(&registry);

    let data = BTreeMap::from([
        ("defrost".to_string(), Value::Bool(true)),
        ("rapidCool".to_string(), Value::string("not-a-boolean")),
    ]);
    let err = resource
        .update(Interface::Actuator, &data, &no_params())
        .unwrap_err();
    assert!(matches!(err, OcfError::DataFormat { .. }));

    // "defrost" sorts before "rapidCool", so it was already committed
    // when canonicalization failed
    assert_eq!(resource.get("defrost").unwrap(), Value::Bool(true));
    assert_eq!(resource.get("rapidCool").unwrap(), Value::Bool(true));
}

#[test]
fn test_uuid_property_canonicalizes_text() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    registry
        .register(
            "x.tagged",
            [ocf_model::PropertyDescriptor::uuid("tagid")],
            &[],
        )
        .unwrap();
    let mut resource =
        Resource::from_json(Arc::clone(&registry), r#"{"rt": ["x.tagged"]}"#).unwrap();

    let id = uuid::Uuid::new_v4();
    resource.set("tagid", id.to_string()).unwrap();
    assert_eq!(resource.get("tagid").unwrap(), Value::Uuid(id));

    let err = resource.set("tagid", "not-a-uuid").unwrap_err();
    assert!(matches!(err, OcfError::DataFormat { .. }));
}

// ---------------------------------------------------------------------------
// Collaborator hooks
// ---------------------------------------------------------------------------

#[test]
fn test_load_hook_populates_just_in_time_values() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let hooks = RecordingHooks::default();
    let loaded = Arc::clone(&hooks.loaded);
    let mut resource = fridge(&registry).with_hooks(Box::new(hooks));

    let data = resource.retrieve(Interface::Sensor, &no_params()).unwrap();
    // The hook's live reading is what the retrieve reports
    assert_eq!(data.get("filter"), Some(&Value::Int(42)));
    assert_eq!(*loaded.lock(), vec![vec!["filter".to_string()]]);
}

#[test]
fn test_save_hook_sees_applied_names() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let hooks = RecordingHooks::default();
    let saved = Arc::clone(&hooks.saved);
    let mut resource = fridge(&registry).with_hooks(Box::new(hooks));

    let data = BTreeMap::from([
        ("rapidFreeze".to_string(), Value::Bool(true)),
        ("n".to_string(), Value::string("ignored_name")),
    ]);
    resource
        .update(Interface::Actuator, &data, &no_params())
        .unwrap();

    // Only the visible, applied property reaches the save hook
    assert_eq!(*saved.lock(), vec![vec!["rapidFreeze".to_string()]]);
}

#[test]
fn test_failed_update_never_reaches_save_hook() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let hooks = RecordingHooks::default();
    let saved = Arc::clone(&hooks.saved);
    let mut resource = fridge(&registry).with_hooks(Box::new(hooks));

    let data = BTreeMap::from([("filter".to_string(), Value::Int(0))]);
    assert!(resource
        .update(Interface::Baseline, &data, &no_params())
        .is_err());
    assert!(saved.lock().is_empty());
}
