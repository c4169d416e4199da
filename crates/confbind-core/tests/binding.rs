//! End-to-end binding from merged sources

use std::sync::{Arc, OnceLock};

use confbind_core::{
    ArgsSource, ConfigurationEntry, ConfigurationStore, ErrorKind, FileSource, MemorySource,
    Options, OptionsRegistry, PathKey, ScalarKind, Shape,
};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct ContainerOptions {
    name: String,
    index: i32,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            index: -1,
        }
    }
}

impl Options for ContainerOptions {
    fn shape() -> &'static Shape<Self> {
        static SHAPE: OnceLock<Shape<ContainerOptions>> = OnceLock::new();
        SHAPE.get_or_init(|| {
            Shape::<Self>::builder("ContainerOptions")
                .scalar("Name", |c| &mut c.name)
                .scalar("Index", |c| &mut c.index)
                .build()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AddressOptions {
    street: String,
    city: String,
}

impl Options for AddressOptions {
    fn shape() -> &'static Shape<Self> {
        static SHAPE: OnceLock<Shape<AddressOptions>> = OnceLock::new();
        SHAPE.get_or_init(|| {
            Shape::<Self>::builder("AddressOptions")
                .scalar("Street", |a| &mut a.street)
                .scalar("City", |a| &mut a.city)
                .build()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct OrderOptions {
    customer: String,
    number: i32,
    address: AddressOptions,
    items: Vec<String>,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            customer: String::new(),
            number: -1,
            address: AddressOptions::default(),
            items: Vec::new(),
        }
    }
}

impl Options for OrderOptions {
    fn shape() -> &'static Shape<Self> {
        static SHAPE: OnceLock<Shape<OrderOptions>> = OnceLock::new();
        SHAPE.get_or_init(|| {
            Shape::<Self>::builder("OrderOptions")
                .scalar("Customer", |o| &mut o.customer)
                .scalar("Number", |o| &mut o.number)
                .object("Address", |o| &mut o.address)
                .scalar_list("Items", |o| &mut o.items)
                .build()
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ServerOptions {
    name: String,
    os: String,
    has_initializer: bool,
    no_initializer: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            os: String::new(),
            has_initializer: true,
            no_initializer: false,
        }
    }
}

impl Options for ServerOptions {
    fn shape() -> &'static Shape<Self> {
        static SHAPE: OnceLock<Shape<ServerOptions>> = OnceLock::new();
        SHAPE.get_or_init(|| {
            Shape::<Self>::builder("ServerOptions")
                .scalar("Name", |s| &mut s.name)
                .scalar("OS", |s| &mut s.os)
                .scalar("HasInitializer", |s| &mut s.has_initializer)
                .scalar("NoInitializer", |s| &mut s.no_initializer)
                .build()
        })
    }
}

const APPSETTINGS: &str = r#"{
  "Settings": {
    "KeyOne": 1,
    "KeyTwo": true,
    "KeyThree": "text value",
    "Container": { "Name": "First container", "Index": 1 },
    "Order": {
      "Customer": "Joe Bloggs",
      "Number": 524,
      "Address": { "Street": "10 High Street", "City": "Christchurch" }
    },
    "Server": { "Name": "ABC123", "OS": "Windows Server 2019" }
  },
  "SettingsList": ["first", "second", "third"]
}"#;

fn appsettings_store(dir_name: &str) -> ConfigurationStore {
    let temp_dir = std::env::temp_dir().join(dir_name);
    std::fs::create_dir_all(&temp_dir).unwrap();
    let base = temp_dir.join("appsettings.json");
    let local = temp_dir.join("appsettings.Development.json");
    std::fs::write(&base, APPSETTINGS).unwrap();

    let store = ConfigurationStore::builder()
        .add_source(FileSource::required(&base))
        .add_source(FileSource::optional(&local))
        .add_source(ArgsSource::new(["--Settings:Container:Name=Second container", "/Settings:Container:Index", "2"]))
        .build()
        .unwrap();

    std::fs::remove_dir_all(&temp_dir).ok();
    store
}

fn entries(pairs: &[(&str, &str)]) -> Vec<ConfigurationEntry> {
    pairs
        .iter()
        .map(|(k, v)| ConfigurationEntry::new(PathKey::parse(k).unwrap(), *v))
        .collect()
}

#[test]
fn test_walkthrough_reads_values_and_binds_options() {
    let store = appsettings_store("confbind_it_walkthrough");

    let settings = store.root().required_section("Settings").unwrap();
    assert_eq!(settings.get::<i32>("KeyOne").unwrap(), Some(1));
    assert_eq!(settings.get::<bool>("KeyTwo").unwrap(), Some(true));
    assert_eq!(settings.get::<String>("KeyThree").unwrap().as_deref(), Some("text value"));

    let root = store.root();
    assert_eq!(root.get_value("Settings:Container:Name"), Some("Second container"));
    assert_eq!(root.get::<i32>("Settings:Container:Index").unwrap(), Some(2));

    let list = store.section("SettingsList");
    assert!(list.is_collection());
    let values: Vec<&str> = list.children().iter().filter_map(|c| c.value()).collect();
    assert_eq!(values, vec!["first", "second", "third"]);

    let mut bound = ContainerOptions::default();
    store.section("Settings:Container").bind_into(&mut bound).unwrap();
    let got: ContainerOptions = store.section("Settings:Container").bind().unwrap();
    assert_eq!(bound, got);
    assert_eq!(
        got,
        ContainerOptions {
            name: "Second container".into(),
            index: 2
        }
    );

    let registry = OptionsRegistry::new(store);
    registry.configure::<OrderOptions>("Settings:Order").unwrap();

    let order = registry.get::<OrderOptions>().unwrap();
    assert_eq!(order.customer, "Joe Bloggs");
    assert_eq!(order.number, 524);
    assert_eq!(order.address.street, "10 High Street");
    assert_eq!(order.address.city, "Christchurch");

    let server = registry.resolve::<ServerOptions>("Settings:Server").unwrap();
    assert_eq!(server.name, "ABC123");
    assert_eq!(server.os, "Windows Server 2019");
    assert!(server.has_initializer);
    assert!(!server.no_initializer);

    assert!(Arc::ptr_eq(&order, &registry.get::<OrderOptions>().unwrap()));
}

#[test]
fn test_missing_section_binds_defaults() {
    let store = appsettings_store("confbind_it_defaults");

    let container: ContainerOptions = store.section("Settings:Missing").bind().unwrap();

    assert_eq!(container, ContainerOptions::default());
}

#[test]
fn test_items_gap_scenario() {
    let store = ConfigurationStore::merge([entries(&[
        ("Order:Items:0", "a"),
        ("Order:Items:1", "b"),
        ("Order:Items:3", "d"),
    ])]);

    let order: OrderOptions = store.section("Order").bind().unwrap();

    assert_eq!(order.items, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_settings_coercion_scenario() {
    #[derive(Debug, Default)]
    struct Settings {
        key_one: i32,
        key_two: bool,
        key_three: i32,
    }

    impl Options for Settings {
        fn shape() -> &'static Shape<Self> {
            static SHAPE: OnceLock<Shape<Settings>> = OnceLock::new();
            SHAPE.get_or_init(|| {
                Shape::<Self>::builder("Settings")
                    .scalar("KeyOne", |s| &mut s.key_one)
                    .scalar("KeyTwo", |s| &mut s.key_two)
                    .scalar("KeyThree", |s| &mut s.key_three)
                    .build()
            })
        }
    }

    let store = ConfigurationStore::merge([entries(&[
        ("Settings:KeyOne", "1"),
        ("Settings:KeyTwo", "true"),
        ("Settings:KeyThree", "text value"),
    ])]);

    let err = store.section("Settings").bind::<Settings>().unwrap_err();

    let ErrorKind::Binding(binding) = &err.kind else {
        panic!("expected a binding error, got {:?}", err.kind);
    };
    assert_eq!(binding.errors.len(), 1);
    assert_eq!(binding.errors[0].path, PathKey::parse("Settings:KeyThree").unwrap());
    assert_eq!(binding.errors[0].expected, ScalarKind::Integer);
    assert_eq!(binding.errors[0].value, "text value");
}

#[test]
fn test_later_memory_source_overrides_file() {
    let store = ConfigurationStore::builder()
        .add_source(MemorySource::new("defaults", [("Settings:Server:Name", "ABC123"), ("Settings:Server:OS", "Linux")]))
        .add_source(MemorySource::new("overrides", [("SETTINGS:SERVER:NAME", "XYZ789")]))
        .build()
        .unwrap();

    let server: ServerOptions = store.section("Settings:Server").bind().unwrap();

    assert_eq!(server.name, "XYZ789");
    assert_eq!(server.os, "Linux");
    let keys: Vec<String> = store.all_entries().map(|(k, _)| k.format()).collect();
    assert_eq!(keys, vec!["Settings:Server:Name", "Settings:Server:OS"]);
}

#[test]
fn test_null_list_element_from_file_keeps_later_items() {
    let temp_dir = std::env::temp_dir().join("confbind_it_null_items");
    std::fs::create_dir_all(&temp_dir).unwrap();
    let path = temp_dir.join("order.json");
    std::fs::write(&path, r#"{"Order": {"Items": ["apple", null, "", "cherry"]}}"#).unwrap();

    let store = ConfigurationStore::builder()
        .add_source(FileSource::required(&path))
        .build()
        .unwrap();
    std::fs::remove_dir_all(&temp_dir).ok();

    let order: OrderOptions = store.section("Order").bind().unwrap();

    assert_eq!(order.items, vec!["apple", "", "", "cherry"]);
}
