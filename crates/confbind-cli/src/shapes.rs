//! Options types bound by the `demo` command

use std::sync::OnceLock;

use confbind_core::{Options, Shape};

/// Bound from `Settings:Container`
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerOptions {
    pub name: String,
    pub index: i32,
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
pub struct AddressOptions {
    pub street: String,
    pub city: String,
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

/// Bound from `Settings:Order`, address included
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOptions {
    pub customer: String,
    pub number: i32,
    pub address: AddressOptions,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            customer: String::new(),
            number: -1,
            address: AddressOptions::default(),
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
                .build()
        })
    }
}

/// Bound from `Settings:Server`.
///
/// The two flags are normally absent from configuration and show what
/// binding does with fields that have no value.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerOptions {
    pub name: String,
    pub os: String,
    pub has_initializer: bool,
    pub no_initializer: bool,
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

/// Values used by `demo` when no source flags are given
pub const SAMPLE_SETTINGS: &[(&str, &str)] = &[
    ("Settings:KeyOne", "1"),
    ("Settings:KeyTwo", "true"),
    ("Settings:KeyThree", "text value"),
    ("Settings:Container:Name", "Second container"),
    ("Settings:Container:Index", "2"),
    ("Settings:Order:Customer", "Joe Bloggs"),
    ("Settings:Order:Number", "524"),
    ("Settings:Order:Address:Street", "10 High Street"),
    ("Settings:Order:Address:City", "Christchurch"),
    ("Settings:Server:Name", "ABC123"),
    ("Settings:Server:OS", "Windows Server 2019"),
    ("SettingsList:0", "first"),
    ("SettingsList:1", "second"),
    ("SettingsList:2", "third"),
];
