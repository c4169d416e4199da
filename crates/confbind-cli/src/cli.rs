//! confbind CLI - inspect merged configuration and bind options from the command line
//!
//! Usage:
//!   confbind dump -f appsettings.json -o appsettings.Development.json
//!   confbind get Settings:KeyOne -f appsettings.json --kind integer
//!   confbind children Settings -f appsettings.json -e APP_
//!   confbind demo

use clap::{Args, Parser, Subcommand};
use colored::{Color, Colorize};
use confbind_core::binder::coerce;
use confbind_core::{
    ArgsSource, ConfigurationStore, EnvSource, Error, FileSource, MemorySource, OptionsRegistry,
    PathKey, Result, SectionView,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::shapes::{ContainerOptions, OrderOptions, ServerOptions, SAMPLE_SETTINGS};

/// confbind - Hierarchical configuration with typed options binding
#[derive(Parser)]
#[command(name = "confbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Where configuration is read from, lowest priority first
#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Required configuration file (JSON or YAML), repeatable
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Optional configuration file, skipped when missing, repeatable
    #[arg(short = 'o', long = "optional")]
    optional: Vec<PathBuf>,

    /// Read environment variables starting with this prefix (`__` separates segments)
    #[arg(short = 'e', long = "env-prefix")]
    env_prefix: Option<String>,

    /// Override a value (e.g., Settings:KeyOne=2), repeatable
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

impl SourceArgs {
    fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.optional.is_empty()
            && self.env_prefix.is_none()
            && self.set.is_empty()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List every configuration key with its value
    Dump {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output format: text, json, yaml
        #[arg(long, default_value = "text")]
        format: String,

        /// Write to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Get a single value
    Get {
        /// Key of the value (e.g., Settings:Container:Name)
        key: String,

        #[command(flatten)]
        sources: SourceArgs,

        /// Expected kind: string, integer, boolean
        #[arg(short, long, default_value = "string", value_parser = ["string", "integer", "boolean"])]
        kind: String,

        /// Default value if key not found
        #[arg(short, long)]
        default: Option<String>,
    },

    /// List the immediate children of a section
    Children {
        /// Section key (e.g., Settings:Order)
        section: String,

        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Walk through reading values and binding options types
    Demo {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Dump {
            sources,
            format,
            output,
        } => cmd_dump(&sources, &format, output),
        Commands::Get {
            key,
            sources,
            kind,
            default,
        } => cmd_get(&sources, &key, &kind, default),
        Commands::Children { section, sources } => cmd_children(&sources, &section),
        Commands::Demo { sources } => cmd_demo(&sources),
    }
}

/// Build the store: files in order, then the environment, then `--set` overrides
fn load_store(args: &SourceArgs) -> Result<ConfigurationStore> {
    let mut builder = ConfigurationStore::builder();
    for file in &args.files {
        builder = builder.add_source(FileSource::required(file));
    }
    for file in &args.optional {
        builder = builder.add_source(FileSource::optional(file));
    }
    if let Some(prefix) = &args.env_prefix {
        builder = builder.add_source(EnvSource::new(prefix.clone()));
    }
    if !args.set.is_empty() {
        builder = builder.add_source(ArgsSource::new(args.set.iter().cloned()));
    }
    log::debug!("Loading configuration from {} sources", builder.source_count());
    builder.build()
}

fn load_or_exit(args: &SourceArgs) -> std::result::Result<ConfigurationStore, ExitCode> {
    load_store(args).map_err(|e| {
        eprintln!("{}", e.to_string().red());
        ExitCode::from(2)
    })
}

/// One `Key - Value` line per section, depth first, structural sections included
fn render_text(store: &ConfigurationStore) -> String {
    fn walk(section: &SectionView<'_>, lines: &mut Vec<String>) {
        for child in section.children() {
            lines.push(format!("{} - {}", child.path(), child.value().unwrap_or("")));
            walk(&child, lines);
        }
    }

    let mut lines = Vec::new();
    walk(&store.root(), &mut lines);
    lines.join("\n")
}

fn render_json(store: &ConfigurationStore) -> std::result::Result<String, String> {
    let map: serde_json::Map<String, serde_json::Value> = store
        .all_entries()
        .map(|(k, v)| {
            let value = v.map_or(serde_json::Value::Null, |s| serde_json::Value::String(s.into()));
            (k.format(), value)
        })
        .collect();
    serde_json::to_string_pretty(&map).map_err(|e| e.to_string())
}

fn render_yaml(store: &ConfigurationStore) -> std::result::Result<String, String> {
    let mut map = serde_yaml::Mapping::new();
    for (k, v) in store.all_entries() {
        let value = v.map_or(serde_yaml::Value::Null, |s| serde_yaml::Value::String(s.into()));
        map.insert(serde_yaml::Value::String(k.format()), value);
    }
    serde_yaml::to_string(&map).map_err(|e| e.to_string())
}

fn cmd_dump(sources: &SourceArgs, format: &str, output: Option<PathBuf>) -> ExitCode {
    let store = match load_or_exit(sources) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let result = match format {
        "json" => render_json(&store),
        "yaml" | "yml" => render_yaml(&store),
        "text" => Ok(render_text(&store)),
        _ => {
            eprintln!("Unsupported format: {}. Use text, json, or yaml.", format);
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(content) => {
            if let Some(output_path) = output {
                if let Err(e) = std::fs::write(&output_path, &content) {
                    eprintln!("{}: {}", "Error writing file".red(), e);
                    return ExitCode::from(2);
                }
                eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
            } else {
                println!("{}", content.trim_end());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

/// Check `raw` against the requested kind and return its canonical text
fn typed_value(key: &PathKey, raw: &str, kind: &str) -> Result<String> {
    let coerced = match kind {
        "integer" => coerce::<i64>(key, raw).map(|v| v.to_string()),
        "boolean" => coerce::<bool>(key, raw).map(|v| v.to_string()),
        _ => Ok(raw.to_string()),
    };
    coerced.map_err(Error::type_coercion)
}

fn cmd_get(sources: &SourceArgs, key: &str, kind: &str, default: Option<String>) -> ExitCode {
    let store = match load_or_exit(sources) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let path = match PathKey::parse(key) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    match store.get(&path) {
        Some(raw) => match typed_value(&path, raw, kind) {
            Ok(value) => {
                println!("{}", value);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::from(1)
            }
        },
        None => {
            if let Some(default_val) = default {
                println!("{}", default_val);
                ExitCode::SUCCESS
            } else {
                eprintln!("{}: Key '{}' not found", "Error".red(), key);
                ExitCode::from(1)
            }
        }
    }
}

fn cmd_children(sources: &SourceArgs, section: &str) -> ExitCode {
    let store = match load_or_exit(sources) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let section = match store.root().required_section(section) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    for child in section.children() {
        println!("{} - {}", child.key(), child.value().unwrap_or(""));
    }
    ExitCode::SUCCESS
}

fn banner(color: Color, title: &str) {
    let rule = "=".repeat(54);
    println!("{}", rule.color(color));
    println!("{}", title.color(color));
    println!("{}", rule.color(color));
}

fn demo_settings(store: &ConfigurationStore) -> Result<()> {
    banner(Color::Yellow, "Configuration 'Settings' section values...");
    let settings = store.root().required_section("Settings")?;
    let key_one: i32 = settings.get_or("KeyOne", 0)?;
    let key_two: bool = settings.get_or("KeyTwo", false)?;
    let key_three: String = settings.get_or("KeyThree", String::new())?;
    println!("KeyOne (int) value: {}", key_one);
    println!("KeyTwo (bool) value: {}", key_two);
    println!("KeyThree (string) value: '{}'", key_three);

    banner(Color::Cyan, "Reading nested values...");
    let root = store.root();
    let name: String = root.get_or("Settings:Container:Name", String::new())?;
    let index: i32 = root.get_or("Settings:Container:Index", 0)?;
    println!("Reading key 'Settings:Container:Name' as string: '{}'", name);
    println!("Reading key 'Settings:Container:Index' as integer: '{}'", index);
    Ok(())
}

fn demo_binding(store: &ConfigurationStore) -> Result<()> {
    banner(Color::Magenta, "Binding section to options object...");
    let section = store.section("Settings:Container");

    let mut bound = ContainerOptions::default();
    section.bind_into(&mut bound)?;
    println!(
        "ContainerOptions via bind_into(): Name: '{}', Index: {}.",
        bound.name, bound.index
    );

    let created: ContainerOptions = section.bind()?;
    println!(
        "ContainerOptions via bind(): Name: '{}', Index: {}.",
        created.name, created.index
    );
    Ok(())
}

fn demo_registry(registry: &OptionsRegistry) -> Result<()> {
    banner(Color::Green, "Options resolved through the registry...");
    registry.configure::<ContainerOptions>("Settings:Container")?;
    registry.configure::<OrderOptions>("Settings:Order")?;

    let container = registry.get::<ContainerOptions>()?;
    println!(
        "ContainerOptions via configure/get: Name: '{}', Index: {}.",
        container.name, container.index
    );

    let order = registry.get::<OrderOptions>()?;
    println!(
        "OrderOptions via configure/get: Customer: '{}', Number: {}.",
        order.customer, order.number
    );
    println!(
        "    Address.Street: {}, Address.City: {}.",
        order.address.street, order.address.city
    );

    let server = registry.resolve::<ServerOptions>("Settings:Server")?;
    println!(
        "ServerOptions via resolve: Name: '{}', OS: '{}'.",
        server.name, server.os
    );
    println!(
        "ServerOptions fields with no configured value: HasInitializer: {}, NoInitializer: {}",
        server.has_initializer, server.no_initializer
    );
    Ok(())
}

fn cmd_demo(sources: &SourceArgs) -> ExitCode {
    let store = if sources.is_empty() {
        let sample = MemorySource::new("sample settings", SAMPLE_SETTINGS.iter().copied());
        match ConfigurationStore::builder().add_source(sample).build() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                return ExitCode::from(2);
            }
        }
    } else {
        match load_or_exit(sources) {
            Ok(s) => s,
            Err(code) => return code,
        }
    };

    banner(Color::Green, "Enumerate configurations...");
    println!("{}", render_text(&store));

    let registry = OptionsRegistry::new(store);
    let result = demo_settings(registry.store())
        .and_then(|_| demo_binding(registry.store()))
        .and_then(|_| demo_registry(&registry));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} Demo failed\n", "✗".red());
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}
