//! Configuration source providers
//!
//! A [`Source`] turns some external input into flat [`ConfigurationEntry`]
//! pairs. The store merges them in the order the sources were added, so later
//! sources override earlier ones.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path::{PathKey, DELIMITER};
use crate::store::ConfigurationEntry;

/// A provider of configuration entries
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Human-readable name used in logs and errors
    fn name(&self) -> String;

    /// Read the entries this source contributes, in order
    fn entries(&self) -> Result<Vec<ConfigurationEntry>>;
}

/// Literal key-value pairs held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    pairs: Vec<(String, String)>,
}

impl MemorySource {
    /// Create a source from `(key, value)` pairs with `:`-delimited keys
    pub fn new<K, V>(name: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Source for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn entries(&self) -> Result<Vec<ConfigurationEntry>> {
        self.pairs
            .iter()
            .map(|(k, v)| -> Result<ConfigurationEntry> {
                Ok(ConfigurationEntry::new(PathKey::parse(k)?, v.as_str()))
            })
            .collect()
    }
}

/// File specification for loading configuration files
///
/// Use this to specify whether a file is required or optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSpec {
    /// A required file - error if not found
    Required(PathBuf),
    /// An optional file - silently skip if not found
    Optional(PathBuf),
}

impl FileSpec {
    /// Create a required file spec
    pub fn required(path: impl Into<PathBuf>) -> Self {
        FileSpec::Required(path.into())
    }

    /// Create an optional file spec
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        FileSpec::Optional(path.into())
    }

    /// Get the path for this file spec
    pub fn path(&self) -> &Path {
        match self {
            FileSpec::Required(p) | FileSpec::Optional(p) => p,
        }
    }

    /// Check if this file spec is optional
    pub fn is_optional(&self) -> bool {
        matches!(self, FileSpec::Optional(_))
    }
}

impl<P: Into<PathBuf>> From<P> for FileSpec {
    fn from(path: P) -> Self {
        FileSpec::Required(path.into())
    }
}

/// A JSON or YAML file flattened into `parent:child` keys.
///
/// Files ending in `.json` are read as JSON, everything else as YAML.
/// Sequences become `parent:0`, `parent:1`, ...; `null` and empty
/// containers become entries without a value.
#[derive(Debug, Clone)]
pub struct FileSource {
    spec: FileSpec,
}

impl FileSource {
    /// Create a source from a file spec
    pub fn new(spec: impl Into<FileSpec>) -> Self {
        Self { spec: spec.into() }
    }

    /// A file that must exist
    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSpec::required(path))
    }

    /// A file that is skipped when missing
    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self::new(FileSpec::optional(path))
    }

    fn is_json(&self) -> bool {
        self.spec
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }
}

impl Source for FileSource {
    fn name(&self) -> String {
        self.spec.path().display().to_string()
    }

    fn entries(&self) -> Result<Vec<ConfigurationEntry>> {
        let path = self.spec.path();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && self.spec.is_optional() => {
                log::debug!("Optional configuration file '{}' not found, skipping", path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::io(path.display().to_string(), e.to_string())
                    .with_help("Check that the file exists and is readable, or mark it optional"));
            }
        };

        let name = self.name();
        let mut entries = Vec::new();
        if self.is_json() {
            let value: serde_json::Value = serde_json::from_str(&content)
                .map_err(|e| Error::source(&name, e.to_string()))?;
            require_mapping(&name, value.is_object() || value.is_null())?;
            flatten_json(&name, &PathKey::root(), &value, &mut entries)?;
        } else {
            let value: serde_yaml::Value = serde_yaml::from_str(&content)
                .map_err(|e| Error::source(&name, e.to_string()))?;
            require_mapping(&name, value.is_mapping() || value.is_null())?;
            flatten_yaml(&name, &PathKey::root(), &value, &mut entries)?;
        }
        Ok(entries)
    }
}

fn require_mapping(name: &str, ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::source(name, "top-level value must be a mapping")
            .with_help("Wrap the values in an object such as {\"Settings\": ...}"))
    }
}

/// Key of the mapping entry `name` under `parent`.
///
/// `name` may itself be `:`-delimited but every segment must be non-empty.
fn child_key(file: &str, parent: &PathKey, name: &str) -> Result<PathKey> {
    let relative = if name.is_empty() {
        Err(Error::path_parse(name, "empty key"))
    } else {
        PathKey::parse(name)
    };

    relative.map(|r| parent.join(&r)).map_err(|e| {
        let full = if parent.is_root() {
            name.to_string()
        } else {
            format!("{}{}{}", parent, DELIMITER, name)
        };
        e.with_path(full)
            .with_help(format!("Rename the key in '{}' so no segment is empty", file))
    })
}

fn leaf(key: &PathKey, value: Option<String>, out: &mut Vec<ConfigurationEntry>) {
    // The root itself never becomes an entry
    if !key.is_root() {
        out.push(ConfigurationEntry {
            key: key.clone(),
            value,
        });
    }
}

fn flatten_json(
    file: &str,
    key: &PathKey,
    value: &serde_json::Value,
    out: &mut Vec<ConfigurationEntry>,
) -> Result<()> {
    use serde_json::Value;

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (name, child) in map {
                flatten_json(file, &child_key(file, key, name)?, child, out)?;
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_json(file, &key.append(&index.to_string()), child, out)?;
            }
        }
        Value::Object(_) | Value::Array(_) | Value::Null => leaf(key, None, out),
        Value::String(s) => leaf(key, Some(s.clone()), out),
        Value::Bool(b) => leaf(key, Some(b.to_string()), out),
        Value::Number(n) => leaf(key, Some(n.to_string()), out),
    }
    Ok(())
}

fn flatten_yaml(
    file: &str,
    key: &PathKey,
    value: &serde_yaml::Value,
    out: &mut Vec<ConfigurationEntry>,
) -> Result<()> {
    use serde_yaml::Value;

    match value {
        Value::Mapping(map) if !map.is_empty() => {
            for (name, child) in map {
                let name = yaml_scalar(name).ok_or_else(|| {
                    Error::source(file, format!("unsupported mapping key under '{}'", key))
                })?;
                flatten_yaml(file, &child_key(file, key, &name)?, child, out)?;
            }
        }
        Value::Sequence(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_yaml(file, &key.append(&index.to_string()), child, out)?;
            }
        }
        Value::Mapping(_) | Value::Sequence(_) | Value::Null => leaf(key, None, out),
        Value::Tagged(tagged) => flatten_yaml(file, key, &tagged.value, out)?,
        scalar => leaf(key, yaml_scalar(scalar), out),
    }
    Ok(())
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Environment variables starting with a prefix.
///
/// The prefix is stripped and `__` in the remaining name becomes `:`, so
/// `APP_Settings__KeyOne` with prefix `APP_` maps to `Settings:KeyOne`.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: String,
}

/// Stands in for `:` in environment variable names
pub const ENV_SEPARATOR: &str = "__";

impl EnvSource {
    /// Variables whose names start with `prefix` (case-sensitive)
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Map an explicit set of variables; [`Source::entries`] passes the process environment
    pub fn entries_from(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Vec<ConfigurationEntry> {
        let mut vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(name, _)| name.starts_with(&self.prefix))
            .collect();
        vars.sort();

        let mut entries = Vec::with_capacity(vars.len());
        for (name, value) in vars {
            let stripped = &name[self.prefix.len()..];
            let key = stripped.replace(ENV_SEPARATOR, &DELIMITER.to_string());
            match PathKey::parse(&key) {
                Ok(path) if !path.is_root() => entries.push(ConfigurationEntry::new(path, value)),
                _ => log::warn!(
                    "Skipping environment variable '{}': it does not map to a valid configuration key",
                    name
                ),
            }
        }
        entries
    }
}

impl Source for EnvSource {
    fn name(&self) -> String {
        format!("environment ({}*)", self.prefix)
    }

    fn entries(&self) -> Result<Vec<ConfigurationEntry>> {
        Ok(self.entries_from(std::env::vars()))
    }
}

/// Command-line style arguments.
///
/// Accepted forms: `key=value`, `--key=value`, `/key=value`, `--key value`
/// and `/key value`. Single-dash switches are rejected.
#[derive(Debug, Clone, Default)]
pub struct ArgsSource {
    args: Vec<String>,
}

impl ArgsSource {
    /// Create a source from raw arguments (without the program name)
    pub fn new<A: Into<String>>(args: impl IntoIterator<Item = A>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Source for ArgsSource {
    fn name(&self) -> String {
        "command line".into()
    }

    fn entries(&self) -> Result<Vec<ConfigurationEntry>> {
        let mut entries = Vec::new();
        let mut args = self.args.iter();

        while let Some(arg) = args.next() {
            let (prefixed, body) = if let Some(rest) = arg.strip_prefix("--") {
                (true, rest)
            } else if let Some(rest) = arg.strip_prefix('/') {
                (true, rest)
            } else if arg.starts_with('-') {
                return Err(Error::source(
                    self.name(),
                    format!("unsupported switch '{}'", arg),
                )
                .with_help("Use --key=value or key=value"));
            } else {
                (false, arg.as_str())
            };

            let (raw_key, value) = match body.split_once('=') {
                Some((k, v)) => (k, v.to_string()),
                None if prefixed => match args.next() {
                    Some(v) => (body, v.clone()),
                    None => {
                        return Err(Error::source(
                            self.name(),
                            format!("missing value for '{}'", arg),
                        ))
                    }
                },
                None => {
                    log::warn!("Ignoring argument '{}': expected key=value", arg);
                    continue;
                }
            };

            let key = PathKey::parse(raw_key)?;
            if key.is_root() {
                return Err(Error::source(self.name(), format!("empty key in '{}'", arg)));
            }
            entries.push(ConfigurationEntry::new(key, value));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn pairs(entries: &[ConfigurationEntry]) -> Vec<(String, Option<String>)> {
        entries
            .iter()
            .map(|e| (e.key.format(), e.value.clone()))
            .collect()
    }

    fn some(k: &str, v: &str) -> (String, Option<String>) {
        (k.to_string(), Some(v.to_string()))
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::new("memory", [("Settings:KeyOne", "1")]);
        assert_eq!(pairs(&source.entries().unwrap()), vec![some("Settings:KeyOne", "1")]);

        let bad = MemorySource::new("memory", [("Settings::KeyOne", "1")]);
        assert_eq!(bad.entries().unwrap_err().kind, ErrorKind::PathParse);
    }

    #[test]
    fn test_file_spec() {
        let required = FileSpec::required("appsettings.json");
        let optional = FileSpec::optional("appsettings.local.json");

        assert!(!required.is_optional());
        assert!(optional.is_optional());
        assert_eq!(required.path(), Path::new("appsettings.json"));
        assert_eq!(FileSpec::from("x.yaml"), FileSpec::required("x.yaml"));
    }

    #[test]
    fn test_json_file_flattens() {
        let temp_dir = std::env::temp_dir().join("confbind_test_json_file");
        std::fs::create_dir_all(&temp_dir).unwrap();
        let path = temp_dir.join("appsettings.json");
        std::fs::write(
            &path,
            r#"{
                "Settings": {
                    "KeyOne": 1,
                    "KeyTwo": true,
                    "KeyThree": "text value",
                    "Empty": {},
                    "Nothing": null
                },
                "SettingsList": ["first", "second", "third"]
            }"#,
        )
        .unwrap();

        let entries = FileSource::required(&path).entries().unwrap();

        assert_eq!(
            pairs(&entries),
            vec![
                some("Settings:KeyOne", "1"),
                some("Settings:KeyTwo", "true"),
                some("Settings:KeyThree", "text value"),
                ("Settings:Empty".to_string(), None),
                ("Settings:Nothing".to_string(), None),
                some("SettingsList:0", "first"),
                some("SettingsList:1", "second"),
                some("SettingsList:2", "third"),
            ]
        );

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_yaml_file_flattens() {
        let temp_dir = std::env::temp_dir().join("confbind_test_yaml_file");
        std::fs::create_dir_all(&temp_dir).unwrap();
        let path = temp_dir.join("appsettings.yaml");
        std::fs::write(
            &path,
            r#"
Settings:
  Order:
    Number: 524
    Address:
      City: Christchurch
  Ports:
    - 80
    - 443
"#,
        )
        .unwrap();

        let entries = FileSource::required(&path).entries().unwrap();

        assert_eq!(
            pairs(&entries),
            vec![
                some("Settings:Order:Number", "524"),
                some("Settings:Order:Address:City", "Christchurch"),
                some("Settings:Ports:0", "80"),
                some("Settings:Ports:1", "443"),
            ]
        );

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_required_file_missing() {
        let path = std::env::temp_dir().join("confbind_test_missing/none.json");

        let err = FileSource::required(&path).entries().unwrap_err();

        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.help.is_some());
    }

    #[test]
    fn test_optional_file_missing() {
        let path = std::env::temp_dir().join("confbind_test_missing/none.yaml");

        assert!(FileSource::optional(&path).entries().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = std::env::temp_dir().join("confbind_test_malformed");
        std::fs::create_dir_all(&temp_dir).unwrap();
        let broken = temp_dir.join("broken.json");
        std::fs::write(&broken, "{ \"Settings\": ").unwrap();
        let scalar = temp_dir.join("scalar.yaml");
        std::fs::write(&scalar, "just a string").unwrap();

        assert_eq!(FileSource::required(&broken).entries().unwrap_err().kind, ErrorKind::Source);
        assert_eq!(FileSource::required(&scalar).entries().unwrap_err().kind, ErrorKind::Source);

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_file_rejects_empty_key_segments() {
        let temp_dir = std::env::temp_dir().join("confbind_test_bad_keys");
        std::fs::create_dir_all(&temp_dir).unwrap();
        let empty = temp_dir.join("empty.json");
        std::fs::write(&empty, r#"{"Settings": {"": "x", "KeyOne": "1"}}"#).unwrap();
        let doubled = temp_dir.join("doubled.yaml");
        std::fs::write(&doubled, "Settings:\n  a::b: 1\n").unwrap();

        let err = FileSource::required(&empty).entries().unwrap_err();
        assert_eq!(err.kind, ErrorKind::PathParse);
        assert_eq!(err.path.as_deref(), Some("Settings:"));
        assert!(err.help.as_deref().unwrap().contains("empty.json"));

        let err = FileSource::required(&doubled).entries().unwrap_err();
        assert_eq!(err.kind, ErrorKind::PathParse);
        assert_eq!(err.path.as_deref(), Some("Settings:a::b"));
        assert!(err.help.as_deref().unwrap().contains("doubled.yaml"));

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_env_source_maps_names() {
        let source = EnvSource::new("CONFBIND_");
        let vars = vec![
            ("CONFBIND_Settings__KeyOne".to_string(), "1".to_string()),
            ("CONFBIND_Settings__Server__Name".to_string(), "web".to_string()),
            ("OTHER_Settings__KeyOne".to_string(), "2".to_string()),
            ("confbind_lower".to_string(), "3".to_string()),
        ];

        assert_eq!(
            pairs(&source.entries_from(vars)),
            vec![
                some("Settings:KeyOne", "1"),
                some("Settings:Server:Name", "web"),
            ]
        );
    }

    #[test]
    fn test_env_source_skips_invalid_names() {
        let source = EnvSource::new("CONFBIND_");
        let vars = vec![
            ("CONFBIND_".to_string(), "root".to_string()),
            ("CONFBIND_Bad____Key".to_string(), "x".to_string()),
            ("CONFBIND_Trailing__".to_string(), "x".to_string()),
            ("CONFBIND_Good".to_string(), "ok".to_string()),
        ];

        assert_eq!(pairs(&source.entries_from(vars)), vec![some("Good", "ok")]);
    }

    #[test]
    fn test_env_source_reads_process_environment() {
        // Cargo sets these for every test process
        let entries = EnvSource::new("CARGO_PKG_").entries().unwrap();

        assert!(pairs(&entries).contains(&some("NAME", env!("CARGO_PKG_NAME"))));
    }

    #[test]
    fn test_args_source_forms() {
        let source = ArgsSource::new([
            "Settings:KeyOne=1",
            "--Settings:KeyTwo=true",
            "/Settings:KeyThree=a=b",
            "--Settings:Server:Name",
            "web",
            "/Settings:Server:OS",
            "linux",
            "stray",
        ]);

        assert_eq!(
            pairs(&source.entries().unwrap()),
            vec![
                some("Settings:KeyOne", "1"),
                some("Settings:KeyTwo", "true"),
                some("Settings:KeyThree", "a=b"),
                some("Settings:Server:Name", "web"),
                some("Settings:Server:OS", "linux"),
            ]
        );
    }

    #[test]
    fn test_args_source_errors() {
        let short = ArgsSource::new(["-k=v"]).entries().unwrap_err();
        assert_eq!(short.kind, ErrorKind::Source);

        let missing = ArgsSource::new(["--Settings:KeyOne"]).entries().unwrap_err();
        assert_eq!(missing.kind, ErrorKind::Source);

        let malformed = ArgsSource::new(["Settings::KeyOne=1"]).entries().unwrap_err();
        assert_eq!(malformed.kind, ErrorKind::PathParse);

        let empty = ArgsSource::new(["=1"]).entries().unwrap_err();
        assert_eq!(empty.kind, ErrorKind::Source);
    }
}
