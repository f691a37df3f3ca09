//! Build-backend config settings.
//!
//! The frontend forwards `--config-setting=KEY=VALUE` pairs to the backend untouched; a typo
//! there is silently ignored or fails deep inside the backend. The harness validates the
//! pairs it forwards against a table of the backend's settings, and can render that table
//! as a JSON Schema (`pep518-check schema`).
//!
//! Keys are dotted paths (`logging.level`). `_` and `-` are interchangeable in a key.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::error::{HarnessError, HarnessResult};

/// Value type of a leaf setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    String,
    Bool,
    /// Repeatable string values
    List,
    /// One of a fixed set of strings (case-sensitive)
    Enum(&'static [&'static str]),
    /// Table of user-named entries (`cmake.define.NAME`), each holding the inner kind
    Map(&'static SettingKind),
}

/// Default of a leaf setting, as it appears in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingDefault {
    None,
    Str(&'static str),
    Bool(bool),
}

/// A leaf setting.
#[derive(Debug, Clone, Copy)]
pub struct SettingField {
    pub name: &'static str,
    pub kind: SettingKind,
    pub default: SettingDefault,
    pub doc: &'static str,
}

/// A node of the settings tree.
#[derive(Debug, Clone, Copy)]
pub enum SettingNode {
    Field(SettingField),
    Group {
        name: &'static str,
        children: &'static [SettingNode],
    },
}

impl SettingNode {
    pub fn name(&self) -> &'static str {
        match self {
            SettingNode::Field(field) => field.name,
            SettingNode::Group { name, .. } => name,
        }
    }
}

const fn field(name: &'static str, kind: SettingKind, default: SettingDefault, doc: &'static str) -> SettingNode {
    SettingNode::Field(SettingField {
        name,
        kind,
        default,
        doc,
    })
}

/// Levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["NOTSET", "DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Settings understood by the sample project's build backend.
pub static SETTINGS: &[SettingNode] = &[
    SettingNode::Group {
        name: "cmake",
        children: &[
            field(
                "minimum-version",
                SettingKind::String,
                SettingDefault::Str("3.15"),
                "The minimum version of CMake to use.",
            ),
            field(
                "args",
                SettingKind::List,
                SettingDefault::None,
                "A list of args to pass to CMake when configuring the project.",
            ),
            field(
                "verbose",
                SettingKind::Bool,
                SettingDefault::Bool(false),
                "Verbose printout when building.",
            ),
            field(
                "build-type",
                SettingKind::String,
                SettingDefault::Str("Release"),
                "The build type to use when building the project.",
            ),
            field(
                "source-dir",
                SettingKind::String,
                SettingDefault::None,
                "The source directory to use when building the project.",
            ),
            field(
                "define",
                SettingKind::Map(&SettingKind::String),
                SettingDefault::None,
                "A table of defines to pass to CMake when configuring the project.",
            ),
        ],
    },
    SettingNode::Group {
        name: "ninja",
        children: &[
            field(
                "minimum-version",
                SettingKind::String,
                SettingDefault::Str("1.5"),
                "The minimum version of Ninja to use.",
            ),
            field(
                "make-fallback",
                SettingKind::Bool,
                SettingDefault::Bool(true),
                "Use Make as a fallback if a suitable Ninja executable is not found.",
            ),
        ],
    },
    SettingNode::Group {
        name: "logging",
        children: &[field(
            "level",
            SettingKind::Enum(LOG_LEVELS),
            SettingDefault::Str("WARNING"),
            "The logging level to display.",
        )],
    },
    SettingNode::Group {
        name: "sdist",
        children: &[
            field(
                "include",
                SettingKind::List,
                SettingDefault::None,
                "Files to include in the SDist even if they are skipped by default.",
            ),
            field(
                "exclude",
                SettingKind::List,
                SettingDefault::None,
                "Files to exclude from the SDist even if they are included by default.",
            ),
            field(
                "reproducible",
                SettingKind::Bool,
                SettingDefault::Bool(true),
                "Make reproducible SDists (fixed timestamps and ownership).",
            ),
        ],
    },
    SettingNode::Group {
        name: "wheel",
        children: &[
            field(
                "packages",
                SettingKind::List,
                SettingDefault::None,
                "A list of packages to auto-copy into the wheel.",
            ),
            field(
                "py-api",
                SettingKind::String,
                SettingDefault::None,
                "The Python tags, or an ABI3 tag such as cp37 for the limited API.",
            ),
            field(
                "expand-macos-universal-tags",
                SettingKind::Bool,
                SettingDefault::Bool(false),
                "Fill out extra tags that are not required on macOS universal2 wheels.",
            ),
        ],
    },
    field(
        "strict-config",
        SettingKind::Bool,
        SettingDefault::Bool(true),
        "Strictly check all config options.",
    ),
    field(
        "experimental",
        SettingKind::Bool,
        SettingDefault::Bool(false),
        "Enable early previews of features not finalized yet.",
    ),
    field(
        "minimum-version",
        SettingKind::String,
        SettingDefault::None,
        "If set, this will provide a method for backward compatibility.",
    ),
    field(
        "build-dir",
        SettingKind::String,
        SettingDefault::None,
        "The build directory. Defaults to a temporary directory.",
    ),
];

/// Accepted spellings of boolean setting values.
const TRUTHY: &[&str] = &["true", "1", "yes", "on"];
const FALSY: &[&str] = &["false", "0", "no", "off"];

/// Parse a boolean setting value the way the backend does (case-insensitive).
pub fn parse_bool(value: &str) -> Option<bool> {
    let lower = value.trim().to_ascii_lowercase();
    if TRUTHY.contains(&lower.as_str()) {
        Some(true)
    } else if FALSY.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Replace `_` with `-` in every segment of a dotted key.
pub fn normalize_key(key: &str) -> String {
    key.trim().replace('_', "-")
}

/// Find the node at a dotted path. A map field also matches its path followed by one
/// entry name (`cmake.define.BUILD_TESTING`).
pub fn lookup(key: &str) -> Option<&'static SettingNode> {
    resolve(key).map(|(node, _)| node)
}

/// Like [`lookup`], also returning the map entry name when the path ends in one.
/// Entry names are user-chosen and keep their spelling.
fn resolve(key: &str) -> Option<(&'static SettingNode, Option<&str>)> {
    let segments: Vec<&str> = key.trim().split('.').collect();
    let mut nodes: &'static [SettingNode] = SETTINGS;
    let mut found: Option<&'static SettingNode> = None;
    for (i, segment) in segments.iter().enumerate() {
        if let Some(node) = found {
            if let SettingNode::Field(field) = node {
                // Only a map takes one more segment; other leaves take none
                let last = i + 1 == segments.len();
                return match field.kind {
                    SettingKind::Map(_) if last && !segment.is_empty() => Some((node, Some(*segment))),
                    _ => None,
                };
            }
        }
        let name = normalize_key(segment);
        let node = nodes.iter().find(|n| n.name() == name)?;
        if let SettingNode::Group { children, .. } = node {
            nodes = children;
        }
        found = Some(node);
    }
    found.map(|node| (node, None))
}

/// Why `value` does not fit `kind`, if it does not.
fn check_value(kind: SettingKind, value: &str) -> Result<(), String> {
    match kind {
        SettingKind::Enum(allowed) if !allowed.contains(&value) => {
            Err(format!("expected one of {}", allowed.join(", ")))
        }
        SettingKind::Bool if parse_bool(value).is_none() => {
            Err("expected a boolean (true/false/1/0/yes/no/on/off)".to_string())
        }
        SettingKind::Map(inner) => check_value(*inner, value),
        _ => Ok(()),
    }
}

// ============================================================================
// Config setting pairs
// ============================================================================

/// One `KEY=VALUE` pair forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSetting {
    pub key: String,
    pub value: String,
}

impl ConfigSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `KEY=VALUE`, splitting on the first `=`. The value may be empty.
    pub fn parse(text: &str) -> HarnessResult<Self> {
        let (key, value) = text.split_once('=').ok_or_else(|| HarnessError::InvalidSetting {
            setting: text.to_string(),
            reason: "expected KEY=VALUE".to_string(),
        })?;
        if key.trim().is_empty() {
            return Err(HarnessError::InvalidSetting {
                setting: text.to_string(),
                reason: "empty key".to_string(),
            });
        }
        Ok(Self::new(key.trim(), value))
    }

    /// Check the pair against [`SETTINGS`].
    pub fn validate(&self) -> HarnessResult<()> {
        let invalid = |reason: String| HarnessError::InvalidSetting {
            setting: self.to_string(),
            reason,
        };
        let (field, entry) = match resolve(&self.key) {
            Some((SettingNode::Field(field), entry)) => (field, entry),
            Some((SettingNode::Group { .. }, _)) => {
                return Err(invalid(format!("`{}` is a table, not a setting", self.key)));
            }
            None => return Err(invalid(format!("unknown key `{}`", self.key))),
        };
        if matches!(field.kind, SettingKind::Map(_)) && entry.is_none() {
            return Err(invalid(format!("`{}` takes named entries (`{}.NAME`)", self.key, self.key)));
        }
        check_value(field.kind, &self.value).map_err(invalid)
    }

    /// The frontend flag carrying this pair.
    pub fn to_arg(&self) -> String {
        format!("--config-setting={}", self)
    }
}

impl fmt::Display for ConfigSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for ConfigSetting {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let setting = Self::parse(s)?;
        setting.validate()?;
        Ok(setting)
    }
}

// ============================================================================
// JSON Schema
// ============================================================================

/// Render [`SETTINGS`] as a JSON Schema object.
pub fn json_schema() -> Value {
    group_schema(SETTINGS)
}

fn group_schema(children: &[SettingNode]) -> Value {
    let mut props = Map::new();
    for child in children {
        let schema = match child {
            SettingNode::Field(field) => field_schema(field),
            SettingNode::Group { children, .. } => group_schema(children),
        };
        props.insert(child.name().to_string(), schema);
    }
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": props,
    })
}

fn kind_schema(kind: SettingKind) -> Value {
    match kind {
        SettingKind::String => json!({ "type": "string" }),
        SettingKind::Bool => json!({ "type": "boolean" }),
        SettingKind::List => json!({ "type": "array", "items": { "type": "string" } }),
        SettingKind::Enum(values) => json!({ "enum": values }),
        SettingKind::Map(inner) => json!({
            "type": "object",
            "patternProperties": { ".+": kind_schema(*inner) },
        }),
    }
}

fn field_schema(field: &SettingField) -> Value {
    let mut schema = kind_schema(field.kind);
    if let Value::Object(map) = &mut schema {
        match field.default {
            SettingDefault::None => {}
            SettingDefault::Str(s) => {
                map.insert("default".to_string(), json!(s));
            }
            SettingDefault::Bool(b) => {
                map.insert("default".to_string(), json!(b));
            }
        }
        map.insert("description".to_string(), json!(field.doc));
    }
    schema
}
