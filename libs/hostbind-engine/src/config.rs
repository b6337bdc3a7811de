use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::bindings::AuthLevel;
use crate::decl::{BindingDirection, DataType};
use crate::error::EngineError;

/// Root configuration: the functions of one app and their bindings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Default script file for functions that don't name one.
    #[serde(default)]
    pub script_file: Option<String>,

    #[serde(default)]
    pub functions: Vec<FunctionConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionConfig {
    pub name: String,
    #[serde(default)]
    pub script_file: Option<String>,
    /// Applied to an `httpTrigger` binding that sets no `auth_level` itself.
    #[serde(default)]
    pub auth_level: Option<AuthLevel>,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BindingConfig {
    #[serde(rename = "type")]
    pub binding_type: String,
    pub name: String,
    #[serde(default)]
    pub direction: Option<BindingDirection>,
    #[serde(default)]
    pub data_type: Option<DataType>,
    /// Binding-specific settings, snake_case as written.
    #[serde(flatten)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

/// A configuration file format.
pub trait ConfigParser {
    /// File extensions handled by this parser, without the dot.
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<AppConfig, EngineError>;
}

pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<AppConfig, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::load_with(path, &[&TomlParser])
    }

    /// Load configuration, choosing the parser by file extension.
    pub fn load_with(
        path: impl AsRef<Path>,
        parsers: &[&dyn ConfigParser],
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let display = path.display();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let parser = parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .ok_or_else(|| EngineError::Config(format!("{display}: unsupported config format '{ext}'")))?;

        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{display}: {e}")))?;
        parser.parse(&content).map_err(|e| e.with_context(display))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        TomlParser.parse(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const SAMPLE: &str = r#"
script_file = "app.rs"

[[functions]]
name = "resize"
auth_level = "anonymous"

[[functions.bindings]]
type = "blobTrigger"
name = "image"
path = "uploads/{name}"
connection = "Storage"

[[functions.bindings]]
type = "blob"
name = "thumb"
direction = "out"
data_type = "binary"
path = "thumbs/{name}"
"#;

    #[test]
    fn parses_functions_and_bindings() {
        let cfg = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.script_file.as_deref(), Some("app.rs"));
        let f = &cfg.functions[0];
        assert_eq!(f.auth_level, Some(AuthLevel::Anonymous));
        assert_eq!(f.bindings.len(), 2);

        let out = &f.bindings[1];
        assert_eq!(out.direction, Some(BindingDirection::Out));
        assert_eq!(out.data_type, Some(DataType::Binary));
        assert_eq!(out.settings.get("path"), Some(&json!("thumbs/{name}")));
        assert!(!out.settings.contains_key("direction"));
    }

    #[test]
    fn rejects_unknown_direction() {
        let err = AppConfig::parse(
            "[[functions]]\nname = \"f\"\n[[functions.bindings]]\ntype = \"queue\"\nname = \"q\"\ndirection = \"sideways\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn empty_config_has_no_functions() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }
}
