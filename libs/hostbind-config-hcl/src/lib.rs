//! HCL front end for function-app configuration.

use hostbind_engine::config::{AppConfig, ConfigParser};
use hostbind_engine::error::EngineError;

pub struct HclParser;

impl ConfigParser for HclParser {
    fn extensions(&self) -> &[&str] {
        &["hcl"]
    }

    fn parse(&self, content: &str) -> Result<AppConfig, EngineError> {
        hcl::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }
}
