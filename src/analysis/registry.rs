//! Process-wide analyzer registry and JSON factories
//!
//! Analyzer types register a factory under `(type_name, format)`. The map is
//! populated with the built-in types on first use and may be extended through
//! [`register`] at init time; afterwards it is read-only in practice.

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::error;

use super::analyzer::Analyzer;
use super::delimiter::{DelimiterAnalyzer, DelimiterOptions};
use super::lowercase::LowercaseAnalyzer;
use super::pipeline::PipelineTokenStream;
use super::text::{TextAnalyzer, TextOptions};
use crate::error::{GristError, Result};

/// Configuration format a factory accepts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    Json,
}

/// Factory building an analyzer from a configuration document
pub type AnalyzerFactory = fn(&Value) -> Result<Box<dyn Analyzer>>;

static REGISTRY: LazyLock<RwLock<HashMap<(String, ConfigFormat), AnalyzerFactory>>> =
    LazyLock::new(|| {
        let mut map: HashMap<(String, ConfigFormat), AnalyzerFactory> = HashMap::new();
        map.insert(("delimiter".to_string(), ConfigFormat::Json), make_delimiter);
        map.insert(("lowercase".to_string(), ConfigFormat::Json), make_lowercase);
        map.insert(("text".to_string(), ConfigFormat::Json), make_text);
        map.insert(("pipeline".to_string(), ConfigFormat::Json), make_pipeline);
        RwLock::new(map)
    });

/// Register a factory for an analyzer type. Intended for process init;
/// replaces any previous registration for the same key.
pub fn register(type_name: &str, format: ConfigFormat, factory: AnalyzerFactory) {
    REGISTRY
        .write()
        .insert((type_name.to_string(), format), factory);
}

/// Build an analyzer of the given registered type from `config`.
pub fn get(type_name: &str, format: ConfigFormat, config: &Value) -> Result<Box<dyn Analyzer>> {
    let factory = REGISTRY
        .read()
        .get(&(type_name.to_string(), format))
        .copied();
    match factory {
        Some(factory) => factory(config),
        None => {
            error!(type_name, "unknown analyzer type");
            Err(GristError::UnknownAnalyzer(type_name.to_string()))
        }
    }
}

fn make_delimiter(config: &Value) -> Result<Box<dyn Analyzer>> {
    let options: DelimiterOptions = serde_json::from_value(config.clone())?;
    if options.delimiter.is_empty() {
        error!("empty delimiter in analyzer configuration");
        return Err(GristError::Config("delimiter must not be empty".to_string()));
    }
    Ok(Box::new(DelimiterAnalyzer::new(options)))
}

fn make_lowercase(config: &Value) -> Result<Box<dyn Analyzer>> {
    if !config.is_object() && !config.is_null() {
        error!("lowercase analyzer takes an object configuration");
        return Err(GristError::Config(
            "lowercase analyzer configuration must be an object".to_string(),
        ));
    }
    Ok(Box::new(LowercaseAnalyzer::new()))
}

fn make_text(config: &Value) -> Result<Box<dyn Analyzer>> {
    let options: TextOptions = if config.is_null() {
        TextOptions::default()
    } else {
        serde_json::from_value(config.clone())?
    };
    Ok(Box::new(TextAnalyzer::new(options)))
}

/// Build a pipeline from a JSON document shaped as
/// `{ "pipeline": [ { "type": "<name>", "properties": <object> }, … ] }`.
fn make_pipeline(config: &Value) -> Result<Box<dyn Analyzer>> {
    let Some(obj) = config.as_object() else {
        error!("pipeline configuration is not an object");
        return Err(GristError::Config(
            "pipeline configuration must be an object".to_string(),
        ));
    };
    let Some(members) = obj.get("pipeline").and_then(Value::as_array) else {
        error!("pipeline configuration is missing the 'pipeline' array");
        return Err(GristError::Config(
            "pipeline configuration requires a 'pipeline' array".to_string(),
        ));
    };

    let mut analyzers = Vec::with_capacity(members.len());
    for member in members {
        let Some(member) = member.as_object() else {
            error!("pipeline member is not an object");
            return Err(GristError::Config(
                "each pipeline member must be an object".to_string(),
            ));
        };
        let Some(type_name) = member.get("type").and_then(Value::as_str) else {
            error!("pipeline member is missing a string 'type'");
            return Err(GristError::Config(
                "each pipeline member requires a string 'type'".to_string(),
            ));
        };
        let Some(properties) = member.get("properties") else {
            error!(type_name, "pipeline member is missing 'properties'");
            return Err(GristError::Config(
                "each pipeline member requires 'properties'".to_string(),
            ));
        };
        analyzers.push(get(type_name, ConfigFormat::Json, properties)?);
    }

    Ok(Box::new(PipelineTokenStream::new(analyzers)?))
}
