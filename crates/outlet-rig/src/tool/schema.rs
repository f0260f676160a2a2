//! Schema generation and argument validation.

use jsonschema::Validator;
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::Value;

use super::{OutletTool, ToolDefinition};
use crate::{Error, Result};

/// Generates the draft-07 JSON schema of `T`.
///
/// Top-level `$schema` and `title` keys are dropped; providers expect a bare
/// object schema in tool definitions.
pub fn parameters_schema<T: JsonSchema>() -> Result<Value> {
    let mut generator = SchemaSettings::draft07().into_generator();
    let schema = generator.root_schema_for::<T>();
    let mut value = serde_json::to_value(&schema)?;

    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }

    Ok(value)
}

/// Builds the tool definition advertised to the model.
pub fn definition_of<T: OutletTool>() -> Result<ToolDefinition> {
    Ok(ToolDefinition {
        name: T::NAME.to_string(),
        description: T::DESCRIPTION.to_string(),
        parameters: parameters_schema::<T::Args>()?,
    })
}

/// Compiles a validator for a parameter schema.
pub(crate) fn compile(tool: &str, parameters: &Value) -> Result<Validator> {
    Validator::new(parameters).map_err(|e| Error::tool(tool, format!("invalid schema: {e}")))
}

/// Collects every validation error for `arguments`.
pub(crate) fn validate(validator: &Validator, arguments: &Value) -> Vec<String> {
    validator
        .iter_errors(arguments)
        .map(|e| e.to_string())
        .collect()
}
