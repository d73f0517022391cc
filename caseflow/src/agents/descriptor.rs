//! Agent descriptors.

use crate::template::Template;
use serde::{Deserialize, Serialize};

/// One stage of a pipeline: an instruction template bound to a model.
///
/// Descriptors are built once at startup and never change. The agent's
/// generated text is published under `output_key`.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    name: String,
    model_id: String,
    instruction: Template,
    output_key: String,
    display_name: Option<String>,
    description: Option<String>,
}

impl AgentDescriptor {
    /// Creates a new agent descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        model_id: impl Into<String>,
        instruction_template: impl Into<Template>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            instruction: instruction_template.into(),
            output_key: output_key.into(),
            display_name: None,
            description: None,
        }
    }

    /// Sets the human-facing name shown to clients.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets a one-line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the agent name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the model identifier passed to the model client.
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Returns the parsed instruction template.
    #[must_use]
    pub fn instruction(&self) -> &Template {
        &self.instruction
    }

    /// Returns the context key the agent's output is published under.
    #[must_use]
    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Returns the display name, falling back to the agent name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Serializable summary for the agents endpoint.
    #[must_use]
    pub fn info(&self, index: usize) -> AgentInfo {
        AgentInfo {
            index,
            name: self.name.clone(),
            display_name: self.display_name().to_string(),
            model_id: self.model_id.clone(),
            output_key: self.output_key.clone(),
            description: self.description.clone(),
            inputs: self
                .instruction
                .placeholders()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Public description of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Position in the pipeline, 0-based.
    pub index: usize,
    /// Technical name.
    pub name: String,
    /// Human-facing name.
    pub display_name: String,
    /// Model identifier.
    pub model_id: String,
    /// Key the output is published under.
    pub output_key: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Variables the instruction reads.
    pub inputs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_accessors() {
        let agent = AgentDescriptor::new("b", "gemini-2.0-flash", "uses {x}", "y")
            .with_display_name("Agent B");

        assert_eq!(agent.name(), "b");
        assert_eq!(agent.model_id(), "gemini-2.0-flash");
        assert_eq!(agent.output_key(), "y");
        assert_eq!(agent.display_name(), "Agent B");
        assert_eq!(agent.instruction().placeholders(), vec!["x"]);
    }

    #[test]
    fn test_display_name_defaults_to_name() {
        let agent = AgentDescriptor::new("a", "m", "text", "x");
        assert_eq!(agent.display_name(), "a");
        assert!(agent.description().is_none());
    }

    #[test]
    fn test_info_lists_inputs() {
        let agent = AgentDescriptor::new("c", "m", "uses {x} and {y}", "z")
            .with_description("combines x and y");
        let info = agent.info(2);

        assert_eq!(info.index, 2);
        assert_eq!(info.inputs, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(info.description.as_deref(), Some("combines x and y"));
    }
}
