//! Pipeline definitions and their builder.

use crate::agents::{AgentDescriptor, AgentInfo};
use crate::context::{ExecutionContext, RequestParameters};
use crate::errors::{ContractErrorInfo, MissingContextVariable, PipelineValidationError};
use std::collections::{HashMap, HashSet};

/// A validated, ordered list of agents.
///
/// Every placeholder in agent k's instruction resolves to a declared input
/// or to the output key of an agent before k.
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    name: String,
    description: Option<String>,
    inputs: Vec<String>,
    agents: Vec<AgentDescriptor>,
}

impl PipelineDefinition {
    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared input variables.
    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Returns the agents in execution order.
    #[must_use]
    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    /// Returns the number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Always false for a built pipeline; provided for symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns agent names in execution order.
    #[must_use]
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(AgentDescriptor::name).collect()
    }

    /// Returns the agent descriptions for clients.
    #[must_use]
    pub fn describe(&self) -> Vec<AgentInfo> {
        self.agents
            .iter()
            .enumerate()
            .map(|(index, agent)| agent.info(index))
            .collect()
    }

    /// Checks that `ctx` provides every declared input.
    ///
    /// # Errors
    ///
    /// Returns `MissingContextVariable` for the first absent input.
    pub fn check_inputs(&self, ctx: &ExecutionContext) -> Result<(), MissingContextVariable> {
        match self.inputs.iter().find(|input| !ctx.contains_key(input)) {
            Some(missing) => Err(MissingContextVariable::new(missing.as_str())),
            None => Ok(()),
        }
    }
}

/// Builder for creating validated pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    description: Option<String>,
    inputs: Vec<String>,
    agents: Vec<AgentDescriptor>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            inputs: Vec::new(),
            agents: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a variable supplied by the initial context.
    #[must_use]
    pub fn input(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.inputs.contains(&name) {
            self.inputs.push(name);
        }
        self
    }

    /// Declares every field of [`RequestParameters`] as an input.
    #[must_use]
    pub fn request_inputs(self) -> Self {
        RequestParameters::VARIABLES
            .iter()
            .fold(self, |builder, name| builder.input(*name))
    }

    /// Appends an agent.
    #[must_use]
    pub fn agent(mut self, agent: AgentDescriptor) -> Self {
        self.agents.push(agent);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validates and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is empty, names or output keys
    /// repeat, an output key shadows an input, or a placeholder refers to a
    /// later agent's output or to nothing at all.
    pub fn build(self) -> Result<PipelineDefinition, PipelineValidationError> {
        if self.agents.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no agents")
                .with_error_info(
                    ContractErrorInfo::new("PIPELINE-001-EMPTY", "Cannot build an empty pipeline")
                        .with_fix_hint("Add at least one agent to the pipeline before building."),
                ));
        }

        let mut names = HashSet::new();
        let mut producers: HashMap<&str, usize> = HashMap::new();
        for (index, agent) in self.agents.iter().enumerate() {
            if !names.insert(agent.name()) {
                return Err(PipelineValidationError::new(format!(
                    "Agent '{}' appears more than once",
                    agent.name()
                ))
                .with_agents(vec![agent.name().to_string()])
                .with_error_info(ContractErrorInfo::new(
                    "PIPELINE-002-DUPLICATE_AGENT",
                    format!("Duplicate agent name '{}'", agent.name()),
                )));
            }

            let key = agent.output_key();
            let shadows_input = self.inputs.iter().any(|input| input == key);
            if let Some(&first) = producers.get(key) {
                return Err(duplicate_output(key, &self.agents[first], agent));
            }
            if shadows_input {
                return Err(PipelineValidationError::new(format!(
                    "Agent '{}' output key '{}' collides with a declared input",
                    agent.name(),
                    key
                ))
                .with_agents(vec![agent.name().to_string()])
                .with_error_info(ContractErrorInfo::new(
                    "PIPELINE-003-DUPLICATE_OUTPUT",
                    format!("Output key '{key}' is already an input"),
                )));
            }
            producers.insert(key, index);
        }

        for (index, agent) in self.agents.iter().enumerate() {
            for placeholder in agent.instruction().placeholders() {
                if self.inputs.iter().any(|input| input == placeholder) {
                    continue;
                }
                match producers.get(placeholder) {
                    Some(&producer) if producer < index => {}
                    Some(&producer) => {
                        let later = &self.agents[producer];
                        return Err(PipelineValidationError::new(format!(
                            "Agent '{}' references '{}', which is produced by '{}' at or after its own position",
                            agent.name(),
                            placeholder,
                            later.name()
                        ))
                        .with_agents(vec![agent.name().to_string(), later.name().to_string()])
                        .with_error_info(
                            ContractErrorInfo::new(
                                "PIPELINE-004-FORWARD_REF",
                                format!("Forward reference to '{placeholder}'"),
                            )
                            .with_fix_hint("Move the producing agent earlier in the pipeline.")
                            .with_context_entry("variable", placeholder),
                        ));
                    }
                    None => {
                        return Err(PipelineValidationError::new(format!(
                            "Agent '{}' references unknown variable '{}'",
                            agent.name(),
                            placeholder
                        ))
                        .with_agents(vec![agent.name().to_string()])
                        .with_error_info(
                            ContractErrorInfo::new(
                                "PIPELINE-005-UNRESOLVED",
                                format!("Missing context variable '{placeholder}'"),
                            )
                            .with_fix_hint(
                                "Declare it as an input or add an agent that produces it.",
                            )
                            .with_context_entry("variable", placeholder),
                        ));
                    }
                }
            }
        }

        Ok(PipelineDefinition {
            name: self.name,
            description: self.description,
            inputs: self.inputs,
            agents: self.agents,
        })
    }
}

fn duplicate_output(
    key: &str,
    first: &AgentDescriptor,
    second: &AgentDescriptor,
) -> PipelineValidationError {
    PipelineValidationError::new(format!(
        "Agents '{}' and '{}' both publish '{}'",
        first.name(),
        second.name(),
        key
    ))
    .with_agents(vec![first.name().to_string(), second.name().to_string()])
    .with_error_info(
        ContractErrorInfo::new(
            "PIPELINE-003-DUPLICATE_OUTPUT",
            format!("Output key '{key}' is not unique"),
        )
        .with_fix_hint("Give each agent its own output key."),
    )
}
