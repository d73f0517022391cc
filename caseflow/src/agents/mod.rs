//! Agents and the model-call capability they run against.

mod descriptor;
#[cfg(feature = "gemini")]
mod gemini;
mod model;

pub use descriptor::{AgentDescriptor, AgentInfo};
#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, DEFAULT_GEMINI_BASE_URL};
pub use model::ModelClient;

#[cfg(test)]
pub use model::MockModelClient;
