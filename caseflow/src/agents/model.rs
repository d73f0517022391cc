//! The model-call collaborator.

use crate::errors::ModelError;
use async_trait::async_trait;

/// Generates text for a rendered instruction.
///
/// Streaming, retries and rate limiting are the implementation's concern;
/// the executor only sees the final text or an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one instruction to the named model.
    async fn call(&self, model_id: &str, instruction: &str) -> Result<String, ModelError>;
}
