//! Parameter store repository
//!
//! Carries validated token parameters from the entry step to the deploy step.

use crate::domain::entities::TokenParameters;
use crate::shared::error::DeployError;

/// Parameter store trait
pub trait ParameterStore: Send + Sync {
    /// Persist parameters under the session key, replacing any previous value
    fn save(&self, params: &TokenParameters) -> Result<(), DeployError>;

    /// Load the persisted parameters, `None` when nothing was saved
    fn load(&self) -> Result<Option<TokenParameters>, DeployError>;

    /// Forget the persisted parameters
    fn clear(&self) -> Result<(), DeployError>;
}
