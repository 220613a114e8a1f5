//! Domain entities

pub mod token_parameters;
pub mod artifact;
pub mod session;
pub mod fee_quote;
pub mod deployment;

pub use token_parameters::*;
pub use artifact::*;
pub use session::*;
pub use fee_quote::*;
pub use deployment::*;
