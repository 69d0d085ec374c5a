pub mod chain;
pub mod config;
pub mod contracts;
pub mod deployer;
pub mod error;
pub mod interact;
pub mod network;
pub mod oracle;
pub mod orchestrator;
pub mod registry;
pub mod verify;

pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
