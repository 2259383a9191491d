pub mod config;
pub mod election;
pub mod repl;

// Public exports
pub use config::Config;
pub use election::{Election, ElectionConfig, ElectionError, NodeReport, NodeRole};
pub use repl::Repl;
