//! Shared configuration for the rulify workspace.

pub mod config;

pub use config::{load_dotenv, EngineConfig};
