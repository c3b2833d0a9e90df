//! Shared configuration for the screening workspace.

pub mod config;

pub use config::Config;
