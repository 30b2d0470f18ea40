//! core
//!
//! Shared configuration for every command.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading

pub mod config;
