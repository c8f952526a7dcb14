// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between callers and Services
// - Commands accept DTOs, return DTOs
// - Commands handle error conversion for callers
// - Commands NEVER contain business logic

pub mod library_commands;
pub mod statistics_commands;

pub use library_commands::*;
pub use statistics_commands::*;
