pub mod webhook_commands;

pub use webhook_commands::*;
