pub mod config;
pub mod event;

pub use config::*;
pub use event::*;
