// Repository Port Traits (Interfaces)
// Define what the domain needs from infrastructure

pub mod repositories;

pub use repositories::*;
