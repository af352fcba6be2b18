pub mod app_config;
pub mod memory;
pub mod rest;

pub use memory::InMemoryBackend;
pub use rest::{RestBackend, RestError};
