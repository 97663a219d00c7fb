//! Govee Deck — Stream Deck actions driving Govee lights over the Govee OpenAPI.

pub mod actions;
pub mod client;
pub mod config;
pub mod dial;
pub mod error;
pub mod host;
pub mod plugin;
pub mod protocol;
pub mod settings;

pub use error::GoveeDeckError;
