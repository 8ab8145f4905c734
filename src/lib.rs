//! Core library surface for the Recipe Manager TUI application.
//!
//! The binary only parses configuration and hands a connection provider to the
//! UI; everything else lives here so integration tests can drive the storage
//! layer directly.
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod ui;

/// Storage entry points used by `main.rs`.
pub use db::{ConnectionError, ConnectionProvider};

pub use config::{Cli, Config};

/// The domain types the other layers pass around.
pub use models::{Author, Ingredient, Recipe, RecipeDetails, RecipeIngredient, ValidationError};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
