pub mod api_connection;
pub mod cli;
pub mod config;
pub mod preferences;
pub mod request;
pub mod recipe;
pub mod prompt_builder;
pub mod recipe_validator;
pub mod fallback;
pub mod generator;
