use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recipe::Difficulty;

pub const MIN_MESSAGE_CHARS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("userId must not be empty")]
    MissingUserId,

    #[error("message must be at least 2 characters")]
    MessageTooShort,

    #[error("cookingTime must be a positive number of minutes")]
    NonPositiveCookingTime,
}

/// Per-call generation constraints. Never persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub user_id: String,
    #[serde(default)]
    pub include_ingredients: Vec<String>,
    #[serde(default)]
    pub exclude_ingredients: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    /// Minutes.
    #[serde(default)]
    pub cooking_time: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub message: Option<String>,
}

impl GenerationRequest {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.user_id.trim().is_empty() {
            return Err(RequestError::MissingUserId);
        }
        if let Some(message) = &self.message {
            if message.trim().chars().count() < MIN_MESSAGE_CHARS {
                return Err(RequestError::MessageTooShort);
            }
        }
        if self.cooking_time == Some(0) {
            return Err(RequestError::NonPositiveCookingTime);
        }
        Ok(())
    }
}

/// Stored restrictions first, then request-level extras not already present
/// (compared case-insensitively).
pub fn merge_restrictions<'a>(stored: &'a [String], requested: &'a [String]) -> Vec<&'a str> {
    let mut merged: Vec<&str> = Vec::with_capacity(stored.len() + requested.len());
    for item in stored.iter().chain(requested) {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if !merged.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            merged.push(item);
        }
    }
    merged
}
