//! Drives the model to a validated recipe, a clearly-marked fallback, or one
//! of two terminal errors.
//!
//! Each attempt resolves to an [`AttemptOutcome`]. The decision table lives in
//! [`evaluate_content`] so it can be exercised without a network call:
//!
//! | response                      | earlier attempt | final attempt         |
//! |-------------------------------|-----------------|-----------------------|
//! | transport error               | back off, retry | `Connection` error    |
//! | empty content                 | retry           | fallback              |
//! | not JSON                      | retry           | fallback              |
//! | allergen in an ingredient     | retry           | fallback              |
//! | fails the recipe contract     | retry           | `Validation` error    |
//! | passes                        | success         | success               |

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api_connection::connection::{ApiConnectionError, ChatCompletionClient};
use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, ResponseFormat};
use crate::config::GeneratorConfig;
use crate::fallback::fallback_recipe;
use crate::preferences::{IngredientPreference, UserPreferences};
use crate::prompt_builder::{build_generation_prompt, SYSTEM_PROMPT};
use crate::recipe::{GeneratedRecipe, RecipeSource};
use crate::recipe_validator::{validate_recipe, ValidationErrors};
use crate::request::GenerationRequest;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("recipe service unreachable after {attempts} attempts: {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: ApiConnectionError,
    },

    #[error("model response failed validation: {errors}")]
    Validation {
        errors: ValidationErrors,
        /// Model output exactly as received, for debugging.
        raw_response: String,
    },
}

impl GenerationError {
    /// Status the HTTP layer should answer with.
    pub fn http_status(&self) -> StatusCode {
        match self {
            GenerationError::Connection { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::Validation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub recipe: GeneratedRecipe,
    pub generated_prompt: String,
    /// Set when `recipe` is the static fallback rather than model output.
    #[serde(skip_serializing_if = "is_false")]
    pub fallback: bool,
}

/// Why an attempt was thrown away. Never surfaced to callers on its own.
#[derive(Debug, Error)]
pub enum SoftFailure {
    #[error("transport error: {0}")]
    Transport(ApiConnectionError),

    #[error("empty response content")]
    EmptyContent,

    #[error("response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("ingredient {ingredient:?} matches allergy {allergen:?}")]
    AllergenDetected { allergen: String, ingredient: String },

    #[error("{0}")]
    SchemaMismatch(ValidationErrors),
}

#[derive(Debug)]
pub enum AttemptOutcome {
    Success(GeneratedRecipe),
    Retry(SoftFailure),
    Terminal(GenerationError),
}

/// Drops a surrounding markdown code fence (```json ... ``` or ``` ... ```).
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```")) || trimmed.len() < 6 {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

/// First `(allergy, ingredient name)` pair where the name contains the
/// allergy term, case-insensitively. Looks only at `ingredients[].name`
/// strings and tolerates any other shape.
pub fn find_allergen(value: &Value, allergies: &[String]) -> Option<(String, String)> {
    let ingredients = value.get("ingredients")?.as_array()?;
    let terms: Vec<(String, &str)> = allergies
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| (a.to_lowercase(), a))
        .collect();

    ingredients
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .find_map(|name| {
            let lowered = name.to_lowercase();
            terms
                .iter()
                .find(|(term, _)| lowered.contains(term.as_str()))
                .map(|(_, allergy)| (allergy.to_string(), name.to_string()))
        })
}

/// Classifies the content of a successful call.
///
/// The allergen check runs on the parsed value before the recipe contract,
/// so an allergen hit is always a soft failure, even on the final attempt.
pub fn evaluate_content(content: Option<&str>, allergies: &[String], is_final: bool) -> AttemptOutcome {
    let raw = match content.map(strip_code_fences) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return AttemptOutcome::Retry(SoftFailure::EmptyContent),
    };

    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return AttemptOutcome::Retry(SoftFailure::MalformedJson(e.to_string())),
    };

    if let Some((allergen, ingredient)) = find_allergen(&value, allergies) {
        return AttemptOutcome::Retry(SoftFailure::AllergenDetected { allergen, ingredient });
    }

    match validate_recipe(&value) {
        Ok(recipe) => AttemptOutcome::Success(recipe),
        Err(errors) if is_final => AttemptOutcome::Terminal(GenerationError::Validation {
            errors,
            raw_response: raw.to_string(),
        }),
        Err(errors) => AttemptOutcome::Retry(SoftFailure::SchemaMismatch(errors)),
    }
}

#[derive(Debug, Clone)]
pub struct RecipeGenerator {
    client: Arc<dyn ChatCompletionClient>,
    config: GeneratorConfig,
}

impl RecipeGenerator {
    pub fn new(client: Arc<dyn ChatCompletionClient>, config: GeneratorConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn chat_request(&self, prompt: &str, temperature: f32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.client.model_name().to_string(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            response_format: Some(ResponseFormat::json_object()),
            temperature: Some(temperature),
            max_tokens: self.config.max_tokens,
        }
    }

    /// Generates one recipe for `request` under the user's stored preferences.
    ///
    /// Returns a validated model recipe, or the fallback recipe with
    /// `fallback` set once every attempt failed softly.
    #[tracing::instrument(skip_all, fields(user_id = %request.user_id))]
    pub async fn generate(
        &self,
        preferences: &UserPreferences,
        ingredient_preferences: &[IngredientPreference],
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let prompt = build_generation_prompt(preferences, ingredient_preferences, request);
        let attempts = self.config.total_attempts();

        for attempt in 0..attempts {
            let is_final = attempt + 1 == attempts;
            let temperature = self.config.temperature_for(attempt);
            info!(attempt = attempt + 1, attempts, temperature, "requesting recipe from model");

            let outcome = match self
                .client
                .call_chat_completion(self.chat_request(&prompt, temperature))
                .await
            {
                Ok(response) => {
                    let content = response.first_content();
                    debug!(attempt = attempt + 1, content = content.unwrap_or(""), "model replied");
                    evaluate_content(content, &preferences.allergies, is_final)
                }
                Err(source) if is_final => {
                    AttemptOutcome::Terminal(GenerationError::Connection { attempts, source })
                }
                Err(source) => AttemptOutcome::Retry(SoftFailure::Transport(source)),
            };

            match outcome {
                AttemptOutcome::Success(mut recipe) => {
                    recipe.source = RecipeSource::Ai;
                    info!(attempt = attempt + 1, title = %recipe.title, "recipe generated");
                    return Ok(GenerationOutcome {
                        recipe,
                        generated_prompt: prompt,
                        fallback: false,
                    });
                }
                AttemptOutcome::Terminal(err) => {
                    error!(attempt = attempt + 1, temperature, error = %err, "recipe generation failed");
                    return Err(err);
                }
                AttemptOutcome::Retry(failure) => {
                    warn!(attempt = attempt + 1, temperature, cause = %failure, "recipe attempt failed");
                    if matches!(failure, SoftFailure::Transport(_)) {
                        tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    }
                }
            }
        }

        warn!(attempts, "all recipe attempts failed, returning fallback recipe");
        Ok(GenerationOutcome {
            recipe: fallback_recipe(request),
            generated_prompt: prompt,
            fallback: true,
        })
    }
}
