//! Renders user preferences and a generation request into the model prompt.
//!
//! Rendering is a pure function of its inputs: identical inputs give
//! byte-identical prompts. Sections with no underlying data are omitted.

use crate::preferences::{partition_ingredients, IngredientPreference, UserPreferences};
use crate::request::{merge_restrictions, GenerationRequest};

pub const SYSTEM_PROMPT: &str = "You are a professional chef and recipe developer. \
You ALWAYS respect the user's allergies and dietary restrictions absolutely: never include an \
allergen or any ingredient that breaks a stated dietary restriction. \
Respond with a single valid JSON object that follows the requested format exactly, \
with no markdown, comments, or text outside the JSON.";

const TASK_STATEMENT: &str =
    "Create a detailed, original recipe that satisfies all of the following requirements.";

const OUTPUT_FORMAT: &str = r#"Return ONLY a JSON object with exactly these fields:
{
  "title": "string",
  "description": "string",
  "ingredients": [
    { "name": "string", "quantity": "string", "notes": "string (optional)" }
  ],
  "instructions": "string with numbered steps",
  "cookingTime": number (minutes),
  "prepTime": number (minutes),
  "servings": number,
  "cuisine": "string",
  "difficulty": "easy" | "medium" | "hard",
  "spiceLevel": "mild" | "medium" | "hot",
  "tips": ["string"]
}"#;

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn join(items: &[impl AsRef<str>]) -> String {
    items
        .iter()
        .map(|item| item.as_ref().trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_generation_prompt(
    preferences: &UserPreferences,
    ingredient_preferences: &[IngredientPreference],
    request: &GenerationRequest,
) -> String {
    let groups = partition_ingredients(ingredient_preferences);
    let mut sections: Vec<String> = vec![TASK_STATEMENT.to_string()];

    let restrictions = merge_restrictions(
        &preferences.dietary_restrictions,
        &request.dietary_restrictions,
    );
    if !restrictions.is_empty() {
        sections.push(format!(
            "DIETARY RESTRICTIONS (CRITICAL - MUST FOLLOW): {}.",
            join(&restrictions)
        ));
    }

    let allergies = join(&preferences.allergies);
    if !allergies.is_empty() {
        sections.push(format!(
            "ALLERGIES (CRITICAL - ABSOLUTELY DO NOT INCLUDE): {}.",
            allergies
        ));
    }

    if !groups.liked.is_empty() {
        sections.push(format!(
            "The user likes these ingredients (use them where they fit): {}.",
            join(&groups.liked)
        ));
    }
    if !groups.disliked.is_empty() {
        sections.push(format!(
            "The user dislikes these ingredients (avoid them): {}.",
            join(&groups.disliked)
        ));
    }
    if !groups.stretch.is_empty() {
        sections.push(format!(
            "The user is willing to try these ingredients occasionally (use at most 1-2 of them): {}.",
            join(&groups.stretch)
        ));
    }

    let required = join(&request.include_ingredients);
    if !required.is_empty() {
        sections.push(format!("Must include these ingredients: {}.", required));
    }
    let excluded = join(&request.exclude_ingredients);
    if !excluded.is_empty() {
        sections.push(format!("Must NOT include these ingredients: {}.", excluded));
    }

    // A request-level cuisine replaces the stored favorites entirely.
    match non_blank(&request.cuisine) {
        Some(cuisine) => sections.push(format!("Cuisine type: {}.", cuisine)),
        None => {
            let favorites = join(&preferences.cuisine_preferences);
            if !favorites.is_empty() {
                sections.push(format!("Cuisine type (one of the user's favorites): {}.", favorites));
            }
        }
    }

    if let Some(meal_type) = non_blank(&request.meal_type) {
        sections.push(format!("Meal type: {}.", meal_type));
    }

    if let Some(minutes) = request.cooking_time.or(preferences.max_cooking_time) {
        sections.push(format!("Maximum cooking time: {} minutes.", minutes));
    }

    if let Some(difficulty) = request.difficulty {
        sections.push(format!("Difficulty level: {}.", difficulty));
    }

    sections.push(format!("Spice level: {}.", preferences.spice_level));
    sections.push(format!("Servings: {}.", preferences.serving_size));

    if let Some(message) = non_blank(&request.message) {
        sections.push(format!("Additional request from the user: {}", message));
    }

    sections.push(OUTPUT_FORMAT.to_string());
    sections.join("\n")
}
