//! Static recipe handed back when every generation attempt came up empty.

use crate::preferences::SpiceLevel;
use crate::recipe::{Difficulty, GeneratedRecipe, RecipeIngredient, RecipeSource};
use crate::request::GenerationRequest;

pub const FALLBACK_CUISINE: &str = "Mixed";
pub const FALLBACK_SERVINGS: u32 = 2;
pub const FALLBACK_COOKING_TIME: u32 = 30;
pub const FALLBACK_PREP_TIME: u32 = 10;

/// "Simple Italian Dinner", "Simple Italian Recipe", "Simple Recipe", ...
fn fallback_title(request: &GenerationRequest) -> String {
    let cuisine = request.cuisine.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let meal_type = request
        .meal_type
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("Recipe");

    match cuisine {
        Some(cuisine) => format!("Simple {} {}", cuisine, meal_type),
        None => format!("Simple {}", meal_type),
    }
}

pub fn fallback_recipe(request: &GenerationRequest) -> GeneratedRecipe {
    GeneratedRecipe {
        title: fallback_title(request),
        description: Some(
            "A basic placeholder recipe. We couldn't generate a personalized recipe right now, please try again."
                .to_string(),
        ),
        ingredients: vec![
            RecipeIngredient::new("Main ingredient of your choice", "1 portion"),
            RecipeIngredient::new("Seasoning", "to taste"),
        ],
        instructions: "1. Prepare your ingredients.\n2. Cook until done and season to taste."
            .to_string(),
        cooking_time: Some(FALLBACK_COOKING_TIME),
        prep_time: Some(FALLBACK_PREP_TIME),
        servings: Some(FALLBACK_SERVINGS),
        cuisine: Some(FALLBACK_CUISINE.to_string()),
        difficulty: Some(Difficulty::Easy),
        spice_level: Some(SpiceLevel::Mild),
        tips: None,
        source: RecipeSource::Ai,
    }
}
