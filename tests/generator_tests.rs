use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use smart_recipes::api_connection::endpoints::ChatRole;
use smart_recipes::api_connection::scripted::{ScriptedProvider, ScriptedReply};
use smart_recipes::config::GeneratorConfig;
use smart_recipes::generator::{GenerationError, RecipeGenerator};
use smart_recipes::preferences::{IngredientPreference, PreferenceKind, UserPreferences};
use smart_recipes::recipe::{Difficulty, RecipeSource};
use smart_recipes::request::GenerationRequest;
use tokio::time::Instant;

const RISOTTO: &str = r#"{
    "title": "Mushroom Risotto",
    "description": "Creamy and earthy.",
    "ingredients": [
        { "name": "arborio rice", "quantity": "300 g" },
        { "name": "cremini mushrooms", "quantity": "250 g", "notes": "sliced" }
    ],
    "instructions": "1. Saute mushrooms.\n2. Toast rice.\n3. Add stock gradually.",
    "cookingTime": 30,
    "prepTime": 10,
    "servings": 2,
    "cuisine": "Italian",
    "difficulty": "medium",
    "spiceLevel": "mild",
    "tips": ["Use warm stock."],
    "source": "user"
}"#;

const SATAY: &str = r#"{
    "title": "Tofu Satay",
    "ingredients": [
        { "name": "firm tofu", "quantity": "400 g" },
        { "name": "Peanut Butter", "quantity": "3 tbsp" }
    ],
    "instructions": "1. Grill tofu.\n2. Whisk sauce."
}"#;

const MISSING_INSTRUCTIONS: &str = r#"{
    "title": "Half a Recipe",
    "ingredients": [{ "name": "rice", "quantity": "1 cup" }]
}"#;

fn scenario_preferences() -> UserPreferences {
    UserPreferences {
        allergies: vec!["peanuts".to_string(), "peanut".to_string()],
        dietary_restrictions: vec!["vegetarian".to_string()],
        ..Default::default()
    }
}

fn scenario_request() -> GenerationRequest {
    GenerationRequest {
        cuisine: Some("Italian".to_string()),
        cooking_time: Some(30),
        ..GenerationRequest::for_user("user-42")
    }
}

fn generator_with(provider: &Arc<ScriptedProvider>) -> RecipeGenerator {
    RecipeGenerator::new(provider.clone(), GeneratorConfig::default())
}

fn content(json: &str) -> ScriptedReply {
    ScriptedReply::Content(json.to_string())
}

#[tokio::test]
async fn first_valid_reply_is_returned_after_one_call() {
    let provider = Arc::new(ScriptedProvider::new([content(RISOTTO)]));
    let generator = generator_with(&provider);

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 1);
    assert!(!outcome.fallback);
    assert_eq!(outcome.recipe.title, "Mushroom Risotto");
    assert_eq!(outcome.recipe.source, RecipeSource::Ai);
    assert!(outcome.generated_prompt.contains("Cuisine type: Italian."));
    assert!(outcome.generated_prompt.contains("Maximum cooking time: 30 minutes."));

    let serialized = serde_json::to_value(&outcome).unwrap();
    assert!(serialized.get("fallback").is_none());
}

#[tokio::test]
async fn request_carries_persona_prompt_and_json_mode() {
    let provider = Arc::new(ScriptedProvider::new([content(RISOTTO)]));
    let generator = generator_with(&provider);
    let ingredient_prefs = vec![IngredientPreference::new("mushrooms", PreferenceKind::Like)];

    let outcome = generator
        .generate(&scenario_preferences(), &ingredient_prefs, &scenario_request())
        .await
        .unwrap();

    let requests = provider.requests();
    let sent = &requests[0];
    assert_eq!(sent.model, "scripted-model");
    assert_eq!(sent.messages.len(), 2);
    assert_eq!(sent.messages[0].role, ChatRole::System);
    assert!(sent.messages[0].content.contains("professional chef"));
    assert_eq!(sent.messages[1].role, ChatRole::User);
    assert_eq!(sent.messages[1].content, outcome.generated_prompt);
    assert_eq!(
        sent.response_format.as_ref().map(|f| f.format_type.as_str()),
        Some("json_object")
    );
    assert_eq!(sent.temperature, Some(0.7));
}

#[tokio::test(start_paused = true)]
async fn transport_failures_on_every_attempt_raise_connection_error() {
    let provider = Arc::new(ScriptedProvider::repeating(
        ScriptedReply::Failure(StatusCode::GATEWAY_TIMEOUT),
        3,
    ));
    let generator = generator_with(&provider);
    let started = Instant::now();

    let result = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await;

    match result {
        Err(GenerationError::Connection { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected connection error, got {:?}", other),
    }
    assert_eq!(provider.call_count(), 3);
    // 1s after the first failure, 2s after the second, none after the last.
    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(provider.temperatures(), vec![Some(0.7), Some(0.8), Some(0.9)]);
}

#[tokio::test(start_paused = true)]
async fn empty_content_on_every_attempt_yields_flagged_fallback() {
    let provider = Arc::new(ScriptedProvider::repeating(ScriptedReply::Empty, 3));
    let generator = generator_with(&provider);
    let started = Instant::now();

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(outcome.fallback);
    assert_eq!(outcome.recipe.difficulty, Some(Difficulty::Easy));
    assert_eq!(outcome.recipe.cuisine.as_deref(), Some("Mixed"));
    assert_eq!(outcome.recipe.servings, Some(2));
    assert_eq!(outcome.recipe.title, "Simple Italian Recipe");

    let serialized = serde_json::to_value(&outcome).unwrap();
    assert_eq!(serialized["fallback"], true);
}

#[tokio::test]
async fn allergen_reply_is_discarded_and_retried() {
    let provider = Arc::new(ScriptedProvider::new([content(SATAY), content(RISOTTO)]));
    let generator = generator_with(&provider);

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 2);
    assert_eq!(outcome.recipe.title, "Mushroom Risotto");
    assert_eq!(provider.temperatures(), vec![Some(0.7), Some(0.8)]);
}

#[tokio::test]
async fn allergen_on_every_attempt_never_succeeds() {
    let provider = Arc::new(ScriptedProvider::repeating(content(SATAY), 3));
    let generator = generator_with(&provider);

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert!(outcome.fallback);
    assert!(outcome
        .recipe
        .ingredients
        .iter()
        .all(|i| !i.name.to_lowercase().contains("peanut")));
}

#[tokio::test]
async fn schema_failure_on_final_attempt_raises_validation_error() {
    let provider = Arc::new(ScriptedProvider::repeating(content(MISSING_INSTRUCTIONS), 3));
    let generator = generator_with(&provider);

    let result = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await;

    match result {
        Err(GenerationError::Validation { errors, raw_response }) => {
            assert_eq!(errors.paths(), vec!["instructions"]);
            assert!(raw_response.contains("Half a Recipe"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn schema_failure_before_final_attempt_is_retried() {
    let provider = Arc::new(ScriptedProvider::new([
        content(MISSING_INSTRUCTIONS),
        content("this is not json"),
        content(&format!("```json\n{}\n```", RISOTTO)),
    ]));
    let generator = generator_with(&provider);

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert!(!outcome.fallback);
    assert_eq!(outcome.recipe.title, "Mushroom Risotto");
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn malformed_json_on_final_attempt_falls_back() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Empty,
        content(MISSING_INSTRUCTIONS),
        content("{ truncated"),
    ]));
    let generator = generator_with(&provider);

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert!(outcome.fallback);
}

#[tokio::test(start_paused = true)]
async fn transport_recovery_waits_then_succeeds() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedReply::Failure(StatusCode::BAD_GATEWAY),
        content(RISOTTO),
    ]));
    let generator = generator_with(&provider);
    let started = Instant::now();

    let outcome = generator
        .generate(&scenario_preferences(), &[], &scenario_request())
        .await
        .unwrap();

    assert!(!outcome.fallback);
    assert_eq!(started.elapsed(), Duration::from_secs(1));
}

#[tokio::test]
async fn zero_retries_makes_a_single_final_attempt() {
    let provider = Arc::new(ScriptedProvider::new([content(MISSING_INSTRUCTIONS)]));
    let config = GeneratorConfig {
        max_retries: 0,
        ..GeneratorConfig::default()
    };
    let generator = RecipeGenerator::new(provider.clone(), config);

    let result = generator
        .generate(&UserPreferences::default(), &[], &GenerationRequest::for_user("u"))
        .await;

    assert!(matches!(result, Err(GenerationError::Validation { .. })));
    assert_eq!(provider.call_count(), 1);
}
