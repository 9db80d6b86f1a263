use std::sync::Arc;

use anyhow::{Context, Result};
use smart_recipes::api_connection::connection::Provider;
use smart_recipes::cli::{load_profile, parse_args, Command, RequestArgs};
use smart_recipes::config::{GeneratorConfig, ProviderConfig};
use smart_recipes::generator::{GenerationError, RecipeGenerator};
use smart_recipes::preferences::UserProfile;
use smart_recipes::prompt_builder::build_generation_prompt;
use smart_recipes::request::GenerationRequest;
use tracing_subscriber::EnvFilter;

const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

async fn load_request(args: &RequestArgs) -> Result<(UserProfile, GenerationRequest)> {
    let profile = load_profile(&args.profile).await?;
    let request = args.to_request(&profile.user_id);
    request.validate().context("Invalid generation request")?;
    Ok((profile, request))
}

async fn run_generate(args: &RequestArgs) -> Result<()> {
    let (profile, request) = load_request(args).await?;

    let provider_config = ProviderConfig::from_env(API_KEY_ENV_VAR)?;
    let generator_config = GeneratorConfig::from_env()?;
    let provider = Provider::openrouter(provider_config)
        .context("Failed to build the HTTP client for the recipe model")?;
    let generator = RecipeGenerator::new(Arc::new(provider), generator_config);

    match generator
        .generate(&profile.preferences, &profile.ingredient_preferences, &request)
        .await
    {
        Ok(outcome) => {
            if outcome.fallback {
                tracing::warn!("model output unavailable; printing the generic fallback recipe");
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(err) => {
            if let GenerationError::Validation { raw_response, .. } = &err {
                tracing::debug!(raw_response = %raw_response, "rejected model output");
            }
            let status = err.http_status();
            Err(anyhow::Error::new(err).context(format!("Recipe generation failed ({})", status)))
        }
    }
}

async fn run_prompt(args: &RequestArgs) -> Result<()> {
    let (profile, request) = load_request(args).await?;
    let prompt = build_generation_prompt(
        &profile.preferences,
        &profile.ingredient_preferences,
        &request,
    );
    println!("{}", prompt);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    match &cli.command {
        Command::Generate(args) => run_generate(args).await,
        Command::Prompt(args) => run_prompt(args).await,
    }
}
