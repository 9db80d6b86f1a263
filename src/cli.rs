use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::fs;

use crate::preferences::UserProfile;
use crate::recipe::Difficulty;
use crate::request::GenerationRequest;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a recipe with the configured model and print it as JSON
    Generate(RequestArgs),
    /// Print the prompt that would be sent, without calling the model
    Prompt(RequestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Path to the user profile JSON (preferences and ingredient preferences)
    #[arg(short, long)]
    pub profile: PathBuf,

    /// Ingredients the recipe must use (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Ingredients the recipe must not use (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Extra dietary restrictions for this request only (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub dietary: Vec<String>,

    #[arg(long)]
    pub cuisine: Option<String>,

    #[arg(long)]
    pub meal_type: Option<String>,

    /// Maximum cooking time in minutes
    #[arg(long)]
    pub cooking_time: Option<u32>,

    /// easy, medium or hard
    #[arg(long)]
    pub difficulty: Option<Difficulty>,

    /// Free-text instructions for the chef
    #[arg(short, long)]
    pub message: Option<String>,
}

impl RequestArgs {
    pub fn to_request(&self, user_id: &str) -> GenerationRequest {
        GenerationRequest {
            user_id: user_id.to_string(),
            include_ingredients: self.include.clone(),
            exclude_ingredients: self.exclude.clone(),
            dietary_restrictions: self.dietary.clone(),
            cuisine: self.cuisine.clone(),
            meal_type: self.meal_type.clone(),
            cooking_time: self.cooking_time,
            difficulty: self.difficulty,
            message: self.message.clone(),
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

pub async fn load_profile(path: &Path) -> Result<UserProfile> {
    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read profile file '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse profile file '{}'", path.display()))
}
