use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpiceLevel {
    Mild,
    #[default]
    Medium,
    Hot,
}

impl SpiceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SpiceLevel::Mild => "mild",
            SpiceLevel::Medium => "medium",
            SpiceLevel::Hot => "hot",
        }
    }
}

impl fmt::Display for SpiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
    #[serde(default)]
    pub spice_level: SpiceLevel,
    /// Minutes.
    #[serde(default)]
    pub max_cooking_time: Option<u32>,
    #[serde(default = "default_serving_size")]
    pub serving_size: u32,
}

fn default_serving_size() -> u32 {
    2
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            dietary_restrictions: Vec::new(),
            allergies: Vec::new(),
            cuisine_preferences: Vec::new(),
            spice_level: SpiceLevel::default(),
            max_cooking_time: None,
            serving_size: default_serving_size(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceKind {
    Like,
    Dislike,
    /// Willing to try, but sparingly (one or two per recipe).
    Stretch,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngredientPreference {
    pub ingredient: String,
    pub preference: PreferenceKind,
}

impl IngredientPreference {
    pub fn new(ingredient: impl Into<String>, preference: PreferenceKind) -> Self {
        Self {
            ingredient: ingredient.into(),
            preference,
        }
    }
}

/// Ingredient preferences split by tag, each group keeping input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngredientGroups<'a> {
    pub liked: Vec<&'a str>,
    pub disliked: Vec<&'a str>,
    pub stretch: Vec<&'a str>,
}

pub fn partition_ingredients(preferences: &[IngredientPreference]) -> IngredientGroups<'_> {
    let mut groups = IngredientGroups::default();
    for pref in preferences {
        let name = pref.ingredient.as_str();
        match pref.preference {
            PreferenceKind::Like => groups.liked.push(name),
            PreferenceKind::Dislike => groups.disliked.push(name),
            PreferenceKind::Stretch => groups.stretch.push(name),
        }
    }
    groups
}

/// Everything stored about one user that generation reads.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub ingredient_preferences: Vec<IngredientPreference>,
}
