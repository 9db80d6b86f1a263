//! Structural contract for model output.
//!
//! A parsed JSON value becomes a [`GeneratedRecipe`] only if every field
//! matches; otherwise all mismatches are reported with their field paths
//! (e.g. `ingredients[2].quantity`).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::preferences::SpiceLevel;
use crate::recipe::{Difficulty, GeneratedRecipe, RecipeIngredient, RecipeSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("recipe failed validation: {}", summarize(.issues))]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.path.as_str()).collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn fail(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.into(),
            message: message.into(),
        });
    }

    fn expected(&mut self, path: &str, expected: &str, got: &Value) {
        self.fail(path, format!("expected {}, received {}", expected, type_name(got)));
    }

    fn string_at(&mut self, path: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.expected(path, "string", other);
                None
            }
        }
    }

    fn required_string(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match obj.get(key) {
            Some(value) => self.string_at(path, value),
            None => {
                self.fail(path, "required");
                None
            }
        }
    }

    fn optional_string(&mut self, obj: &Map<String, Value>, key: &str) -> Option<String> {
        obj.get(key).and_then(|value| self.string_at(key, value))
    }

    fn optional_positive_int(&mut self, obj: &Map<String, Value>, key: &str) -> Option<u32> {
        let value = obj.get(key)?;
        let Value::Number(number) = value else {
            self.expected(key, "number", value);
            return None;
        };
        let whole = match (number.as_u64(), number.as_f64()) {
            (Some(n), _) => Some(n),
            (None, Some(f)) if f.fract() == 0.0 && f > 0.0 && f <= u32::MAX as f64 => Some(f as u64),
            (None, Some(f)) if f.fract() != 0.0 => {
                self.fail(key, "expected integer, received float");
                return None;
            }
            _ => None,
        };
        match whole.and_then(|n| u32::try_from(n).ok()) {
            Some(n) if n > 0 => Some(n),
            Some(_) | None => {
                self.fail(key, "must be a positive integer");
                None
            }
        }
    }

    fn optional_enum<T: DeserializeOwned>(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        allowed: &[&str],
    ) -> Option<T> {
        let value = obj.get(key)?;
        match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.fail(
                    key,
                    format!("expected one of {}, received {}", allowed.join(" | "), value),
                );
                None
            }
        }
    }

    fn ingredients(&mut self, obj: &Map<String, Value>) -> Option<Vec<RecipeIngredient>> {
        let value = match obj.get("ingredients") {
            Some(value) => value,
            None => {
                self.fail("ingredients", "required");
                return None;
            }
        };
        let Value::Array(items) = value else {
            self.expected("ingredients", "array", value);
            return None;
        };

        let before = self.issues.len();
        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let base = format!("ingredients[{}]", index);
            let Value::Object(fields) = item else {
                self.expected(&base, "object", item);
                continue;
            };
            let name = self.required_string(fields, "name", &format!("{}.name", base));
            let quantity = self.required_string(fields, "quantity", &format!("{}.quantity", base));
            let notes = fields
                .get("notes")
                .and_then(|n| self.string_at(&format!("{}.notes", base), n));
            if let (Some(name), Some(quantity)) = (name, quantity) {
                parsed.push(RecipeIngredient { name, quantity, notes });
            }
        }
        (self.issues.len() == before).then_some(parsed)
    }

    fn tips(&mut self, obj: &Map<String, Value>) -> Option<Vec<String>> {
        let value = obj.get("tips")?;
        let Value::Array(items) = value else {
            self.expected("tips", "array", value);
            return None;
        };
        let mut tips = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(tip) = self.string_at(&format!("tips[{}]", index), item) {
                tips.push(tip);
            }
        }
        Some(tips)
    }
}

/// Checks `value` against the recipe contract.
///
/// Unknown fields are ignored. A missing `source` defaults to `ai`.
pub fn validate_recipe(value: &Value) -> Result<GeneratedRecipe, ValidationErrors> {
    let Value::Object(obj) = value else {
        return Err(ValidationErrors {
            issues: vec![ValidationIssue {
                path: "$".to_string(),
                message: format!("expected object, received {}", type_name(value)),
            }],
        });
    };

    let mut checker = Checker::default();
    let title = checker.required_string(obj, "title", "title");
    let description = checker.optional_string(obj, "description");
    let ingredients = checker.ingredients(obj);
    let instructions = checker.required_string(obj, "instructions", "instructions");
    let cooking_time = checker.optional_positive_int(obj, "cookingTime");
    let prep_time = checker.optional_positive_int(obj, "prepTime");
    let servings = checker.optional_positive_int(obj, "servings");
    let cuisine = checker.optional_string(obj, "cuisine");
    let difficulty: Option<Difficulty> =
        checker.optional_enum(obj, "difficulty", &["easy", "medium", "hard"]);
    let spice_level: Option<SpiceLevel> =
        checker.optional_enum(obj, "spiceLevel", &["mild", "medium", "hot"]);
    let tips = checker.tips(obj);
    let source: Option<RecipeSource> = checker.optional_enum(obj, "source", &["ai", "user"]);

    if !checker.issues.is_empty() {
        return Err(ValidationErrors {
            issues: checker.issues,
        });
    }

    match (title, ingredients, instructions) {
        (Some(title), Some(ingredients), Some(instructions)) => Ok(GeneratedRecipe {
            title,
            description,
            ingredients,
            instructions,
            cooking_time,
            prep_time,
            servings,
            cuisine,
            difficulty,
            spice_level,
            tips,
            source: source.unwrap_or_default(),
        }),
        // Every None above has already pushed an issue.
        _ => Err(ValidationErrors { issues: Vec::new() }),
    }
}
