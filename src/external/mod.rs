use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

mod mealdb;

pub use mealdb::MealDb;

/// Number of numbered ingredient slots on an external meal.
pub const INGREDIENT_SLOTS: usize = 20;

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Remote, read-only recipe catalog.
pub trait RecipeSource: Send + Sync {
    fn filter_by_ingredient<'a>(&'a self, term: &'a str) -> SourceFuture<'a, Vec<ExternalMeal>>;
    fn lookup_by_id<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<ExternalMeal>>;
}

/// A meal as returned by the remote catalog. Filter results only carry the id,
/// name and thumbnail; lookups carry everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalMeal {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal", default)]
    pub name: String,
    #[serde(rename = "strMealThumb", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "strInstructions", default)]
    pub instructions: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl ExternalMeal {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Sets numbered ingredient slot `slot` (1-based).
    pub fn with_ingredient(mut self, slot: usize, ingredient: impl Into<String>) -> Self {
        self.extra.insert(
            format!("strIngredient{}", slot),
            Value::String(ingredient.into()),
        );
        self
    }

    pub fn ingredient(&self, slot: usize) -> Option<&str> {
        self.extra
            .get(&format!("strIngredient{}", slot))
            .and_then(Value::as_str)
    }

    /// Trimmed, non-blank ingredient names from slots 1 through 20.
    pub fn ingredient_names(&self) -> Vec<String> {
        (1..=INGREDIENT_SLOTS)
            .filter_map(|slot| self.ingredient(slot))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Instruction text split into lines with blank lines removed.
    pub fn instruction_steps(&self) -> Vec<String> {
        self.instructions
            .as_deref()
            .unwrap_or_default()
            .lines()
            .filter(|step| !step.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_payload_exposes_numbered_ingredients() {
        let payload = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/mealdb_lookup_response.json"
        ));
        let parsed: mealdb::MealsEnvelope = serde_json::from_str(payload).expect("payload");
        let meal = parsed.meals.unwrap_or_default().into_iter().next().expect("meal");
        assert_eq!(meal.id, "52772");
        assert_eq!(
            meal.ingredient_names(),
            vec!["soy sauce", "water", "brown sugar", "chicken breasts"]
        );
        assert_eq!(meal.instruction_steps().len(), 3);
    }

    #[test]
    fn blank_instruction_lines_are_dropped() {
        let meal = ExternalMeal::new("999", "Test").with_instructions("Step1\n\nStep2\n");
        assert_eq!(meal.instruction_steps(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn slots_past_twenty_are_ignored() {
        let meal = ExternalMeal::new("1", "Test")
            .with_ingredient(1, " rice ")
            .with_ingredient(2, "  ")
            .with_ingredient(21, "ignored");
        assert_eq!(meal.ingredient_names(), vec!["rice"]);
    }
}
