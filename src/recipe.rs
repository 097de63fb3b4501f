use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog ids are numeric for seeded recipes and strings for external ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeId {
    Numeric(i64),
    Text(String),
}

impl RecipeId {
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            RecipeId::Numeric(value) => Some(*value),
            RecipeId::Text(_) => None,
        }
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeId::Numeric(value) => write!(f, "{}", value),
            RecipeId::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeProvenance {
    #[default]
    Local,
    External,
}

/// A recipe document. Field names on the wire follow the catalog file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    #[serde(rename = "title_jp", default)]
    pub title_localized: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(rename = "ingredients_jp", default)]
    pub ingredients_localized: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(rename = "instructions_jp", default)]
    pub instructions_localized: Vec<String>,
    #[serde(rename = "prepTime", default)]
    pub prep_time: String,
    #[serde(rename = "cookTime", default)]
    pub cook_time: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(rename = "source", default)]
    pub provenance: RecipeProvenance,
}

impl Recipe {
    /// True when any ingredient appears in the given term lists.
    pub fn matches_any(&self, english: &[String], japanese: &[String]) -> bool {
        self.ingredients
            .iter()
            .any(|ingredient| english.contains(ingredient))
            || self
                .ingredients_localized
                .iter()
                .any(|ingredient| japanese.contains(ingredient))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLabel {
    Local,
    Mixed,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Local => "local",
            SourceLabel::Mixed => "mixed",
        }
    }
}

/// Merged search output: local recipes first, external after.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub recipes: Vec<Recipe>,
    pub local_count: usize,
    pub external_count: usize,
}

impl SearchResult {
    pub fn merge(local: Vec<Recipe>, external: Vec<Recipe>) -> Self {
        let local_count = local.len();
        let external_count = external.len();
        let mut recipes = local;
        recipes.extend(external);
        Self {
            recipes,
            local_count,
            external_count,
        }
    }

    pub fn source_label(&self) -> SourceLabel {
        if self.external_count > 0 {
            SourceLabel::Mixed
        } else {
            SourceLabel::Local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_document_round_trips_field_names() {
        let raw = r#"{
            "id": 3,
            "title": "Palak Paneer",
            "title_jp": "パラクパニール",
            "ingredients": ["spinach", "paneer"],
            "ingredients_jp": ["ほうれん草", "パニール"],
            "prepTime": "15 mins",
            "cookTime": "25 mins"
        }"#;
        let recipe: Recipe = serde_json::from_str(raw).expect("recipe");
        assert_eq!(recipe.id, RecipeId::Numeric(3));
        assert_eq!(recipe.provenance, RecipeProvenance::Local);
        assert_eq!(recipe.prep_time, "15 mins");
        let value = serde_json::to_value(&recipe).expect("value");
        assert_eq!(value["title_jp"], "パラクパニール");
        assert_eq!(value["source"], "local");
        assert_eq!(value["cookTime"], "25 mins");
    }

    #[test]
    fn string_ids_stay_strings() {
        let id: RecipeId = serde_json::from_str("\"ext_52772\"").expect("id");
        assert_eq!(id, RecipeId::Text("ext_52772".to_string()));
        assert_eq!(id.as_numeric(), None);
        assert_eq!(id.to_string(), "ext_52772");
    }

    #[test]
    fn label_is_mixed_only_with_external_results() {
        let local_only = SearchResult::merge(Vec::new(), Vec::new());
        assert_eq!(local_only.source_label(), SourceLabel::Local);
    }
}
