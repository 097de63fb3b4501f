use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::CatalogStore;
use crate::external::{ExternalMeal, RecipeSource};
use crate::lexicon::Lexicon;
use crate::recipe::{Recipe, RecipeId, RecipeProvenance, SearchResult};
use crate::terms::{self, IngredientTermSet};

pub const DEFAULT_EXTERNAL_LIMIT: usize = 5;
const EXTERNAL_ID_PREFIX: &str = "ext_";
const EXTERNAL_CUISINE: &str = "International";

/// One search request: the raw pieces as typed plus their normalized form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw_terms: Vec<String>,
    pub terms: IngredientTermSet,
}

impl SearchQuery {
    pub fn parse(lexicon: &Lexicon, input: &str) -> Self {
        let raw_terms = terms::split_terms(input);
        let terms = terms::normalize(lexicon, &raw_terms);
        Self { raw_terms, terms }
    }

    pub fn first_raw_term(&self) -> Option<&str> {
        self.raw_terms.first().map(String::as_str)
    }
}

#[derive(Clone)]
pub struct RecipeResolver {
    catalog: Arc<dyn CatalogStore>,
    source: Option<Arc<dyn RecipeSource>>,
    external_limit: usize,
}

impl RecipeResolver {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalog,
            source: None,
            external_limit: DEFAULT_EXTERNAL_LIMIT,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn RecipeSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_external_limit(mut self, limit: usize) -> Self {
        self.external_limit = limit.min(DEFAULT_EXTERNAL_LIMIT);
        self
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    pub async fn search(&self, query: &SearchQuery, external_enabled: bool) -> SearchResult {
        let local = self
            .catalog
            .find_by_ingredient_membership(&query.terms.english, &query.terms.japanese)
            .unwrap_or_else(|err| {
                warn!("catalog search failed: {:#}", err);
                Vec::new()
            });

        let external = match (external_enabled, query.first_raw_term()) {
            (true, Some(term)) => self.search_external(term).await,
            _ => Vec::new(),
        };

        debug!(
            "search matched {} local and {} external recipes",
            local.len(),
            external.len()
        );
        SearchResult::merge(local, external)
    }

    async fn search_external(&self, term: &str) -> Vec<Recipe> {
        let Some(source) = self.source.as_ref() else {
            return Vec::new();
        };
        match source.filter_by_ingredient(term).await {
            Ok(meals) => meals
                .iter()
                .take(self.external_limit)
                .map(|meal| recipe_from_filter_result(meal, term))
                .collect(),
            Err(err) => {
                warn!("external recipe search failed: {:#}", err);
                Vec::new()
            }
        }
    }

    /// Local catalog first; the external catalog is consulted only on a miss.
    pub async fn find_by_id(&self, id: &str) -> Option<Recipe> {
        let id = id.trim();
        if let Ok(numeric) = id.parse::<i64>() {
            match self.catalog.find_by_id(numeric) {
                Ok(Some(recipe)) => return Some(recipe),
                Ok(None) => {}
                Err(err) => warn!("catalog lookup failed: {:#}", err),
            }
        }

        let source = self.source.as_ref()?;
        let external_id = id.strip_prefix(EXTERNAL_ID_PREFIX).unwrap_or(id);
        match source.lookup_by_id(external_id).await {
            Ok(meal) => meal.map(|meal| recipe_from_lookup(&meal)),
            Err(err) => {
                warn!("external recipe lookup failed: {:#}", err);
                None
            }
        }
    }
}

fn recipe_from_filter_result(meal: &ExternalMeal, term: &str) -> Recipe {
    Recipe {
        id: RecipeId::Text(format!("{}{}", EXTERNAL_ID_PREFIX, meal.id)),
        title: meal.name.clone(),
        title_localized: meal.name.clone(),
        cuisine: EXTERNAL_CUISINE.to_string(),
        image: meal.thumbnail.clone().unwrap_or_default(),
        ingredients: vec![term.to_lowercase()],
        ingredients_localized: vec![term.to_string()],
        instructions: vec!["Recipe instructions available on TheMealDB website".to_string()],
        instructions_localized: vec!["レシピの手順はTheMealDBウェブサイトでご確認ください".to_string()],
        prep_time: "Unknown".to_string(),
        cook_time: "Unknown".to_string(),
        difficulty: "Unknown".to_string(),
        provenance: RecipeProvenance::External,
    }
}

fn recipe_from_lookup(meal: &ExternalMeal) -> Recipe {
    Recipe {
        id: RecipeId::Text(meal.id.clone()),
        title: meal.name.clone(),
        title_localized: meal.name.clone(),
        cuisine: EXTERNAL_CUISINE.to_string(),
        image: meal.thumbnail.clone().unwrap_or_default(),
        ingredients: meal.ingredient_names(),
        ingredients_localized: Vec::new(),
        instructions: meal.instruction_steps(),
        instructions_localized: Vec::new(),
        prep_time: "N/A".to_string(),
        cook_time: "N/A".to_string(),
        difficulty: "N/A".to_string(),
        provenance: RecipeProvenance::External,
    }
}
