use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::RwLock;
use tracing::{info, warn};

use crate::recipe::{Recipe, RecipeId, RecipeProvenance};

mod fallback;

/// Keyed recipe collection with membership queries.
pub trait CatalogStore: Send + Sync {
    /// Recipes with any English ingredient in `english` or any Japanese
    /// ingredient in `japanese`, in catalog order.
    fn find_by_ingredient_membership(
        &self,
        english: &[String],
        japanese: &[String],
    ) -> Result<Vec<Recipe>>;
    fn find_by_id(&self, id: i64) -> Result<Option<Recipe>>;
    fn insert_all(&self, recipes: Vec<Recipe>) -> Result<()>;
    fn delete_all(&self) -> Result<()>;
    fn count(&self) -> Result<usize>;
    fn all(&self) -> Result<Vec<Recipe>>;
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    recipes: RwLock<Vec<Recipe>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipes(recipes: Vec<Recipe>) -> Self {
        Self {
            recipes: RwLock::new(recipes),
        }
    }
}

impl CatalogStore for MemoryCatalog {
    fn find_by_ingredient_membership(
        &self,
        english: &[String],
        japanese: &[String],
    ) -> Result<Vec<Recipe>> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(recipes
            .iter()
            .filter(|recipe| recipe.matches_any(english, japanese))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Recipe>> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(recipes
            .iter()
            .find(|recipe| recipe.id == RecipeId::Numeric(id))
            .cloned())
    }

    fn insert_all(&self, incoming: Vec<Recipe>) -> Result<()> {
        let mut recipes = self
            .recipes
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        recipes.extend(incoming);
        Ok(())
    }

    fn delete_all(&self) -> Result<()> {
        let mut recipes = self
            .recipes
            .write()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        recipes.clear();
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(recipes.len())
    }

    fn all(&self) -> Result<Vec<Recipe>> {
        let recipes = self
            .recipes
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(recipes.clone())
    }
}

/// Reads a JSON array of recipe documents. Every entry is tagged local.
pub fn load_recipes_file(path: &Path) -> Result<Vec<Recipe>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read recipes: {}", path.display()))?;
    let mut recipes: Vec<Recipe> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse recipes: {}", path.display()))?;
    for recipe in &mut recipes {
        recipe.provenance = RecipeProvenance::Local;
    }
    Ok(recipes)
}

/// Seeds an empty catalog from `path`, falling back to the built-in recipe
/// when the file cannot be loaded. Returns the number of inserted recipes.
pub fn seed_if_empty(store: &dyn CatalogStore, path: &Path) -> Result<usize> {
    if store.count()? > 0 {
        return Ok(0);
    }
    let recipes = match load_recipes_file(path) {
        Ok(recipes) => {
            info!("{} recipes loaded from {}", recipes.len(), path.display());
            recipes
        }
        Err(err) => {
            warn!("failed to load recipes from file: {:#}", err);
            fallback::fallback_recipes()
        }
    };
    let inserted = recipes.len();
    store.insert_all(recipes)?;
    Ok(inserted)
}

/// Replaces the catalog contents with the recipes in `path`. Unlike seeding,
/// a missing or malformed file is an error and leaves the catalog untouched.
pub fn reload(store: &dyn CatalogStore, path: &Path) -> Result<usize> {
    let recipes = load_recipes_file(path)?;
    let count = recipes.len();
    store.delete_all()?;
    store.insert_all(recipes)?;
    info!("catalog reloaded with {} recipes", count);
    Ok(count)
}
