use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::debug;

use super::{ExternalMeal, RecipeSource, SourceFuture};

pub(crate) const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

/// TheMealDB JSON API client.
#[derive(Debug, Clone)]
pub struct MealDb {
    base_url: String,
    client: reqwest::Client,
}

impl MealDb {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        self
    }

    async fn get_meals(&self, endpoint: &str, key: &str, value: &str) -> anyhow::Result<Vec<ExternalMeal>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} ({}={})", url, key, value);
        let response = self
            .client
            .get(&url)
            .query(&[(key, value)])
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(anyhow!("TheMealDB API error ({}): {}", status, text));
        }
        parse_meals(&text)
    }
}

impl Default for MealDb {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeSource for MealDb {
    fn filter_by_ingredient<'a>(&'a self, term: &'a str) -> SourceFuture<'a, Vec<ExternalMeal>> {
        Box::pin(async move { self.get_meals("filter.php", "i", term).await })
    }

    fn lookup_by_id<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<ExternalMeal>> {
        Box::pin(async move {
            let meals = self.get_meals("lookup.php", "i", id).await?;
            Ok(meals.into_iter().next())
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct MealsEnvelope {
    #[serde(default)]
    pub(super) meals: Option<Vec<ExternalMeal>>,
}

/// `{"meals": null}` is how the API reports no matches.
fn parse_meals(text: &str) -> anyhow::Result<Vec<ExternalMeal>> {
    let envelope: MealsEnvelope =
        serde_json::from_str(text).with_context(|| "failed to parse TheMealDB response JSON")?;
    Ok(envelope.meals.unwrap_or_default())
}
