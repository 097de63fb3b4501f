use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::{self, MemoryCatalog};
use crate::data::DataAttachment;
use crate::detect::{DetectionResult, DetectorAdapter, DetectorBackend, HeuristicDetector, VisionDetector};
use crate::external::MealDb;
use crate::lexicon::Lexicon;
use crate::providers;
use crate::recipe::{Recipe, SearchResult};
use crate::resolver::{RecipeResolver, SearchQuery};
use crate::settings::Settings;

/// Search, lookup and detection over one catalog and lexicon.
#[derive(Clone)]
pub struct Assistant {
    lexicon: Arc<Lexicon>,
    resolver: RecipeResolver,
    detector: DetectorAdapter,
    catalog_path: PathBuf,
    external_enabled: bool,
    default_backend: DetectorBackend,
}

impl Assistant {
    pub fn new(lexicon: Arc<Lexicon>, resolver: RecipeResolver, detector: DetectorAdapter) -> Self {
        Self {
            lexicon,
            resolver,
            detector,
            catalog_path: PathBuf::from("data/recipes.json"),
            external_enabled: false,
            default_backend: DetectorBackend::Local,
        }
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    pub fn with_external_enabled(mut self, enabled: bool) -> Self {
        self.external_enabled = enabled;
        self
    }

    pub fn with_default_backend(mut self, backend: DetectorBackend) -> Self {
        self.default_backend = backend;
        self
    }

    /// Wires the in-memory catalog, TheMealDB client and detectors from settings,
    /// seeding the catalog from the configured file.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let lexicon = Arc::new(Lexicon::load()?);

        let store = Arc::new(MemoryCatalog::new());
        let seeded = catalog::seed_if_empty(store.as_ref(), &settings.catalog_path)
            .with_context(|| "failed to seed recipe catalog")?;
        info!("catalog seeded with {} recipes", seeded);

        let mut source = MealDb::new();
        if let Some(base_url) = settings.external_base_url.as_deref() {
            source = source.with_base_url(base_url);
        }
        let resolver = RecipeResolver::new(store)
            .with_source(Arc::new(source))
            .with_external_limit(settings.external_max_results);

        let local = HeuristicDetector::new()
            .with_seed(settings.detector_seed)
            .with_delay(Duration::from_millis(settings.local_delay_ms));
        let mut detector = DetectorAdapter::new(lexicon.clone(), Arc::new(local))
            .with_max_terms(settings.max_terms);
        match providers::provider_from_settings(
            settings.vision_model.as_deref(),
            settings.vision_key.as_deref(),
        )? {
            Some(provider) => {
                info!("vision backend: {}", provider.kind().as_str());
                detector = detector.with_external(Arc::new(VisionDetector::new(provider)));
            }
            None => warn!("no vision API key configured; external detection will fall back"),
        }

        Ok(Self::new(lexicon, resolver, detector)
            .with_catalog_path(settings.catalog_path.clone())
            .with_external_enabled(settings.external_enabled)
            .with_default_backend(settings.detector_backend))
    }

    pub fn external_enabled(&self) -> bool {
        self.external_enabled
    }

    /// Searches for a comma separated ingredient list (`,` or `、`).
    pub async fn search(&self, input: &str) -> Result<SearchResult> {
        let query = SearchQuery::parse(&self.lexicon, input);
        if query.raw_terms.is_empty() {
            return Err(anyhow!("ingredients are required"));
        }
        Ok(self.resolver.search(&query, self.external_enabled).await)
    }

    pub async fn recipe(&self, id: &str) -> Option<Recipe> {
        self.resolver.find_by_id(id).await
    }

    pub fn all_recipes(&self) -> Result<Vec<Recipe>> {
        self.resolver.catalog().all()
    }

    pub fn reload(&self) -> Result<usize> {
        catalog::reload(self.resolver.catalog().as_ref(), &self.catalog_path)
    }

    pub async fn detect(
        &self,
        image: &DataAttachment,
        backend: Option<DetectorBackend>,
    ) -> DetectionResult {
        let backend = backend.unwrap_or(self.default_backend);
        self.detector.detect(image, backend).await
    }
}
