use anyhow::{Context, Result, anyhow};
use std::path::Path;

mod assistant;
pub mod catalog;
pub mod data;
pub mod detect;
pub mod external;
pub mod lexicon;
pub mod logging;
pub mod providers;
pub mod recipe;
pub mod resolver;
pub mod server;
pub mod settings;
pub mod terms;
mod test_util;

pub use assistant::Assistant;
pub use detect::{DetectionResult, DetectorBackend, Provenance};
pub use recipe::{Recipe, SearchResult, SourceLabel};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings_path: Option<String>,
    pub ingredients: Option<String>,
    pub recipe: Option<String>,
    pub detect: Option<String>,
    pub backend: Option<String>,
    pub external: Option<bool>,
    pub addr: Option<String>,
}

/// Runs one CLI query against a freshly seeded assistant and returns the text to print.
pub async fn run(config: Config) -> Result<String> {
    let (_, assistant) = prepare(&config)?;

    if let Some(input) = config.ingredients.as_deref() {
        let result = assistant.search(input).await?;
        return Ok(format_search_output(&result));
    }
    if let Some(id) = config.recipe.as_deref() {
        let id = id.trim();
        let recipe = assistant
            .recipe(id)
            .await
            .ok_or_else(|| anyhow!("recipe not found: {}", id))?;
        return serde_json::to_string_pretty(&recipe).with_context(|| "failed to render recipe");
    }
    if let Some(path) = config.detect.as_deref() {
        let backend = config
            .backend
            .as_deref()
            .map(str::parse::<DetectorBackend>)
            .transpose()?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image: {}", path))?;
        let image = data::load_image_from_bytes(bytes, None)?;
        let result = assistant.detect(&image, backend).await;
        return Ok(format_detection_output(&result));
    }

    Err(anyhow!(
        "nothing to do; pass --server, --ingredients, --recipe or --detect"
    ))
}

/// Starts the HTTP API and serves until the process exits.
pub async fn serve(config: Config) -> Result<()> {
    let (settings, assistant) = prepare(&config)?;
    let addr = config
        .addr
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(&settings.server_addr)
        .to_string();
    server::run_server(server::ServerState::new(assistant), &addr).await
}

fn prepare(config: &Config) -> Result<(settings::Settings, Assistant)> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(external) = config.external {
        settings.external_enabled = external;
    }
    let assistant = Assistant::from_settings(&settings)?;
    Ok((settings, assistant))
}

fn format_search_output(result: &SearchResult) -> String {
    let mut lines = vec![format!(
        "source: {} (local {}, external {})",
        result.source_label().as_str(),
        result.local_count,
        result.external_count
    )];
    for recipe in &result.recipes {
        let mut line = format!("{}\t{}", recipe.id, recipe.title);
        if !recipe.title_localized.is_empty() && recipe.title_localized != recipe.title {
            line.push_str(&format!(" / {}", recipe.title_localized));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn format_detection_output(result: &DetectionResult) -> String {
    let confidence = result
        .confidence()
        .map(|value| format!("{:.2}", value))
        .unwrap_or_else(|| "unavailable".to_string());
    [
        format!("english: {}", result.english().join(", ")),
        format!("japanese: {}", result.japanese().join("、")),
        format!("confidence: {}", confidence),
        format!("source: {}", result.provenance().as_str()),
    ]
    .join("\n")
}
