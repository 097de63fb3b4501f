use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "recipe-assistant-rust",
    version,
    about = "Bilingual (English/Japanese) recipe search and ingredient detection"
)]
struct Cli {
    /// Start the HTTP API server
    #[arg(long = "server")]
    server: bool,

    /// Listen address for --server (overrides settings [server] addr)
    #[arg(long = "addr")]
    addr: Option<String>,

    /// Search recipes by ingredients, separated by "," or "、"
    #[arg(short = 'i', long = "ingredients")]
    ingredients: Option<String>,

    /// Show one recipe by id (numeric catalog id or ext_<id>)
    #[arg(short = 'r', long = "recipe")]
    recipe: Option<String>,

    /// Detect ingredients in an image file
    #[arg(short = 'd', long = "detect")]
    detect: Option<String>,

    /// Detector backend for --detect (local, external)
    #[arg(short = 'b', long = "backend")]
    backend: Option<String>,

    /// Also query the external recipe source (true/false, overrides settings)
    #[arg(long = "external")]
    external: Option<bool>,

    /// Read extra settings from a local TOML file
    #[arg(short = 's', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    recipe_assistant_rust::logging::init(cli.verbose)?;

    let config = recipe_assistant_rust::Config {
        settings_path: cli.read_settings,
        ingredients: cli.ingredients,
        recipe: cli.recipe,
        detect: cli.detect,
        backend: cli.backend,
        external: cli.external,
        addr: cli.addr,
    };

    if cli.server {
        return recipe_assistant_rust::serve(config).await;
    }

    let output = recipe_assistant_rust::run(config).await?;
    println!("{}", output);
    Ok(())
}
