use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

const VERBOSE_DIRECTIVES: &str = "recipe_assistant_rust=debug,info";

/// Installs the fmt subscriber when `--verbose` is given or `RUST_LOG` is set.
///
/// `RUST_LOG` wins over the verbose defaults, so single modules (for example
/// `recipe_assistant_rust::detect=trace`) can be singled out.
pub fn init(verbose: bool) -> Result<()> {
    let Some(filter) = filter_for(verbose, std::env::var("RUST_LOG").ok().as_deref()) else {
        return Ok(());
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init();
    Ok(())
}

fn filter_for(verbose: bool, rust_log: Option<&str>) -> Option<EnvFilter> {
    match rust_log.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => Some(
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(VERBOSE_DIRECTIVES)),
        ),
        None if verbose => Some(EnvFilter::new(VERBOSE_DIRECTIVES)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_without_verbose_or_rust_log() {
        assert!(filter_for(false, None).is_none());
        assert!(filter_for(false, Some("  ")).is_none());
    }

    #[test]
    fn verbose_uses_crate_debug_directives() {
        let filter = filter_for(true, None).expect("filter");
        assert!(filter.to_string().contains("recipe_assistant_rust=debug"));
    }

    #[test]
    fn rust_log_overrides_verbose_defaults() {
        let filter = filter_for(false, Some("recipe_assistant_rust::detect=trace")).expect("filter");
        assert_eq!(filter.to_string(), "recipe_assistant_rust::detect=trace");
    }
}
