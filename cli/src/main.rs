mod config;
mod error;
mod inspect;
mod logging;

use sensorthings_core::ParseContext;

use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::inspect::inspect;
use crate::logging::init_logging;

struct Args {
    config: Option<String>,
    urls: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config = None;
    let mut urls = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = Some(args.next().ok_or(CliError::Usage)?);
        } else {
            urls.push(arg);
        }
    }
    if urls.is_empty() {
        return Err(CliError::Usage);
    }
    Ok(Args { config, urls })
}

fn main() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    let config = CliConfig::from_sources(args.config.as_deref())?;
    init_logging(&config)?;

    tracing::info!(event = "cli.start", urls = args.urls.len());

    let registry = config.build_model()?;
    let settings = config.parser_settings();
    let ctx = ParseContext::new(&registry, &settings);
    tracing::info!(
        event = "model.ready",
        entity_types = registry.entity_types().count(),
        plugins = ?registry.plugins()
    );

    let mut rejected = 0usize;
    for url in &args.urls {
        match inspect(&ctx, &config.service_root_url, url) {
            Ok(inspection) => println!("{}", inspection.render()),
            Err(err) => {
                eprintln!("{url}: {err}");
                rejected += 1;
            }
        }
    }

    if rejected > 0 {
        log::warn!("{rejected} of {} requests rejected", args.urls.len());
        std::process::exit(1);
    }
    Ok(())
}
