use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod batch;
mod cli;
mod collector;
mod diffsplit;
mod enrichment;
mod gitio;
mod issues;
mod model;
mod store;
mod util;
mod workdir;

use crate::cli::{normalize, Cli};

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;

  // Phase 2: select an issue-tracker backend (best-effort)
  let tracker = if cfg.enrich {
    let built = enrichment::github_api::build_tracker(&cfg.api_base);
    if built.is_none() {
      warn!("no issue-tracker credentials found; set GITHUB_TOKEN or run: gh auth login (continuing without enrichment)");
    }
    built
  } else {
    None
  };

  // Phase 3: collect, enrich, and explode batch by batch
  batch::run_batches(&cfg, tracker.as_deref())
}
