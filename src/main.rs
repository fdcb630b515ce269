mod archiver;
mod config;
mod error;
mod extract;
mod fetcher;
mod models;
mod parser;

use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;

const CONFIG_PATH: &str = "config.json";
const OUTPUT_DIR: &str = "public";

fn main() -> Result<()> {
    // stdout is reserved for the final summary line
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // A missing .env is fine; FEED_URL may come from the real environment
    dotenvy::dotenv().ok();

    let out_dir = Path::new(OUTPUT_DIR);
    let rows = run(Path::new(CONFIG_PATH), out_dir)?;

    println!(
        "OK: {} rows -> {}",
        rows,
        out_dir.join(archiver::CSV_FILE_NAME).display()
    );
    Ok(())
}

/// Runs the whole export and returns the number of data rows written.
fn run(config_path: &Path, out_dir: &Path) -> Result<usize> {
    let feed_url = config::feed_url_from_env()?;
    let settings = Settings::load(config_path, feed_url)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    tracing::debug!(?settings, "settings loaded");

    tracing::info!(url = %settings.feed_url, "fetching feed");
    let raw = fetcher::fetch_xml(&settings.feed_url).context("failed to fetch feed")?;

    let xml = parser::decode_feed(&raw).context("failed to parse feed")?;
    let doc = parser::parse_document(&xml).context("failed to parse feed")?;
    let products = parser::parse_products(&doc, &settings);
    tracing::info!(products = products.len(), "feed parsed");

    let header = models::header(&settings.lang, settings.max_images);
    let rows: Vec<Vec<String>> = products
        .into_iter()
        .map(|product| product.into_row(settings.max_images))
        .collect();

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    archiver::write_csv(
        &out_dir.join(archiver::CSV_FILE_NAME),
        &header,
        &rows,
        &settings,
    )
    .context("failed to write CSV")?;
    let index = archiver::write_index(out_dir).context("failed to write landing page")?;
    tracing::info!(path = %index.display(), "landing page written");

    Ok(rows.len())
}
