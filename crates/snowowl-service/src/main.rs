//! Snow Owl RF2 import binary.

use snowowl_service::{run, ImportSettings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings = ImportSettings::from_env()?;
    tracing::info!(
        "Importing {} release {} onto {}",
        settings.config.release_type,
        settings.archive.display(),
        settings.branch
    );

    let response = run(&settings)?;
    for defect in &response.defects {
        tracing::warn!("{}", defect);
    }
    tracing::info!(
        "Import finished with status {:?}: {} slices, {} visited components",
        response.status,
        response.imported_slices.len(),
        response.visited_components.len()
    );

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
