use iss_tracker::config::{self, TrackerConfig};
use iss_tracker::Pipeline;

use anyhow::{Context, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = TrackerConfig::load_or_default(config::DEFAULT_CONFIG_PATH)
        .context("Failed to load configuration")?;

    // Initialize logging
    let _logging_guard =
        iss_tracker::logging::init_logging(&config.log_dir, "iss-tracker", &config.log_level);

    tracing::info!("ISS tracker starting...");
    if !std::path::Path::new(config::DEFAULT_CONFIG_PATH).exists() {
        tracing::info!("No {} found, using built-in defaults", config::DEFAULT_CONFIG_PATH);
    }

    let pipeline = Pipeline::from_config(&config).context("Failed to set up HTTP clients")?;

    let rendered = match pipeline.run().await {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            return Err(e).context("ISS tracker run failed");
        }
    };

    tracing::info!(
        "ISS over {}, image written to {:?}",
        rendered.classification,
        rendered.path
    );

    Ok(())
}
