mod bootstrap;
mod output;

use anyhow::{Context, Result};
use glucose_core::settings::Settings;
use glucose_data::analysis::analyze_export;
use glucose_data::reader::{parse_schema_choice, ReaderOptions};

use crate::output::OutputFormat;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Glucose Trends v{} starting", env!("CARGO_PKG_VERSION"));

    let Some(input) = settings.input.clone() else {
        if settings.clear {
            tracing::info!("Cleared saved parameters");
            return Ok(());
        }
        anyhow::bail!("No export to analyse; pass one with --input <PATH>");
    };

    let format = OutputFormat::from_name(&settings.format)?;
    let options = ReaderOptions {
        schema: parse_schema_choice(&settings.schema)?,
        timestamp_format: settings.timestamp_format.clone(),
        timezone: settings.timezone.clone(),
    };
    tracing::info!(
        "Input: {}, schema: {}, timezone: {}",
        input.display(),
        settings.schema,
        settings.timezone
    );

    let report = analyze_export(&input, &options, &settings.trend_config())
        .with_context(|| format!("analysing {}", input.display()))?;

    let rendered = output::render(&report, format)?;
    output::write_output(&rendered, settings.output.as_deref())?;

    Ok(())
}
