//! Rendering of a [`TrendReport`] for stdout or an output file.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use glucose_core::formatting::{
    format_count, format_day, format_glucose, format_month, format_number, percentage,
};
use glucose_core::models::{PipelineNotice, SmoothCurve, Stage};
use glucose_data::analysis::TrendReport;

/// Output format selected by `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Summary,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> anyhow::Result<Self> {
        match name {
            "json" => Ok(Self::Json),
            "summary" => Ok(Self::Summary),
            other => anyhow::bail!("Unknown output format: {other}"),
        }
    }
}

pub fn render(report: &TrendReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Summary => Ok(render_summary(report)),
    }
}

pub fn render_json(report: &TrendReport) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(report).context("serialising trend report")?;
    json.push('\n');
    Ok(json)
}

/// Plain-text overview: coverage, outliers, monthly means and curve extents.
pub fn render_summary(report: &TrendReport) -> String {
    let meta = &report.metadata;
    let mut out = String::new();

    match (report.daily.points.first(), report.daily.points.last()) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                out,
                "Glucose trends {} to {}",
                format_day(first.date),
                format_day(last.date)
            );
        }
        _ => out.push_str("Glucose trends\n"),
    }

    if let Some(source) = &meta.source {
        let _ = writeln!(
            out,
            "Source: {} ({} export, {} rows, {} skipped)",
            source.path.display(),
            source.schema,
            format_count(source.ingest.rows_read),
            format_count(source.ingest.rows_skipped)
        );
    }

    let _ = writeln!(
        out,
        "Days with data: {} of {} ({}%)",
        meta.days_with_data,
        meta.days_covered,
        format_number(
            percentage(meta.days_with_data as f64, meta.days_covered as f64, 1),
            1
        )
    );

    match meta.outlier_bounds {
        Some(bounds) => {
            let _ = writeln!(
                out,
                "Outliers removed: {} (accepted {} to {})",
                meta.outliers_removed,
                format_glucose(Some(bounds.lower)),
                format_glucose(Some(bounds.upper))
            );
        }
        None => out.push_str("Outliers removed: 0\n"),
    }

    out.push('\n');
    if report.monthly.is_empty() {
        out.push_str("No monthly means\n");
    } else {
        out.push_str("Month     Mean\n");
        for point in &report.monthly.points {
            let _ = writeln!(
                out,
                "{:<9} {}",
                format_month(point.date),
                format_glucose(point.value)
            );
        }
    }

    out.push('\n');
    out.push_str(&curve_line("Weekly curve", report.weekly_curve.as_ref()));
    out.push_str(&curve_line("Monthly curve", report.monthly_curve.as_ref()));

    if !report.notices.is_empty() {
        out.push_str("\nNotices:\n");
        for notice in &report.notices {
            let _ = writeln!(out, "  - {}", describe_notice(notice));
        }
    }

    out
}

/// Write `content` to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

// ── Helpers ────────────────────────────────────────────────────────────────────

fn curve_line(label: &str, curve: Option<&SmoothCurve>) -> String {
    match curve.and_then(|c| c.value_range().map(|range| (c.len(), range))) {
        Some((samples, (lo, hi))) => format!(
            "{label}: {samples} samples, {} to {}\n",
            format_glucose(Some(lo)),
            format_glucose(Some(hi))
        ),
        None => format!("{label}: not enough data\n"),
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Daily => "daily means",
        Stage::WeeklyCurve => "weekly curve",
        Stage::MonthlyCurve => "monthly curve",
    }
}

fn describe_notice(notice: &PipelineNotice) -> String {
    match notice {
        PipelineNotice::InsufficientData { stage, points } => format!(
            "{} skipped: {} usable point(s)",
            stage_label(*stage),
            points
        ),
        PipelineNotice::DegenerateDistribution { value } => format!(
            "all daily means equal {}; outlier bounds collapsed",
            format_glucose(Some(*value))
        ),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
