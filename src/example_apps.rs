use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};

use crate::anova::AnovaOutcome;
use crate::config::{AssignmentPolicy, PipelineConfig};
use crate::constants::outputs::{EVENTS_FILENAME, INDEX_FILENAME, PANEL_FILENAME};
use crate::constants::sources::{
    ASSIGNMENTS_SOURCE_ID, EARTHQUAKE_SOURCE_ID, PRICE_SOURCE_ID, TRENDS_SOURCE_ID,
};
use crate::metrics::{DeltaGrouping, DeltaSummaries, describe_index, summarize_deltas};
use crate::pipeline::{PipelineInputs, PipelineReport, run_pipeline};
use crate::transport::{CsvFileSource, write_events, write_index, write_panel};

#[derive(Debug, Parser)]
#[command(
    name = "stress_analysis",
    disable_help_subcommand = true,
    about = "Regional stress response to earthquake and currency shocks",
    long_about = "Build a regional stress index from keyword search interest, extract earthquake and currency-shock dates, compare pre/post-event stress per region, and test whether the change differs across regions.",
    after_help = "Threshold flags override values loaded with --config; anything unset falls back to the built-in defaults."
)]
/// CLI for `stress_analysis`.
///
/// Common usage:
/// - Wide trends export with regions inline: `--trends trends.csv --earthquakes quakes.csv --prices usdtry.csv`
/// - Separate region listing: add `--assignments provinces.csv` (`code,region7`)
/// - Reject provinces listed under two regions: `--strict-assignments`
struct StressAnalysisCli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Keyword search-interest CSV (wide: one column per keyword; long: keyword,raw_score)"
    )]
    trends: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        help = "Optional province to region listing with code and region7 columns"
    )]
    assignments: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Seismic catalog CSV with Date (day-first), Magnitude, Depth"
    )]
    earthquakes: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Currency price CSV with Date (month-first) and Price"
    )]
    prices: Option<PathBuf>,
    #[arg(
        long = "out-dir",
        value_name = "DIR",
        default_value = "outputs",
        help = "Directory for the index, event, and panel tables"
    )]
    out_dir: PathBuf,
    #[arg(
        long,
        value_name = "PATH",
        help = "JSON run configuration; missing fields take defaults"
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "keyword",
        value_name = "NAME",
        help = "Keyword column to read from a wide export, repeat as needed"
    )]
    keywords: Vec<String>,
    #[arg(long = "pre-days", help = "Calendar days before each event")]
    pre_days: Option<u32>,
    #[arg(long = "post-days", help = "Calendar days from each event onward")]
    post_days: Option<u32>,
    #[arg(long, value_parser = parse_alpha, help = "Significance level in (0, 1)")]
    alpha: Option<f64>,
    #[arg(long = "min-magnitude", help = "Minimum earthquake magnitude")]
    min_magnitude: Option<f64>,
    #[arg(
        long = "min-depth",
        allow_negative_numbers = true,
        help = "Minimum earthquake depth in km"
    )]
    min_depth: Option<f64>,
    #[arg(long = "max-depth", help = "Maximum earthquake depth in km")]
    max_depth: Option<f64>,
    #[arg(
        long = "return-threshold",
        help = "Absolute daily log-return that counts as a currency shock"
    )]
    return_threshold: Option<f64>,
    #[arg(
        long = "strict-assignments",
        help = "Fail when a province is listed under two different regions"
    )]
    strict_assignments: bool,
    #[arg(long, help = "Standardize and build windows on the rayon thread pool")]
    parallel: bool,
}

impl StressAnalysisCli {
    fn resolve_config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json(&fs::read_to_string(path)?)?,
            None => PipelineConfig::default(),
        };
        if let Some(days) = self.pre_days {
            config.window.pre_days = days;
        }
        if let Some(days) = self.post_days {
            config.window.post_days = days;
        }
        if let Some(alpha) = self.alpha {
            config.test.alpha = alpha;
        }
        if let Some(value) = self.min_magnitude {
            config.events.seismic.min_magnitude = value;
        }
        if let Some(value) = self.min_depth {
            config.events.seismic.min_depth_km = value;
        }
        if let Some(value) = self.max_depth {
            config.events.seismic.max_depth_km = value;
        }
        if let Some(value) = self.return_threshold {
            config.events.returns.abs_log_return = value;
        }
        if self.strict_assignments {
            config.normalizer.assignment_policy = AssignmentPolicy::RejectConflicts;
        }
        config.parallel |= self.parallel;
        config.validate()?;
        Ok(config)
    }

    fn inputs(&self) -> PipelineInputs {
        let mut inputs = PipelineInputs::new(CsvFileSource::new(TRENDS_SOURCE_ID, &self.trends));
        if !self.keywords.is_empty() {
            inputs = inputs.with_keywords(self.keywords.iter().cloned());
        }
        if let Some(path) = &self.assignments {
            inputs = inputs.with_assignments(CsvFileSource::new(ASSIGNMENTS_SOURCE_ID, path));
        }
        if let Some(path) = &self.earthquakes {
            inputs = inputs.with_seismic(CsvFileSource::new(EARTHQUAKE_SOURCE_ID, path));
        }
        if let Some(path) = &self.prices {
            inputs = inputs.with_prices(CsvFileSource::new(PRICE_SOURCE_ID, path));
        }
        inputs
    }
}

/// Run the end-to-end analysis from command-line arguments (program name excluded).
///
/// Writes the index, event, and panel tables to `--out-dir` and prints the
/// test decision. A test that could not run (too few regions or deltas) is
/// reported, not treated as a failure.
pub fn run_stress_analysis<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<StressAnalysisCli, _>(
        std::iter::once("stress_analysis".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = cli.resolve_config()?;
    let report = run_pipeline(&cli.inputs(), &config)?;

    write_index(cli.out_dir.join(INDEX_FILENAME), &report.index)?;
    write_events(cli.out_dir.join(EVENTS_FILENAME), &report.events)?;
    write_panel(cli.out_dir.join(PANEL_FILENAME), &report.panel)?;

    print_report(&report, &config);
    println!();
    println!("outputs written to {}", cli.out_dir.display());
    Ok(())
}

fn print_report(report: &PipelineReport, config: &PipelineConfig) {
    println!("=== regional stress response ===");
    if let Some(summary) = describe_index(&report.index) {
        println!(
            "index: rows={} regions={} span={}..{} stress mean={:.3} min={:.3} max={:.3}",
            summary.rows,
            summary.regions,
            summary.first_date,
            summary.last_date,
            summary.mean,
            summary.min,
            summary.max
        );
    }
    println!(
        "dropped: missing_score={} unassigned={} unparseable_trend_rows={} reassigned_entities={}",
        report.standardized.dropped_missing_score,
        report.standardized.dropped_unassigned,
        report.skipped_trend_rows,
        report.overridden_assignments
    );
    println!();

    println!("[EVENTS]");
    for extraction in &report.extraction {
        println!(
            "  {}: candidates={} dropped={} selected={} event_days={}",
            extraction.event_type,
            extraction.candidates,
            extraction.dropped,
            extraction.selected,
            extraction.events.len()
        );
    }
    for failure in &report.source_failures {
        println!("  {}: FAILED ({})", failure.source_id, failure.error);
    }
    println!(
        "  total events={} window=-{}d/+{}d panel rows={}",
        report.events.len(),
        config.window.pre_days,
        config.window.post_days,
        report.panel.len()
    );
    println!();

    print_delta_summaries(
        "[DELTA BY REGION]",
        &summarize_deltas(&report.panel, DeltaGrouping::Region),
    );
    print_delta_summaries(
        "[DELTA BY EVENT TYPE]",
        &summarize_deltas(&report.panel, DeltaGrouping::EventType),
    );

    println!("[ANOVA: delta_stress ~ region7]");
    match &report.decision {
        Ok(decision) => {
            println!(
                "  observations={} groups={} excluded={} df=({}, {})",
                decision.n_observations,
                decision.n_groups,
                decision.n_excluded,
                decision.df_between,
                decision.df_within
            );
            match (decision.outcome, decision.f_statistic, decision.p_value) {
                (AnovaOutcome::Tested, Some(f), Some(p)) => {
                    println!("  F={f:.4} p={p:.6} alpha={}", decision.alpha);
                }
                _ => println!("  every delta is identical; no F statistic"),
            }
            if decision.reject_null {
                println!("  decision: reject H0, mean stress change differs across regions");
            } else {
                println!("  decision: fail to reject H0, no evidence of regional difference");
            }
        }
        Err(error) => println!("  not performed: {error}"),
    }
}

fn print_delta_summaries(label: &str, summaries: &DeltaSummaries) {
    println!("{label}");
    for group in &summaries.groups {
        println!(
            "  {}: n={} mean={:.4} std={:.4} min={:.4} max={:.4}",
            group.key, group.count, group.mean, group.std, group.min, group.max
        );
    }
    if summaries.excluded > 0 {
        println!("  (excluded {} rows with a missing delta)", summaries.excluded);
    }
    println!();
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_alpha(raw: &str) -> Result<f64, String> {
    let parsed = raw
        .parse::<f64>()
        .map_err(|_| format!("Could not parse --alpha value '{}' as a number", raw))?;
    if !(parsed > 0.0 && parsed < 1.0) {
        return Err("--alpha must lie strictly between 0 and 1".to_string());
    }
    Ok(parsed)
}
