use anyhow::{anyhow, bail, Result};
use crossterm::style::Stylize;
use solar_cli::api_client::{
    AnalysisRequest, AnalysisWeights, ExportFormat, ScoreRange, SiteFilter, SolarApiClient,
};
use solar_cli::config::Config;
use solar_cli::export::{self, resolve_sink};
use solar_cli::logging;
use solar_cli::table_display;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

fn print_help() {
    println!("{}", "Solar CLI - solar site analysis client".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  solar-cli <COMMAND> [OPTIONS]");
    println!();
    println!("{}", "Commands:".yellow());
    println!(
        "  {}    - List sites (--min-score, --max-score, --limit, --offset)",
        "sites".green()
    );
    println!("  {} - Show one site", "site <id>".green());
    println!(
        "  {}  - Recalculate suitability scores (--solar, --area, --grid-distance, --slope, --infrastructure)",
        "analyze".green()
    );
    println!(
        "  {}    - Aggregate metrics (--min-score, --max-score)",
        "stats".green()
    );
    println!("  {}   - Check service availability", "health".green());
    println!(
        "  {} - Save a dated export file (--min-score, --max-score, --output-dir)",
        "export <csv|json>".green()
    );
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {} - Print a commented default config file",
        "--generate-config".green()
    );
    println!("  {}         - Debug-level logging", "--verbose".green());
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Environment:".yellow());
    println!("  SOLAR_API_URL - Override the configured service base URL");
    println!("  RUST_LOG      - Log filter (overrides --verbose)");
    println!();
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    if args[0] == "--generate-config" {
        println!("{}", Config::create_default_with_comments());
        return;
    }

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    logging::init_tracing(verbose);

    if let Err(e) = run(&args).await {
        eprintln!("{} {e:#}", "error:".red().bold());
        process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let config = Config::load()?;

    // Env var wins over the config file
    let base_url = match std::env::var("SOLAR_API_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => config.api.base_url.clone(),
    };

    let client =
        SolarApiClient::with_timeout(&base_url, Duration::from_secs(config.api.timeout_secs))?;
    tracing::debug!(target: "api", "using service at {}", client.base_url());

    run_command(args, &client, &config).await
}

async fn run_command(args: &[String], client: &SolarApiClient, config: &Config) -> Result<()> {
    let color = config.display.color;

    match args[0].as_str() {
        "sites" => {
            let filter = SiteFilter {
                min_score: flag_f64(args, "--min-score")?,
                max_score: flag_f64(args, "--max-score")?,
                limit: flag_u32(args, "--limit")?,
                offset: flag_u32(args, "--offset")?,
            };
            let list = client.get_sites(&filter).await?;
            table_display::display_sites(&list, color);
        }
        "site" => {
            let raw = positional(args, 1)
                .ok_or_else(|| anyhow!("usage: solar-cli site <id>"))?;
            let site_id: u32 = raw
                .parse()
                .map_err(|_| anyhow!("site id must be a positive integer, got '{raw}'"))?;
            let site = client.get_site_by_id(site_id).await?;
            table_display::display_site_detail(&site, color);
        }
        "analyze" => {
            let defaults = AnalysisWeights::default();
            let weights = AnalysisWeights {
                solar: flag_f64(args, "--solar")?.unwrap_or(defaults.solar),
                area: flag_f64(args, "--area")?.unwrap_or(defaults.area),
                grid_distance: flag_f64(args, "--grid-distance")?.unwrap_or(defaults.grid_distance),
                slope: flag_f64(args, "--slope")?.unwrap_or(defaults.slope),
                infrastructure: flag_f64(args, "--infrastructure")?
                    .unwrap_or(defaults.infrastructure),
            };
            if (weights.sum() - 1.0).abs() > 1e-3 {
                tracing::warn!(target: "api", "weights sum to {:.3}, not 1.0", weights.sum());
            }
            let response = client.analyze_sites(&AnalysisRequest { weights }).await?;
            table_display::display_analysis(&response, color);
        }
        "stats" => {
            let range = ScoreRange {
                min_score: flag_f64(args, "--min-score")?,
                max_score: flag_f64(args, "--max-score")?,
            };
            let stats = client.get_statistics(&range).await?;
            table_display::display_statistics(&stats, color);
        }
        "health" => {
            let health = client.health_check().await?;
            table_display::display_health(&health, color);
        }
        "export" => {
            let format = match positional(args, 1) {
                Some("csv") => ExportFormat::Csv,
                Some("json") => ExportFormat::Json,
                _ => bail!("usage: solar-cli export <csv|json> [--min-score N] [--max-score N] [--output-dir DIR]"),
            };
            let range = ScoreRange {
                min_score: flag_f64(args, "--min-score")?,
                max_score: flag_f64(args, "--max-score")?,
            };
            let output_dir = flag_value(args, "--output-dir").map(PathBuf::from);
            let sink = resolve_sink(output_dir.as_deref(), config.export.output_dir.as_deref());
            let path = match format {
                ExportFormat::Csv => export::download_csv(client, &sink, &range).await?,
                ExportFormat::Json => export::download_json(client, &sink, &range).await?,
            };
            table_display::display_export_path(&path, color);
        }
        other => bail!("unknown command '{other}', try --help"),
    }

    Ok(())
}

/// Positional argument at `index`, skipping over flags and their values.
fn positional(args: &[String], index: usize) -> Option<&str> {
    let mut seen = 0;
    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg.starts_with("--") {
            // Value-carrying flags consume the next argument
            if matches!(
                arg.as_str(),
                "--min-score"
                    | "--max-score"
                    | "--limit"
                    | "--offset"
                    | "--solar"
                    | "--area"
                    | "--grid-distance"
                    | "--slope"
                    | "--infrastructure"
                    | "--output-dir"
            ) {
                i += 1;
            }
        } else if arg == "-v" {
            // bare switch
        } else {
            if seen == index {
                return Some(arg);
            }
            seen += 1;
        }
        i += 1;
    }
    None
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn flag_f64(args: &[String], name: &str) -> Result<Option<f64>> {
    match flag_value(args, name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{name} expects a number, got '{raw}'")),
        None => Ok(None),
    }
}

fn flag_u32(args: &[String], name: &str) -> Result<Option<u32>> {
    match flag_value(args, name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{name} expects a non-negative integer, got '{raw}'")),
        None => Ok(None),
    }
}
