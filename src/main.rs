use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tttb_reports::combiner::{combine_directory, RangeSelection};
use tttb_reports::config::{ConfigStore, FileConfigStore, ReportConfig};
use tttb_reports::locate::{locate_results, ResultSelector};
use tttb_reports::report::multiplayer::write_multiplayer_report;
use tttb_reports::report::single_player::{load_single_player_data, write_single_player_report};
use tttb_reports::report::ReportSummary;
use webbrowser::Browser;

/// combine multiplayer typing results and chart typing-test logs
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Combines per-player typing test result files into one multiplayer results file and renders single-player and multiplayer statistics as static HTML charts."
)]
pub struct Cli {
    /// config file to use instead of the per-user one
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// log debug detail
    #[clap(short, long, global = true)]
    verbose: bool,

    /// open the chart index in a browser once charts are written
    #[clap(long, global = true)]
    open: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// merge per-player result files covering one verse range
    Combine {
        /// verse id range as FIRST_LAST, or y to detect it from the first file
        range: RangeSelection,

        /// directory of files to combine (defaults to the configured one)
        #[clap(long)]
        dir: Option<PathBuf>,

        /// skip charting the combined file
        #[clap(long)]
        no_visualize: bool,
    },
    /// chart one multiplayer results file
    Multiplayer {
        /// timestamp within the file name, a csv path, or y for the most recent file
        selector: ResultSelector,

        /// directory to search (defaults to the configured multiplayer directory)
        #[clap(long)]
        dir: Option<PathBuf>,
    },
    /// chart the single-player test log
    SinglePlayer {
        #[clap(long)]
        test_results: Option<PathBuf>,

        #[clap(long)]
        word_results: Option<PathBuf>,

        /// verse catalog used for progress charts
        #[clap(long)]
        catalog: Option<PathBuf>,
    },
    /// print the active configuration
    Config {
        /// write the active configuration to the config file
        #[clap(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let cfg = store.load();
    let started = Instant::now();

    let summary = match &cli.command {
        Command::Combine {
            range,
            dir,
            no_visualize,
        } => combine(&cfg, *range, dir.as_deref(), *no_visualize)?,
        Command::Multiplayer { selector, dir } => {
            let dir = dir.clone().unwrap_or_else(|| cfg.multiplayer_results_dir());
            let results = locate_results(&dir, selector)?;
            Some(
                write_multiplayer_report(&results, &cfg.multiplayer_visualizations_dir())
                    .with_context(|| format!("charting {}", results.display()))?,
            )
        }
        Command::SinglePlayer {
            test_results,
            word_results,
            catalog,
        } => {
            let test_results = test_results.clone().unwrap_or_else(|| cfg.test_results_path());
            let word_results = word_results.clone().unwrap_or_else(|| cfg.word_results_path());
            let catalog = catalog.clone().unwrap_or_else(|| cfg.verse_catalog_path());
            let data = load_single_player_data(
                &test_results,
                Some(word_results.as_path()),
                Some(catalog.as_path()),
            )
            .with_context(|| format!("loading {}", test_results.display()))?;
            Some(write_single_player_report(
                &data,
                &cfg,
                &cfg.single_player_visualizations_dir(),
            )?)
        }
        Command::Config { init } => {
            if *init {
                store.save(&cfg)?;
                println!("wrote {}", store.path().display());
            }
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            None
        }
    };

    if let Some(summary) = summary {
        println!(
            "wrote {} charts to {} in {:.2?}",
            summary.charts.len(),
            summary.dir.display(),
            started.elapsed()
        );
        if cli.open {
            open_index(&summary);
        }
    }
    Ok(())
}

fn combine(
    cfg: &ReportConfig,
    range: RangeSelection,
    dir: Option<&Path>,
    no_visualize: bool,
) -> Result<Option<ReportSummary>> {
    let input = dir.map(Path::to_path_buf).unwrap_or_else(|| cfg.combine_dir());
    let combined = combine_directory(&input, range)
        .with_context(|| format!("combining files in {}", input.display()))?;
    for exclusion in &combined.exclusions {
        println!(
            "excluded {} from {}: typed {} of {} verses",
            exclusion.player,
            exclusion.file,
            exclusion.verses_typed,
            combined.range.len()
        );
    }
    let output = combined.write_to(&cfg.multiplayer_results_dir())?;
    println!(
        "combined {} tests over verses {} into {}",
        combined.records.len(),
        combined.range,
        output.display()
    );
    if no_visualize {
        return Ok(None);
    }
    let summary = write_multiplayer_report(&output, &cfg.multiplayer_visualizations_dir())
        .with_context(|| format!("charting {}", output.display()))?;
    Ok(Some(summary))
}

fn open_index(summary: &ReportSummary) {
    if !Browser::is_available() {
        warn!("no browser available to open {}", summary.index.display());
        return;
    }
    let target = summary
        .index
        .canonicalize()
        .unwrap_or_else(|_| summary.index.clone());
    match webbrowser::open(&target.to_string_lossy()) {
        Ok(()) => info!("opened {}", target.display()),
        Err(e) => warn!("could not open {}: {e}", target.display()),
    }
}
