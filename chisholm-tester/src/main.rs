mod logic;
mod util;

use anyhow::{Context, Result, bail};
use chisholm_game::OutfitConfig;
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{
    DriveRecord, GameplayStrategy, SimulationConfig, TesterAssets, aggregate,
    resolve_seed_inputs, simulate_drive,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "chisholm-tester", version = "0.1.0")]
#[command(about = "Headless playtests for the Chisholm Trail drive - scripted strategies over seeded runs")]
struct Args {
    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated integers or a..b ranges)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Drives per seed; iteration i plays seed + i
    #[arg(long, default_value_t = 10)]
    iterations: u64,

    /// Give up on a drive still on the trail after this many turns
    #[arg(long, default_value_t = 100)]
    max_turns: u32,

    /// JSON file with the outfit to start every drive with
    #[arg(long)]
    outfit: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    if args.report == "console" || args.output.is_some() {
        announce_banner();
    }

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let outfit = match &args.outfit {
        Some(path) => load_outfit(path)?,
        None => OutfitConfig::default(),
    };
    let assets = TesterAssets::load_default()?;

    let records = run_drives(&args, &assets, &strategies, &seeds, outfit)?;
    write_reports(&args, &records, start_time)
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:10} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🐂 Chisholm Trail Drive Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn expand_strategies(arg: &str) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(arg) {
        if token.eq_ignore_ascii_case("all") {
            for strategy in GameplayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let Ok(strategy) = token.parse::<GameplayStrategy>() else {
            bail!("Unknown strategy: {token} (try --list-strategies)");
        };
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        bail!("No strategies selected");
    }
    Ok(strategies)
}

fn load_outfit(path: &Path) -> Result<OutfitConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read outfit {}", path.display()))?;
    let outfit: OutfitConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse outfit {}", path.display()))?;
    outfit
        .validate()
        .with_context(|| format!("outfit {} is out of range", path.display()))?;
    Ok(outfit)
}

fn run_drives(
    args: &Args,
    assets: &TesterAssets,
    strategies: &[GameplayStrategy],
    seeds: &[u64],
    outfit: OutfitConfig,
) -> Result<Vec<DriveRecord>> {
    let mut records = Vec::new();
    for &strategy in strategies {
        for &base_seed in seeds {
            for iteration in 0..args.iterations.max(1) {
                let seed = base_seed.wrapping_add(iteration);
                let config = SimulationConfig::new(strategy, seed)
                    .with_outfit(outfit)
                    .with_max_turns(args.max_turns);
                let record = simulate_drive(assets, config)
                    .with_context(|| format!("{} drive on seed {seed}", strategy.key()))?;
                log::info!(
                    "{} seed {seed}: {:?} grade {} after {} turns",
                    strategy.key(),
                    record.ending,
                    record.grade,
                    record.turns
                );
                records.push(record);
            }
        }
    }
    Ok(records)
}

fn write_reports(args: &Args, records: &[DriveRecord], start_time: Instant) -> Result<()> {
    let aggregates = aggregate(records);
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, &aggregates, records)?;
        }
        "markdown" => {
            logic::reports::generate_markdown_report(&mut output_target, &aggregates, records)?;
        }
        _ => {
            logic::reports::generate_console_report(
                &mut output_target,
                &aggregates,
                records,
                args.verbose,
                start_time.elapsed(),
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
