mod live;
mod logic;
mod storage;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use live::client::{ChatClient, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use live::prompt::PromptStyle;
use live::{LiveConfig, LiveSummary, run_live};
use logic::{LogicTester, get_scenario, list_scenarios, resolve_seed_inputs, scenario_names};
use util::split_csv;

const API_KEY_VAR: &str = "ETHEREAL_API_KEY";

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TestMode {
    /// Scripted generator, many seeded runs with invariant checks (fast, offline)
    Logic,
    /// One adventure against a chat-completion endpoint, saved to disk
    Live,
}

#[derive(Debug, Parser)]
#[command(name = "ethereal-tester", version = "0.1.0")]
#[command(about = "Automated QA driver for the Ethereal Ink engine - scripted logic runs and live generator sessions")]
struct Args {
    /// Test mode: logic (scripted) or live (HTTP generator)
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex, or `random`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed (logic mode only)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

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

    // Live-mode options
    /// Chat-completion endpoint (OpenAI-compatible)
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Model name sent with each request
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Language the generator should write in
    #[arg(long, default_value = "English")]
    language: String,

    /// Adventure turns to play after the opening
    #[arg(long, default_value_t = 5)]
    turns: usize,

    /// Character class id
    #[arg(long, default_value = "warrior")]
    class: String,

    /// Companion id
    #[arg(long, default_value = "hound")]
    companion: String,

    /// Starting item ids (comma-separated, at most three)
    #[arg(long, default_value = "lamp,rope")]
    items: String,

    /// Location id for the opening scene
    #[arg(long, default_value = "ruins")]
    location: String,

    /// Directory for save files (defaults to the platform data directory)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Continue the saved adventure instead of starting over
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    match args.mode {
        TestMode::Logic => {
            let scenarios = expand_scenarios(&args.scenarios);
            let results = run_logic_scenarios(&args, &scenarios, &seeds);
            write_reports(&args, &results, start_time)?;
            if results.iter().any(|r| !r.passed) {
                std::process::exit(1);
            }
        }
        TestMode::Live => {
            let summary = run_live_session(&args, seeds[0]).await?;
            write_live_report(&args, &summary, start_time)?;
        }
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🖋️  Ethereal Ink Automated Tester".bright_cyan().bold());
    println!("{}", "=================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for name in scenario_names() {
            if !scenarios.contains(&name) {
                scenarios.push(name);
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(args: &Args, scenarios: &[String], seeds: &[u64]) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(args.verbose);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

async fn run_live_session(args: &Args, seed: u64) -> Result<LiveSummary> {
    println!("{}", "🌐 Running Live Session".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    let client = ChatClient::new(&args.endpoint, &args.model)
        .with_api_key(std::env::var(API_KEY_VAR).ok())
        .with_style(PromptStyle {
            language: args.language.clone(),
        });
    let config = LiveConfig {
        class_id: args.class.clone(),
        companion_id: args.companion.clone(),
        starting_items: split_csv(&args.items),
        location_id: args.location.clone(),
        turns: args.turns,
        seed,
        save_dir: args.save_dir.clone(),
        resume: args.resume,
    };
    run_live(&config, &client)
        .await
        .with_context(|| format!("live session against {}", client.endpoint()))
}

fn write_reports(args: &Args, results: &[logic::ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Ethereal Ink Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    if args.report != "json" {
        let duration = start_time.elapsed();
        writeln!(&mut output_target)?;
        writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

fn write_live_report(args: &Args, summary: &LiveSummary, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    if args.report == "json" {
        serde_json::to_writer_pretty(&mut output_target, summary)?;
        writeln!(&mut output_target)?;
    } else {
        writeln!(&mut output_target, "Turns played: {}", summary.turns_played)?;
        writeln!(&mut output_target, "Successes: {}", summary.successes)?;
        writeln!(&mut output_target, "Generator failures: {}", summary.generator_failures)?;
        writeln!(
            &mut output_target,
            "HP {}/{} | Gold {} | Karma {}",
            summary.hp, summary.max_hp, summary.gold, summary.karma
        )?;
        if !summary.loot.is_empty() {
            writeln!(&mut output_target, "Loot: {}", summary.loot.join(", "))?;
        }
        writeln!(&mut output_target, "Saved to {}", summary.save_file.display())?;
        writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
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
