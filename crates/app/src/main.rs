mod settings;
mod terminal;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use drill_core::model::{DrillMode, DrillState, PatientId, Symbol};
use drill_core::{SeededSource, SymbolSource};
use services::{Clock, DrillHandle, DrillLoopService, InMemoryResultSink};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use crate::terminal::TerminalObserver;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeed { raw: String },
    InvalidPatientId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidPatientId { raw } => write!(f, "invalid --patient value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- sequence     [--seed <n>] [--patient <uuid>] [--config <file>] [--json]");
    eprintln!("  cargo run -p app -- interference [--seed <n>] [--patient <uuid>] [--config <file>] [--json]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  mode sequence, random seed, random patient id, built-in timings");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DRILL_SEED, DRILL_PATIENT_ID, DRILL_CONFIG");
    eprintln!("  DRILL_HIGHLIGHT_MS, DRILL_GAP_MS, DRILL_ROUND_PAUSE_MS,");
    eprintln!("  DRILL_ROUND_CEILING, DRILL_INTERFERENCE_POINTS");
    eprintln!("  RUST_LOG (default: warn)");
}

struct Args {
    mode: DrillMode,
    seed: Option<u64>,
    patient_id: PatientId,
    config: Option<PathBuf>,
    json: bool,
}

impl Args {
    fn parse(mode: DrillMode, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut seed = match std::env::var("DRILL_SEED") {
            Ok(raw) => Some(parse_seed(raw)?),
            Err(_) => None,
        };
        let mut patient_id = match std::env::var("DRILL_PATIENT_ID") {
            Ok(raw) => parse_patient(raw)?,
            Err(_) => PatientId::random(),
        };
        let mut config = std::env::var("DRILL_CONFIG").ok().map(PathBuf::from);
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--seed" => seed = Some(parse_seed(require_value(args, "--seed")?)?),
                "--patient" => patient_id = parse_patient(require_value(args, "--patient")?)?,
                "--config" => config = Some(PathBuf::from(require_value(args, "--config")?)),
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            mode,
            seed,
            patient_id,
            config,
            json,
        })
    }

    fn source(&self, attempt: u64) -> Box<dyn SymbolSource> {
        match self.seed {
            Some(seed) => Box::new(SeededSource::from_seed(seed.wrapping_add(attempt))),
            None => Box::new(SeededSource::from_entropy()),
        }
    }
}

fn parse_seed(raw: String) -> Result<u64, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidSeed { raw })
}

fn parse_patient(raw: String) -> Result<PatientId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidPatientId { raw })
}

type Input = Lines<BufReader<Stdin>>;

/// Drive one drill to termination, reading answers from stdin.
async fn play(drill: &DrillHandle, input: &mut Input) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match drill.state()? {
            DrillState::Presenting => {
                terminal::print_presenting();
                drill.advance_presentation().await?;
            }
            DrillState::AwaitingInput => {
                terminal::print_prompt(&drill.snapshot()?);
                let Some(line) = input.next_line().await? else {
                    drill.abort().await?;
                    continue;
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    drill.abort().await?;
                    continue;
                }
                match Symbol::parse(line) {
                    Ok(symbol) => {
                        drill.submit(symbol).await?;
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
            DrillState::Idle | DrillState::Terminated => return Ok(()),
        }
    }
}

async fn confirm_repeat(input: &mut Input) -> Result<bool, std::io::Error> {
    println!("Repeat protocol? [y/N]");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();

    let mode = match argv.peek().map(String::as_str) {
        None => DrillMode::Sequence,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => DrillMode::Sequence,
        Some(first) => {
            let mode = first.parse::<DrillMode>().map_err(|e| {
                eprintln!("{e}");
                print_usage();
                e
            })?;
            argv.next();
            mode
        }
    };

    let args = Args::parse(mode, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = settings::load(args.config.as_deref())?;

    let sink = InMemoryResultSink::new();
    let service = DrillLoopService::new(
        Clock::system(),
        settings,
        args.patient_id,
        Arc::new(sink.clone()),
    )
    .with_observer(Arc::new(TerminalObserver));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    terminal::print_legend();

    let mut attempt = 0_u64;
    loop {
        let drill = service.start_session(args.mode, args.source(attempt));
        play(&drill, &mut input).await?;

        if let Some(result) = drill.final_result()? {
            terminal::print_result(&result);
        }
        if args.json {
            if let Some(report) = drill.report()? {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }

        attempt += 1;
        if !confirm_repeat(&mut input).await? {
            break;
        }
    }

    if let Some(average) = sink.average_score(args.patient_id)? {
        println!("Average score across {attempt} drill(s): {average}/100");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
