use colored::{ColoredString, Colorize};

use drill_core::model::{DrillMode, FinalResult, InterferenceChallenge, Outcome, Symbol};
use services::{CueEvent, CueKind, DrillObserver, DrillSnapshot};

/// Renders presentation cues as coloured pads on stdout.
pub struct TerminalObserver;

impl DrillObserver for TerminalObserver {
    fn on_cue(&self, event: &CueEvent) {
        match event.kind {
            CueKind::Shown => println!("  {} {}", pad(event.symbol), event.symbol),
            CueKind::Hidden => {}
        }
    }
}

fn paint(text: &str, symbol: Symbol) -> ColoredString {
    let (r, g, b) = symbol.rgb();
    text.truecolor(r, g, b)
}

fn pad(symbol: Symbol) -> ColoredString {
    paint("■■■■", symbol).bold()
}

pub fn print_legend() {
    let legend: Vec<String> = Symbol::ALL
        .iter()
        .map(|s| format!("{} {}={}", pad(*s), s, s.color_name()))
        .collect();
    println!("{}", legend.join("   "));
    println!("Answer with the number or colour name; `q` exits the drill.");
}

pub fn print_presenting() {
    println!("{}", "Observing pattern sequence...".dimmed());
}

pub fn print_prompt(snapshot: &DrillSnapshot) {
    match snapshot.mode {
        DrillMode::Sequence => println!(
            "Level {}: replicate symbol {} of {}",
            snapshot.level,
            snapshot.progress.len() + 1,
            snapshot.sequence.len()
        ),
        DrillMode::Interference => {
            if let Some(challenge) = snapshot.challenge {
                println!(
                    "Round {}: name the ink colour  {}",
                    snapshot.level,
                    stimulus(challenge)
                );
            }
        }
    }
}

fn stimulus(challenge: InterferenceChallenge) -> ColoredString {
    paint(&challenge.label.color_name().to_uppercase(), challenge.ink).bold()
}

pub fn print_result(result: &FinalResult) {
    let heading = match result.outcome {
        Outcome::Complete => "Drill complete".green().bold(),
        Outcome::Mismatch => "Drill concluded".red().bold(),
        Outcome::Aborted => "Drill exited".yellow().bold(),
    };
    println!();
    println!("{heading}  score {}/100", result.score);
    println!("{}", result.feedback);
}
