use std::fmt;
use std::time::Duration;

use crate::model::{
    DrillMode, DrillSettings, DrillState, FinalResult, InterferenceChallenge, Outcome,
    RoundOutcome, Symbol, SymbolError, normalize_score,
};
use crate::source::SymbolSource;

//
// ─── PLAYBACK ──────────────────────────────────────────────────────────────────
//

/// Ties a playback plan to the presenting phase that produced it.
///
/// Any transition out of that phase invalidates the ticket, so a timer that
/// fires late cannot move the drill forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackTicket(u64);

/// One highlighted symbol within a playback, with offsets from playback start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationCue {
    pub index: usize,
    pub symbol: Symbol,
    pub starts_at: Duration,
    pub ends_at: Duration,
}

/// The full schedule for presenting the current sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playback {
    pub ticket: PlaybackTicket,
    /// Pause before the first cue; zero for the opening round.
    pub lead_in: Duration,
    /// Dark interval after each cue.
    pub gap: Duration,
    pub cues: Vec<PresentationCue>,
}

impl Playback {
    /// Time from playback start until input opens.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.cues
            .last()
            .map_or(self.lead_in, |cue| cue.ends_at + self.gap)
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Presenting { epoch: u64, lead_in: Duration },
    AwaitingInput,
    Terminated(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Board {
    Sequence {
        sequence: Vec<Symbol>,
        progress: Vec<Symbol>,
    },
    Interference {
        challenge: InterferenceChallenge,
        rounds: u32,
    },
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// State machine for a single drill session.
///
/// The engine is synchronous and never sleeps. Hosts (or the services crate)
/// drive the timed parts: they read the current [`Playback`], wait it out,
/// then call [`DrillEngine::finish_presentation`] with its ticket.
pub struct DrillEngine {
    mode: DrillMode,
    settings: DrillSettings,
    source: Box<dyn SymbolSource>,
    phase: Phase,
    board: Board,
    score: u32,
    epoch: u64,
}

impl DrillEngine {
    /// Create a session and advance it to round one.
    ///
    /// Sequence drills open in `Presenting` with a single random symbol.
    /// Interference drills draw their first challenge and open in `AwaitingInput`.
    #[must_use]
    pub fn start_session(
        mode: DrillMode,
        settings: DrillSettings,
        source: impl SymbolSource + 'static,
    ) -> Self {
        let board = match mode {
            DrillMode::Sequence => Board::Sequence {
                sequence: Vec::new(),
                progress: Vec::new(),
            },
            DrillMode::Interference => Board::Interference {
                challenge: InterferenceChallenge::new(Symbol::ALL[0], Symbol::ALL[0]),
                rounds: 0,
            },
        };
        let mut engine = Self {
            mode,
            settings,
            source: Box::new(source),
            phase: Phase::Idle,
            board,
            score: 0,
            epoch: 0,
        };
        engine.open_first_round();
        engine
    }

    fn open_first_round(&mut self) {
        debug_assert_eq!(self.phase, Phase::Idle);
        match &mut self.board {
            Board::Sequence { sequence, .. } => {
                sequence.push(self.source.next_symbol());
                self.epoch += 1;
                self.phase = Phase::Presenting {
                    epoch: self.epoch,
                    lead_in: Duration::ZERO,
                };
            }
            Board::Interference { challenge, .. } => {
                *challenge = draw_challenge(self.source.as_mut());
                self.phase = Phase::AwaitingInput;
            }
        }
    }

    #[must_use]
    pub fn mode(&self) -> DrillMode {
        self.mode
    }

    #[must_use]
    pub fn settings(&self) -> &DrillSettings {
        &self.settings
    }

    #[must_use]
    pub fn state(&self) -> DrillState {
        match self.phase {
            Phase::Idle => DrillState::Idle,
            Phase::Presenting { .. } => DrillState::Presenting,
            Phase::AwaitingInput => DrillState::AwaitingInput,
            Phase::Terminated(_) => DrillState::Terminated,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Terminated(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Raw, mode-specific score. Never decreases.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Completed rounds: replicated sequences, or correct interference answers.
    #[must_use]
    pub fn round_count(&self) -> u32 {
        match &self.board {
            Board::Sequence { .. } => self.score,
            Board::Interference { rounds, .. } => *rounds,
        }
    }

    /// Complexity level shown to the player (1-based).
    #[must_use]
    pub fn level(&self) -> usize {
        match &self.board {
            Board::Sequence { sequence, .. } => sequence.len(),
            Board::Interference { rounds, .. } => {
                usize::try_from(*rounds).unwrap_or(usize::MAX).saturating_add(1)
            }
        }
    }

    /// The sequence to replicate; empty in interference mode.
    #[must_use]
    pub fn sequence(&self) -> &[Symbol] {
        match &self.board {
            Board::Sequence { sequence, .. } => sequence,
            Board::Interference { .. } => &[],
        }
    }

    /// Inputs accepted so far in the current replication attempt.
    #[must_use]
    pub fn progress(&self) -> &[Symbol] {
        match &self.board {
            Board::Sequence { progress, .. } => progress,
            Board::Interference { .. } => &[],
        }
    }

    /// The live interference stimulus, if any.
    #[must_use]
    pub fn challenge(&self) -> Option<InterferenceChallenge> {
        match (&self.board, self.phase) {
            (Board::Interference { challenge, .. }, Phase::AwaitingInput) => Some(*challenge),
            _ => None,
        }
    }

    /// Playback plan for the current presenting phase.
    ///
    /// Returns `None` outside `Presenting`. Calling it repeatedly yields the
    /// same plan until the phase changes.
    #[must_use]
    pub fn presentation(&self) -> Option<Playback> {
        let Phase::Presenting { epoch, lead_in } = self.phase else {
            return None;
        };
        let Board::Sequence { sequence, .. } = &self.board else {
            return None;
        };

        let highlight = self.settings.highlight();
        let gap = self.settings.gap();
        let mut cursor = lead_in;
        let cues = sequence
            .iter()
            .enumerate()
            .map(|(index, symbol)| {
                let starts_at = cursor;
                let ends_at = starts_at + highlight;
                cursor = ends_at + gap;
                PresentationCue {
                    index,
                    symbol: *symbol,
                    starts_at,
                    ends_at,
                }
            })
            .collect();

        Some(Playback {
            ticket: PlaybackTicket(epoch),
            lead_in,
            gap,
            cues,
        })
    }

    /// Close the presenting phase once its playback has run to completion.
    ///
    /// Returns `false` and changes nothing when the ticket is stale, e.g. the
    /// drill was aborted while the playback was still sleeping.
    pub fn finish_presentation(&mut self, ticket: PlaybackTicket) -> bool {
        match self.phase {
            Phase::Presenting { epoch, .. } if epoch == ticket.0 => {}
            _ => return false,
        }
        if let Board::Sequence { progress, .. } = &mut self.board {
            progress.clear();
        }
        self.phase = Phase::AwaitingInput;
        true
    }

    /// Feed one player input to the drill.
    ///
    /// Inputs outside `AwaitingInput` are dropped and reported as `Ignored`.
    pub fn submit_input(&mut self, symbol: Symbol) -> RoundOutcome {
        if self.phase != Phase::AwaitingInput {
            return RoundOutcome::Ignored;
        }

        match &mut self.board {
            Board::Sequence { sequence, progress } => {
                let position = progress.len();
                progress.push(symbol);

                if sequence.get(position) != Some(&symbol) {
                    self.phase = Phase::Terminated(Outcome::Mismatch);
                    return RoundOutcome::Terminated(Outcome::Mismatch);
                }

                if progress.len() < sequence.len() {
                    return RoundOutcome::Progress {
                        matched: progress.len(),
                        remaining: sequence.len() - progress.len(),
                    };
                }

                self.score = self.score.saturating_add(1);
                sequence.push(self.source.next_symbol());
                self.epoch += 1;
                self.phase = Phase::Presenting {
                    epoch: self.epoch,
                    lead_in: self.settings.round_pause(),
                };
                RoundOutcome::RoundComplete { score: self.score }
            }
            Board::Interference { challenge, rounds } => {
                if !challenge.is_answered_by(symbol) {
                    self.phase = Phase::Terminated(Outcome::Mismatch);
                    return RoundOutcome::Terminated(Outcome::Mismatch);
                }

                self.score = self
                    .score
                    .saturating_add(self.settings.interference_points());
                *rounds += 1;

                if *rounds >= self.settings.round_ceiling() {
                    self.phase = Phase::Terminated(Outcome::Complete);
                    return RoundOutcome::Terminated(Outcome::Complete);
                }

                *challenge = draw_challenge(self.source.as_mut());
                RoundOutcome::RoundComplete { score: self.score }
            }
        }
    }

    /// Validate a raw input value before submitting it.
    ///
    /// # Errors
    ///
    /// Returns `SymbolError::OutOfRange` without touching the session when
    /// `raw` is outside the alphabet.
    pub fn submit_raw(&mut self, raw: u8) -> Result<RoundOutcome, SymbolError> {
        let symbol = Symbol::new(raw)?;
        Ok(self.submit_input(symbol))
    }

    /// End the drill immediately with a zero score.
    ///
    /// On an already terminated drill this returns the existing result.
    pub fn abort(&mut self) -> FinalResult {
        if let Phase::Terminated(outcome) = self.phase {
            return self.build_result(outcome);
        }
        self.epoch += 1;
        self.phase = Phase::Terminated(Outcome::Aborted);
        self.build_result(Outcome::Aborted)
    }

    /// Normalized score and feedback; `None` until the drill has terminated.
    #[must_use]
    pub fn final_result(&self) -> Option<FinalResult> {
        self.outcome().map(|outcome| self.build_result(outcome))
    }

    fn build_result(&self, outcome: Outcome) -> FinalResult {
        let score = match outcome {
            Outcome::Aborted => 0,
            Outcome::Mismatch | Outcome::Complete => normalize_score(self.mode, self.score),
        };
        let rounds_completed = self.round_count();
        FinalResult {
            mode: self.mode,
            outcome,
            score,
            rounds_completed,
            feedback: self.feedback(outcome, rounds_completed),
        }
    }

    fn feedback(&self, outcome: Outcome, rounds: u32) -> String {
        let ceiling = self.settings.round_ceiling();
        match (self.mode, outcome) {
            (_, Outcome::Aborted) => "Protocol terminated before completion.".to_owned(),
            // Sequence drills have no ceiling; they end by mismatch or abort only.
            (DrillMode::Sequence, Outcome::Mismatch | Outcome::Complete) => format!(
                "Sequence mismatch at complexity level {}. {rounds} pattern(s) replicated.",
                self.level()
            ),
            (DrillMode::Interference, Outcome::Mismatch) => format!(
                "Ink colour misidentified on round {}. {rounds} of {ceiling} rounds correct.",
                rounds + 1
            ),
            (DrillMode::Interference, Outcome::Complete) => {
                format!("All {ceiling} interference rounds identified correctly.")
            }
        }
    }
}

fn draw_challenge(source: &mut dyn SymbolSource) -> InterferenceChallenge {
    let label = source.next_symbol();
    let ink = source.next_symbol();
    InterferenceChallenge::new(label, ink)
}

impl fmt::Debug for DrillEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillEngine")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("board", &self.board)
            .field("score", &self.score)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ScriptedSource, SeededSource};

    fn sym(v: u8) -> Symbol {
        Symbol::new(v).unwrap()
    }

    fn sequence_engine(script: &[u8]) -> DrillEngine {
        DrillEngine::start_session(
            DrillMode::Sequence,
            DrillSettings::default(),
            ScriptedSource::from_values(script),
        )
    }

    fn interference_engine(script: &[u8]) -> DrillEngine {
        DrillEngine::start_session(
            DrillMode::Interference,
            DrillSettings::default(),
            ScriptedSource::from_values(script),
        )
    }

    fn finish(engine: &mut DrillEngine) {
        let playback = engine.presentation().expect("presenting");
        assert!(engine.finish_presentation(playback.ticket));
    }

    #[test]
    fn sequence_session_opens_presenting_one_symbol() {
        let engine = sequence_engine(&[2]);
        assert_eq!(engine.state(), DrillState::Presenting);
        assert_eq!(engine.sequence(), &[sym(2)]);
        assert_eq!(engine.score(), 0);
        assert!(engine.final_result().is_none());
    }

    #[test]
    fn interference_session_opens_awaiting_input() {
        let engine = interference_engine(&[1, 3]);
        assert_eq!(engine.state(), DrillState::AwaitingInput);
        assert_eq!(engine.challenge(), Some(InterferenceChallenge::new(sym(1), sym(3))));
        assert!(engine.presentation().is_none());
    }

    #[test]
    fn first_playback_has_no_lead_in_and_fixed_timings() {
        let engine = sequence_engine(&[2]);
        let playback = engine.presentation().unwrap();
        assert_eq!(playback.lead_in, Duration::ZERO);
        assert_eq!(playback.cues.len(), 1);
        assert_eq!(playback.cues[0].starts_at, Duration::ZERO);
        assert_eq!(playback.cues[0].ends_at, Duration::from_millis(600));
        assert_eq!(playback.total_duration(), Duration::from_millis(800));
    }

    #[test]
    fn follow_up_playback_starts_after_round_pause() {
        let mut engine = sequence_engine(&[2, 0]);
        finish(&mut engine);
        engine.submit_input(sym(2));

        let playback = engine.presentation().unwrap();
        assert_eq!(playback.lead_in, Duration::from_secs(1));
        let starts: Vec<_> = playback.cues.iter().map(|c| c.starts_at).collect();
        assert_eq!(
            starts,
            vec![Duration::from_millis(1_000), Duration::from_millis(1_800)]
        );
        assert_eq!(playback.total_duration(), Duration::from_millis(2_600));
    }

    #[test]
    fn example_sequence_scenario_scores_ten() {
        let mut engine = sequence_engine(&[2, 0]);
        finish(&mut engine);

        assert_eq!(
            engine.submit_input(sym(2)),
            RoundOutcome::RoundComplete { score: 1 }
        );
        assert_eq!(engine.sequence(), &[sym(2), sym(0)]);
        assert_eq!(engine.state(), DrillState::Presenting);

        finish(&mut engine);
        assert!(engine.progress().is_empty());
        assert_eq!(
            engine.submit_input(sym(2)),
            RoundOutcome::Progress {
                matched: 1,
                remaining: 1
            }
        );
        assert_eq!(
            engine.submit_input(sym(1)),
            RoundOutcome::Terminated(Outcome::Mismatch)
        );

        let result = engine.final_result().unwrap();
        assert_eq!(result.outcome, Outcome::Mismatch);
        assert_eq!(result.score, 10);
        assert_eq!(result.rounds_completed, 1);
        assert!(result.feedback.contains("level 2"));
    }

    #[test]
    fn correct_replication_never_mismatches() {
        let mut engine = DrillEngine::start_session(
            DrillMode::Sequence,
            DrillSettings::default(),
            SeededSource::from_seed(99),
        );

        for round in 1..=15_u32 {
            finish(&mut engine);
            let target = engine.sequence().to_vec();
            for (i, symbol) in target.iter().enumerate() {
                let outcome = engine.submit_input(*symbol);
                assert!(engine.progress().len() <= engine.sequence().len());
                if i + 1 < target.len() {
                    assert!(matches!(outcome, RoundOutcome::Progress { .. }));
                } else {
                    assert_eq!(outcome, RoundOutcome::RoundComplete { score: round });
                }
            }
            assert_eq!(engine.score(), round);
            assert_eq!(engine.sequence().len(), target.len() + 1);
        }
        assert!(engine.outcome().is_none());
    }

    #[test]
    fn wrong_symbol_terminates_without_scoring() {
        let mut engine = sequence_engine(&[3]);
        finish(&mut engine);
        assert_eq!(
            engine.submit_input(sym(0)),
            RoundOutcome::Terminated(Outcome::Mismatch)
        );
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.final_result().unwrap().score, 0);
    }

    #[test]
    fn input_while_presenting_is_ignored() {
        let mut engine = sequence_engine(&[1]);
        let before = format!("{engine:?}");
        assert_eq!(engine.submit_input(sym(1)), RoundOutcome::Ignored);
        assert_eq!(engine.submit_input(sym(0)), RoundOutcome::Ignored);
        assert_eq!(format!("{engine:?}"), before);
        assert_eq!(engine.state(), DrillState::Presenting);
    }

    #[test]
    fn input_after_termination_is_ignored() {
        let mut engine = interference_engine(&[0, 1]);
        engine.submit_input(sym(3));
        assert_eq!(engine.state(), DrillState::Terminated);
        let score = engine.score();

        assert_eq!(engine.submit_input(sym(1)), RoundOutcome::Ignored);
        assert_eq!(engine.score(), score);
        assert_eq!(engine.round_count(), 0);
        assert_eq!(engine.outcome(), Some(Outcome::Mismatch));
    }

    #[test]
    fn out_of_range_raw_input_is_rejected_without_side_effects() {
        let mut engine = interference_engine(&[0, 1]);
        let err = engine.submit_raw(4).unwrap_err();
        assert_eq!(err, SymbolError::OutOfRange(4));
        assert_eq!(engine.state(), DrillState::AwaitingInput);
        assert_eq!(
            engine.submit_raw(1).unwrap(),
            RoundOutcome::RoundComplete { score: 10 }
        );
    }

    #[test]
    fn interference_perfect_run_scores_hundred() {
        let mut engine = DrillEngine::start_session(
            DrillMode::Interference,
            DrillSettings::default(),
            SeededSource::from_seed(3),
        );

        for round in 1..=10_u32 {
            let challenge = engine.challenge().unwrap();
            let outcome = engine.submit_input(challenge.ink);
            if round < 10 {
                assert_eq!(outcome, RoundOutcome::RoundComplete { score: round * 10 });
            } else {
                assert_eq!(outcome, RoundOutcome::Terminated(Outcome::Complete));
            }
        }

        let result = engine.final_result().unwrap();
        assert_eq!(result.outcome, Outcome::Complete);
        assert_eq!(result.score, 100);
        assert_eq!(engine.round_count(), 10);
        assert!(engine.challenge().is_none());
    }

    #[test]
    fn interference_mismatch_on_round_k_keeps_prior_score() {
        for k in 1..10_u32 {
            let mut engine = DrillEngine::start_session(
                DrillMode::Interference,
                DrillSettings::default(),
                SeededSource::from_seed(u64::from(k)),
            );
            for _ in 1..k {
                let ink = engine.challenge().unwrap().ink;
                engine.submit_input(ink);
            }
            let ink = engine.challenge().unwrap().ink;
            let wrong = Symbol::wrapping(usize::from(ink.value()) + 1);
            assert_eq!(
                engine.submit_input(wrong),
                RoundOutcome::Terminated(Outcome::Mismatch)
            );

            let result = engine.final_result().unwrap();
            assert_eq!(u32::from(result.score), 10 * (k - 1));
            assert_eq!(result.rounds_completed, k - 1);
        }
    }

    #[test]
    fn naming_the_label_instead_of_the_ink_fails() {
        let mut engine = interference_engine(&[0, 2]);
        let challenge = engine.challenge().unwrap();
        assert!(!challenge.is_congruent());
        assert_eq!(
            engine.submit_input(challenge.label),
            RoundOutcome::Terminated(Outcome::Mismatch)
        );
    }

    #[test]
    fn abort_zeroes_score_from_any_state() {
        let mut presenting = sequence_engine(&[1, 2]);
        finish(&mut presenting);
        presenting.submit_input(sym(1));
        assert_eq!(presenting.state(), DrillState::Presenting);
        let result = presenting.abort();
        assert_eq!(result.outcome, Outcome::Aborted);
        assert_eq!(result.score, 0);

        let mut awaiting = interference_engine(&[2, 2]);
        awaiting.submit_input(sym(2));
        assert_eq!(awaiting.score(), 10);
        let result = awaiting.abort();
        assert_eq!(result.score, 0);
        assert_eq!(awaiting.state(), DrillState::Terminated);
    }

    #[test]
    fn abort_mid_replication_discards_progress_and_score() {
        let mut engine = sequence_engine(&[1, 2, 0]);
        finish(&mut engine);
        engine.submit_input(sym(1));
        finish(&mut engine);
        assert_eq!(
            engine.submit_input(sym(1)),
            RoundOutcome::Progress {
                matched: 1,
                remaining: 1
            }
        );
        assert_eq!(engine.state(), DrillState::AwaitingInput);
        assert_eq!(engine.score(), 1);

        let result = engine.abort();
        assert_eq!(result.outcome, Outcome::Aborted);
        assert_eq!(result.score, 0);
        assert_eq!(result.rounds_completed, 1);
        assert_eq!(engine.state(), DrillState::Terminated);
        assert_eq!(engine.submit_input(sym(2)), RoundOutcome::Ignored);
        assert!(engine.presentation().is_none());
    }

    #[test]
    fn abort_after_termination_keeps_original_outcome() {
        let mut engine = interference_engine(&[0, 0]);
        engine.submit_input(sym(1));
        let result = engine.abort();
        assert_eq!(result.outcome, Outcome::Mismatch);
    }

    #[test]
    fn stale_ticket_cannot_resurrect_aborted_session() {
        let mut engine = sequence_engine(&[0]);
        let playback = engine.presentation().unwrap();
        engine.abort();

        assert!(!engine.finish_presentation(playback.ticket));
        assert_eq!(engine.state(), DrillState::Terminated);
        assert_eq!(engine.outcome(), Some(Outcome::Aborted));
    }

    #[test]
    fn ticket_from_previous_round_is_stale() {
        let mut engine = sequence_engine(&[0, 1]);
        let first = engine.presentation().unwrap();
        assert!(engine.finish_presentation(first.ticket));
        engine.submit_input(sym(0));

        assert!(!engine.finish_presentation(first.ticket));
        assert_eq!(engine.state(), DrillState::Presenting);
        let second = engine.presentation().unwrap();
        assert_ne!(first.ticket, second.ticket);
    }

    #[test]
    fn custom_round_ceiling_is_honoured() {
        let settings = crate::model::DrillSettingsDraft {
            round_ceiling: Some(3),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let mut engine = DrillEngine::start_session(
            DrillMode::Interference,
            settings,
            ScriptedSource::from_values(&[1, 1]),
        );
        engine.submit_input(sym(1));
        engine.submit_input(sym(1));
        assert_eq!(
            engine.submit_input(sym(1)),
            RoundOutcome::Terminated(Outcome::Complete)
        );
        let result = engine.final_result().unwrap();
        assert_eq!(result.score, 30);
        assert!(result.feedback.contains("All 3"));
    }
}
