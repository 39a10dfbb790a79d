mod challenge;
mod ids;
mod mode;
mod outcome;
mod record;
mod settings;
mod symbol;

pub use challenge::InterferenceChallenge;
pub use ids::{DrillId, ParseIdError, PatientId};
pub use mode::{DrillMode, ParseModeError, TherapyType};
pub use outcome::{DrillState, FinalResult, Outcome, RoundOutcome, normalize_score};
pub use record::SessionResult;
pub use settings::{DrillSettings, DrillSettingsDraft, SettingsError};
pub use symbol::{Symbol, SymbolError};
