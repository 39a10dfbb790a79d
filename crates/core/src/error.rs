use thiserror::Error;

use crate::model::{SettingsError, SymbolError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
