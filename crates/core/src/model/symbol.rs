use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SymbolError {
    #[error("symbol {0} is outside the alphabet 0..=3")]
    OutOfRange(u8),

    #[error("unrecognized symbol: {0:?}")]
    Unrecognized(String),
}

//
// ─── SYMBOL ────────────────────────────────────────────────────────────────────
//

/// One entry of the four-symbol drill alphabet.
///
/// In sequence mode a symbol is a pad the player taps. In interference mode
/// it names a colour, used both for the printed label and for the ink.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Symbol(u8);

impl Symbol {
    pub const ALPHABET_SIZE: u8 = 4;

    pub const ALL: [Symbol; 4] = [Symbol(0), Symbol(1), Symbol(2), Symbol(3)];

    /// Validates a raw symbol value.
    ///
    /// # Errors
    ///
    /// Returns `SymbolError::OutOfRange` if `value` is not in `0..=3`.
    pub fn new(value: u8) -> Result<Self, SymbolError> {
        if value < Self::ALPHABET_SIZE {
            Ok(Self(value))
        } else {
            Err(SymbolError::OutOfRange(value))
        }
    }

    /// Builds a symbol from an index already known to be in range, wrapping otherwise.
    #[must_use]
    pub fn wrapping(index: usize) -> Self {
        // Modulo keeps the value below ALPHABET_SIZE, so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation)]
        Self((index % usize::from(Self::ALPHABET_SIZE)) as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Display name of the colour bound to this symbol.
    #[must_use]
    pub fn color_name(self) -> &'static str {
        match self.0 {
            0 => "blue",
            1 => "indigo",
            2 => "emerald",
            _ => "amber",
        }
    }

    /// RGB triple hosts can use to render the pad or the ink.
    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        match self.0 {
            0 => (37, 99, 235),
            1 => (79, 70, 229),
            2 => (5, 150, 105),
            _ => (217, 119, 6),
        }
    }

    /// Parses either the numeric value or the colour name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `SymbolError::OutOfRange` for numbers above 3 and
    /// `SymbolError::Unrecognized` for anything else.
    pub fn parse(raw: &str) -> Result<Self, SymbolError> {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Self::new(value);
        }
        Self::ALL
            .into_iter()
            .find(|s| s.color_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SymbolError::Unrecognized(trimmed.to_owned()))
    }
}

impl TryFrom<u8> for Symbol {
    type Error = SymbolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_inside_alphabet() {
        for value in 0..4 {
            assert_eq!(Symbol::new(value).unwrap().value(), value);
        }
    }

    #[test]
    fn rejects_values_outside_alphabet() {
        let err = Symbol::new(4).unwrap_err();
        assert_eq!(err, SymbolError::OutOfRange(4));
        assert!(Symbol::try_from(255).is_err());
    }

    #[test]
    fn parses_numbers_and_colour_names() {
        assert_eq!(Symbol::parse(" 2 ").unwrap(), Symbol::ALL[2]);
        assert_eq!(Symbol::parse("Amber").unwrap(), Symbol::ALL[3]);
        assert!(matches!(
            Symbol::parse("crimson"),
            Err(SymbolError::Unrecognized(_))
        ));
        assert_eq!(Symbol::parse("9"), Err(SymbolError::OutOfRange(9)));
    }

    #[test]
    fn wrapping_stays_in_range() {
        assert_eq!(Symbol::wrapping(5), Symbol::ALL[1]);
        assert_eq!(Symbol::wrapping(3), Symbol::ALL[3]);
    }

    #[test]
    fn serde_rejects_out_of_range() {
        let ok: Symbol = serde_json::from_str("3").unwrap();
        assert_eq!(ok, Symbol::ALL[3]);
        assert!(serde_json::from_str::<Symbol>("7").is_err());
    }
}
