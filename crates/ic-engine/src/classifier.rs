//! Identifier classification: VIN, chassis code, or free-text query.
//!
//! Pure functions, no I/O.

use thiserror::Error;

use crate::normalize::normalize_query;

/// VIN length per ISO 3779.
pub const VIN_LEN: usize = 17;

/// WMI (3) + VDS (6) + check digit and model year (2).
pub const VIN_PREFIX_LEN: usize = 11;

/// Classified identifier. Each variant holds its canonical form:
/// VINs and chassis codes uppercase, queries normalized lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Vin(String),
    ChassisCode(String),
    Query(String),
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Vin(s) | Self::ChassisCode(s) | Self::Query(s) => s,
        }
    }

    pub fn lookup_type(&self) -> ic_protocol::LookupType {
        match self {
            Self::Vin(_) => ic_protocol::LookupType::Vin,
            Self::ChassisCode(_) => ic_protocol::LookupType::ChassisCode,
            Self::Query(_) => ic_protocol::LookupType::Query,
        }
    }

    /// Key used against the pattern store's `search_pattern` column.
    pub fn pattern_key(&self) -> String {
        self.as_str().to_lowercase()
    }
}

/// Curated chassis codes recognized as their own identifier kind.
const KNOWN_CHASSIS_CODES: &[&str] = &[
    "BNR32", "BCNR33", "BNR34", "ER34", "HCR32", "ECR33", "S13", "S14", "S15", "PS13", "Z32",
    "Z33", "JZA80", "JZA70", "MA70", "JZX90", "JZX100", "JZX110", "AE86", "AE92", "SW20", "ZZW30",
    "FD3S", "FC3S", "NA6CE", "NA8C", "NB8C", "NA1", "NA2", "EK9", "EG6", "DC2", "DC5", "AP1",
    "AP2", "FD2", "GC8", "GDB", "GRB", "CE9A", "CN9A", "CP9A", "CT9A", "CZ4A", "GTO", "Z16A",
];

/// Whether `s` is VIN-shaped: at least 17 characters, alphanumeric, and
/// free of the lookalike letters I, O and Q.
pub fn is_vin_shaped(s: &str) -> bool {
    s.len() >= VIN_LEN && s.chars().all(is_vin_char)
}

/// Valid VIN alphabet: `[A-HJ-NPR-Z0-9]`, case-insensitive.
pub fn is_vin_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c.to_ascii_uppercase(), 'I' | 'O' | 'Q')
}

/// Lexical chassis-code shape: 3–6 alphanumerics, leading letter, at least one digit.
pub fn has_chassis_shape(s: &str) -> bool {
    (3..=6).contains(&s.len())
        && s.chars().all(|c| c.is_ascii_alphanumeric())
        && s.starts_with(|c: char| c.is_ascii_alphabetic())
        && s.chars().any(|c| c.is_ascii_digit())
}

pub fn is_known_chassis_code(s: &str) -> bool {
    let upper = s.to_uppercase();
    KNOWN_CHASSIS_CODES.contains(&upper.as_str())
}

/// Why a string was rejected by [`validate_vin`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VinError {
    #[error("a VIN has 17 characters (11 for a WMI+VDS prefix), got {0}")]
    Length(usize),
    #[error("VIN contains characters outside A-H, J-N, P, R-Z and 0-9: {0}")]
    InvalidChars(String),
}

/// Strict VIN check for the decode path. Accepts a full 17-character VIN or
/// an 11–16 character WMI+VDS prefix; expects trimmed, uppercased input.
pub fn validate_vin(vin: &str) -> Result<(), VinError> {
    let mut bad: Vec<char> = vin.chars().filter(|c| !is_vin_char(*c)).collect();
    if !bad.is_empty() {
        bad.sort_unstable();
        bad.dedup();
        return Err(VinError::InvalidChars(
            bad.iter().map(char::to_string).collect::<Vec<_>>().join(", "),
        ));
    }
    let len = vin.chars().count();
    if !(VIN_PREFIX_LEN..=VIN_LEN).contains(&len) {
        return Err(VinError::Length(len));
    }
    Ok(())
}

/// Classify raw caller input.
pub fn classify(raw: &str) -> Identifier {
    let trimmed = raw.trim();

    if is_vin_shaped(trimmed) {
        return Identifier::Vin(trimmed.to_uppercase());
    }

    if has_chassis_shape(trimmed) && is_known_chassis_code(trimmed) {
        return Identifier::ChassisCode(trimmed.to_uppercase());
    }

    Identifier::Query(normalize_query(trimmed))
}
