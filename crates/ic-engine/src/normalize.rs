//! Text normalization: queries, makes, countries, year hints, WMI codes.

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize_query(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The normalized query with its word order reversed.
pub fn reversed_words(normalized: &str) -> String {
    normalized.split(' ').rev().collect::<Vec<_>>().join(" ")
}

/// Tokens worth matching on (two characters or longer).
pub fn tokens(normalized: &str) -> Vec<String> {
    normalized
        .split(|c: char| c.is_whitespace() || c == ',' || c == '/')
        .filter(|t| t.len() >= 2)
        .map(String::from)
        .collect()
}

const MAKES: &[&str] = &[
    "Toyota",
    "Honda",
    "Nissan",
    "Subaru",
    "Mitsubishi",
    "Mazda",
    "Lexus",
    "Acura",
    "Infiniti",
    "Suzuki",
    "Daihatsu",
    "BMW",
    "Mercedes-Benz",
    "Audi",
    "Volkswagen",
    "Porsche",
    "Volvo",
    "Ford",
    "Chevrolet",
    "Dodge",
    "Jeep",
    "Land Rover",
    "Ferrari",
    "Lamborghini",
];

const MAKE_ALIASES: &[(&str, &str)] = &[
    ("chevy", "Chevrolet"),
    ("vw", "Volkswagen"),
    ("mercedes", "Mercedes-Benz"),
    ("merc", "Mercedes-Benz"),
    ("benz", "Mercedes-Benz"),
    ("landrover", "Land Rover"),
    ("mitsu", "Mitsubishi"),
];

/// Canonical make spelling, e.g. "chevy" → "Chevrolet", "NISSAN" → "Nissan".
/// Unknown makes are returned trimmed with their original casing.
pub fn canonical_make(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if let Some(make) = MAKES.iter().find(|m| m.to_lowercase() == lower) {
        return (*make).to_string();
    }
    if let Some((_, make)) = MAKE_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return (*make).to_string();
    }
    trimmed.to_string()
}

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("usa", "united states"),
    ("us", "united states"),
    ("u.s.", "united states"),
    ("america", "united states"),
    ("united states of america", "united states"),
    ("uk", "united kingdom"),
    ("u.k.", "united kingdom"),
    ("britain", "united kingdom"),
    ("great britain", "united kingdom"),
    ("england", "united kingdom"),
    ("nz", "new zealand"),
    ("aus", "australia"),
    ("jp", "japan"),
    ("jpn", "japan"),
];

/// Lowercased country key with common aliases folded.
pub fn canonical_country(raw: &str) -> String {
    let key = normalize_query(raw);
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, country)| (*country).to_string())
        .unwrap_or(key)
}

/// Pull a model year out of free text ("r34 gtr 99", "supra 1997").
///
/// Two-digit years `>= 50` map to 19xx, the rest to 20xx.
pub fn year_hint(normalized: &str) -> Option<i32> {
    normalized.split(' ').find_map(|word| {
        let word = word.trim_start_matches('\'');
        if !word.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match word.len() {
            2 => {
                let yy: i32 = word.parse().ok()?;
                Some(if yy >= 50 { 1900 + yy } else { 2000 + yy })
            }
            4 => {
                let yyyy: i32 = word.parse().ok()?;
                (1950..=2100).contains(&yyyy).then_some(yyyy)
            }
            _ => None,
        }
    })
}

const WMI_TABLE: &[(&str, &str)] = &[
    ("JN1", "Nissan"),
    ("JN8", "Nissan"),
    ("JT2", "Toyota"),
    ("JTD", "Toyota"),
    ("JTE", "Toyota"),
    ("JTN", "Toyota"),
    ("JHM", "Honda"),
    ("JH4", "Acura"),
    ("JM1", "Mazda"),
    ("JF1", "Subaru"),
    ("JF2", "Subaru"),
    ("JA3", "Mitsubishi"),
    ("JA4", "Mitsubishi"),
    ("JS3", "Suzuki"),
    ("WBA", "BMW"),
    ("WDB", "Mercedes-Benz"),
    ("WDD", "Mercedes-Benz"),
    ("WVW", "Volkswagen"),
    ("WP0", "Porsche"),
    ("WAU", "Audi"),
    ("1G1", "Chevrolet"),
    ("1FA", "Ford"),
    ("1FT", "Ford"),
    ("2T1", "Toyota"),
];

/// Manufacturer implied by a VIN's first three characters.
pub fn wmi_manufacturer(vin: &str) -> Option<&'static str> {
    let wmi = vin.get(..3)?.to_uppercase();
    WMI_TABLE
        .iter()
        .find(|(code, _)| *code == wmi)
        .map(|(_, make)| *make)
}
