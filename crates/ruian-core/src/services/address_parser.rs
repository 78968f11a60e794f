//! Free-text address parsing
//!
//! Turns what the user typed into comma segments (for incremental search) or
//! into a validation query (for full-address checks). Never touches session
//! state; what the session already knows is passed in as `ParseHints`.

use crate::clients::AddressQuery;
use crate::constants::FULL_ADDRESS_MIN_CHARS;
use once_cell::sync::Lazy;
use regex::Regex;

/// `<street> <number>[,] <ddd dd> <city>`
static POSTAL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<street>[^,]+?)\s+(?P<number>\d+(?:/\d+)?[a-zA-Z]?)\s*,?\s*(?P<zip>\d{3}\s\d{2})\s+(?P<city>.+?)\s*$",
    )
    .expect("Failed to compile postal format regex")
});

static ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}\s?\d{2}\b").expect("Failed to compile ZIP regex"));

/// Trailing house number of a comma part, with whatever precedes it
static TRAILING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>.*?)\s*(?P<number>\d+(?:\s*/\s*\d+)?[a-zA-Z]?)$")
        .expect("Failed to compile house number regex")
});

/// Comma segments of the text field; the last one is being typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedInput {
    segments: Vec<String>,
}

impl SegmentedInput {
    pub fn parse(input: &str) -> Self {
        Self {
            segments: input.split(',').map(|s| s.trim().to_string()).collect(),
        }
    }

    /// 0 = municipality, 1 = street, 2+ = house number
    pub fn index(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    pub fn current(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn first(&self) -> &str {
        self.get(0).unwrap_or("")
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.is_empty())
    }
}

/// What the session already knows, borrowed for one parse
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseHints<'a> {
    pub municipality_name: Option<&'a str>,
    pub street_name: Option<&'a str>,
    pub zip: Option<&'a str>,
}

/// Long enough and containing a digit: worth validating as a whole
pub fn looks_like_full_address(input: &str) -> bool {
    input.trim().chars().count() > FULL_ADDRESS_MIN_CHARS && input.chars().any(|c| c.is_ascii_digit())
}

/// Whether the text starts like a house number rather than a name
pub fn is_numeric_leading(text: &str) -> bool {
    text.trim_start().starts_with(|c: char| c.is_ascii_digit())
}

/// Split `cp/co`; the descriptive part keeps digits only
pub fn split_house_number(text: &str) -> (Option<String>, Option<String>) {
    let mut parts = text.splitn(2, '/');

    let cp: String = parts
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let co = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    ((!cp.is_empty()).then_some(cp), co)
}

fn zip_digits(zip: &str) -> String {
    zip.chars().filter(|c| !c.is_whitespace()).collect()
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Build the registry validation query for a fully typed or pasted address
pub fn validation_query(input: &str, hints: &ParseHints<'_>) -> AddressQuery {
    if let Some(query) = parse_postal_format(input) {
        log::debug!("Input matched the postal format");
        return query;
    }
    parse_general(input, hints)
}

fn parse_postal_format(input: &str) -> Option<AddressQuery> {
    let caps = POSTAL_FORMAT.captures(input)?;
    let (cp, co) = split_house_number(&caps["number"]);

    Some(AddressQuery {
        municipality_name: Some(caps["city"].trim().to_string()),
        street: Some(caps["street"].trim().to_string()),
        zip: Some(zip_digits(&caps["zip"])),
        cp,
        co,
    })
}

fn parse_general(input: &str, hints: &ParseHints<'_>) -> AddressQuery {
    let mut working = input.to_string();

    // ZIP anywhere in the text, else whatever the session remembered
    let zip = match ZIP.find(input) {
        Some(m) => {
            working.replace_range(m.range(), "");
            Some(zip_digits(m.as_str()))
        }
        None => hints.zip.map(zip_digits),
    };

    let mut parts: Vec<String> = working
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let mut number = None;
    let mut street = None;
    if let Some(pos) = parts.iter().rposition(|p| TRAILING_NUMBER.is_match(p)) {
        let part = parts.remove(pos);
        if let Some(caps) = TRAILING_NUMBER.captures(&part) {
            let prefix = caps["prefix"].trim().trim_end_matches(',').trim();
            // "ev. 7" is a registration number, not a street called "ev."
            if prefix.chars().count() > 2 && !prefix.eq_ignore_ascii_case("ev.") {
                street = Some(prefix.to_string());
            }
            number = Some(caps["number"].replace(' ', ""));
        }
    }
    let street_from_number = street.is_some();

    // Parts repeating what the session already knows claim nothing new
    parts.retain(|p| {
        !hints.municipality_name.is_some_and(|m| same_name(m, p))
            && !hints.street_name.is_some_and(|s| same_name(s, p))
    });

    let street_known = street.is_some() || hints.street_name.is_some();
    let municipality_known = hints.municipality_name.is_some();
    let mut municipality = None;

    match parts.as_slice() {
        [] => {}
        [only] => {
            if !municipality_known {
                municipality = Some(only.clone());
            } else if !street_known {
                street = Some(only.clone());
            }
        }
        [first, .., last] => {
            if !municipality_known && !street_known {
                street = Some(first.clone());
                municipality = Some(last.clone());
            } else if !municipality_known {
                municipality = Some(last.clone());
            } else if !street_known {
                street = Some(last.clone());
            }
        }
    }

    // "Lhota 12": a village without streets names itself before the number
    if municipality.is_none() && !municipality_known && street_from_number && parts.is_empty() {
        municipality = street.take();
    }

    let (cp, co) = number
        .as_deref()
        .map(split_house_number)
        .unwrap_or((None, None));

    AddressQuery {
        municipality_name: municipality.or_else(|| hints.municipality_name.map(str::to_string)),
        street: street.or_else(|| hints.street_name.map(str::to_string)),
        zip,
        cp,
        co,
    }
}
