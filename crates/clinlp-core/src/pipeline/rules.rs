use std::fs;
use std::path::Path;

use regex::Regex;

use crate::entity::{EntityCategory, EntitySpan};
use crate::error::Result;
use crate::pipeline::{EntityRecognizer, resolve_overlaps};

/// Places recognized as GPE when no gazetteer file is supplied.
const DEFAULT_PLACES: &[&str] = &[
    "Amsterdam",
    "Rotterdam",
    "Den Haag",
    "'s-Gravenhage",
    "Utrecht",
    "Eindhoven",
    "Groningen",
    "Tilburg",
    "Almere",
    "Breda",
    "Nijmegen",
    "Apeldoorn",
    "Haarlem",
    "Arnhem",
    "Enschede",
    "Amersfoort",
    "Zaandam",
    "Zwolle",
    "Leiden",
    "Maastricht",
    "Dordrecht",
    "Delft",
    "Alkmaar",
    "Leeuwarden",
    "Hilversum",
    "Nederland",
    "België",
    "Duitsland",
    "Frankrijk",
    "Engeland",
    "Spanje",
    "Turkije",
    "Marokko",
    "Suriname",
    "Indonesië",
    "Polen",
];

const MONTHS: &str = "januari|februari|maart|april|mei|juni|juli|augustus|september|oktober|november|december|january|february|march|may|june|july|august|october|jan|feb|mrt|mar|apr|jun|jul|aug|sep|sept|okt|oct|nov|dec";

/// Configuration for the rule-based recognizer.
#[derive(Debug, Clone)]
pub struct RuleRecognizerConfig {
    /// Place names tagged as GPE.
    pub places: Vec<String>,
    /// Person names tagged as PERSON wherever they occur.
    pub names: Vec<String>,
}

impl Default for RuleRecognizerConfig {
    fn default() -> Self {
        Self {
            places: DEFAULT_PLACES.iter().map(|p| p.to_string()).collect(),
            names: Vec::new(),
        }
    }
}

impl RuleRecognizerConfig {
    /// Create a configuration with the default place gazetteer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add place names to the gazetteer.
    pub fn with_places<I, S>(mut self, places: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.places.extend(places.into_iter().map(Into::into));
        self
    }

    /// Add person names to the gazetteer.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add place names read from a newline-separated file.
    pub fn with_places_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let places = read_gazetteer(path.as_ref())?;
        Ok(self.with_places(places))
    }

    /// Add person names read from a newline-separated file.
    pub fn with_names_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let names = read_gazetteer(path.as_ref())?;
        Ok(self.with_names(names))
    }
}

fn read_gazetteer(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    let entries: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    tracing::debug!("Loaded {} gazetteer entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Build a `\b(?:a|b|c)\b` alternation, longest entries first.
fn gazetteer_regex(entries: &[String]) -> Result<Option<Regex>> {
    let mut entries: Vec<&str> = entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if entries.is_empty() {
        return Ok(None);
    }
    entries.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    entries.dedup();

    let alternation = entries
        .iter()
        .map(|e| bounded(e))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&format!("(?:{alternation})"))?))
}

/// Escape `entry` and anchor it so it never matches inside a longer word.
///
/// An edge that is a non-word character (`'s-Gravenhage`) takes `\B`, which
/// still requires the neighbour to be a non-word character or the text edge.
fn bounded(entry: &str) -> String {
    fn guard(c: Option<char>) -> &'static str {
        match c {
            Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
            _ => r"\B",
        }
    }
    format!(
        "{}{}{}",
        guard(entry.chars().next()),
        regex::escape(entry),
        guard(entry.chars().next_back())
    )
}

/// Entity recognizer built from regex patterns and gazetteers.
///
/// This is the zero-ML engine: dates by pattern, persons by honorific or name
/// list, places by gazetteer. Overlapping matches resolve leftmost-longest.
pub struct RuleRecognizer {
    re_iso_date: Regex,
    re_numeric_date: Regex,
    re_textual_date: Regex,
    re_weekday: Regex,
    re_honorific: Regex,
    re_names: Option<Regex>,
    re_places: Option<Regex>,
}

impl RuleRecognizer {
    /// Construct a recognizer with the default gazetteer.
    ///
    /// # Errors
    ///
    /// Returns `ClinlpError::RegexError` if any pattern fails to compile.
    pub fn new() -> Result<Self> {
        Self::with_config(&RuleRecognizerConfig::default())
    }

    /// Construct a recognizer from the given configuration.
    pub fn with_config(config: &RuleRecognizerConfig) -> Result<Self> {
        Ok(Self {
            re_iso_date: Regex::new(r"\b\d{4}-\d{1,2}-\d{1,2}\b")?,
            re_numeric_date: Regex::new(r"\b\d{1,2}[-/.]\d{1,2}[-/.](?:\d{4}|\d{2})\b")?,
            re_textual_date: Regex::new(&format!(
                r"(?i)\b\d{{1,2}}\s+(?:{MONTHS})\b\.?(?:\s+\d{{4}}\b)?"
            ))?,
            re_weekday: Regex::new(
                r"(?i)\b(?:maandag|dinsdag|woensdag|donderdag|vrijdag|zaterdag|zondag)\b",
            )?,
            re_honorific: Regex::new(
                r"\b(?:[Dd]r|[Dd]rs|[Dd]hr|[Mm]w|[Mm]evr|[Pp]rof|[Ii]r|[Mm]r)\.?\s+((?:\p{Lu}\.\s*)*(?:(?:van|de|der|den|ten|ter|te|het)\s+)*\p{Lu}[\p{Ll}'-]+(?:\s+(?:(?:van|de|der|den|ten|ter|te|het)\s+)*\p{Lu}[\p{Ll}'-]+)*)",
            )?,
            re_names: gazetteer_regex(&config.names)?,
            re_places: gazetteer_regex(&config.places)?,
        })
    }

    fn collect_dates(&self, text: &str, spans: &mut Vec<EntitySpan>) {
        for re in [
            &self.re_iso_date,
            &self.re_numeric_date,
            &self.re_textual_date,
            &self.re_weekday,
        ] {
            spans.extend(
                re.find_iter(text)
                    .map(|m| EntitySpan::new(m.start(), m.end(), EntityCategory::Date)),
            );
        }
    }

    fn collect_persons(&self, text: &str, spans: &mut Vec<EntitySpan>) {
        for caps in self.re_honorific.captures_iter(text) {
            if let Some(name) = caps.get(1) {
                let trimmed = name.as_str().trim_end();
                spans.push(EntitySpan::new(
                    name.start(),
                    name.start() + trimmed.len(),
                    EntityCategory::Person,
                ));
            }
        }
        if let Some(re) = &self.re_names {
            spans.extend(
                re.find_iter(text)
                    .map(|m| EntitySpan::new(m.start(), m.end(), EntityCategory::Person)),
            );
        }
    }

    fn collect_places(&self, text: &str, spans: &mut Vec<EntitySpan>) {
        if let Some(re) = &self.re_places {
            spans.extend(
                re.find_iter(text)
                    .map(|m| EntitySpan::new(m.start(), m.end(), EntityCategory::Gpe)),
            );
        }
    }
}

impl EntityRecognizer for RuleRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let mut spans = Vec::new();

        // Dates first so a date that looks like a name never wins on ties
        self.collect_dates(text, &mut spans);
        self.collect_persons(text, &mut spans);
        self.collect_places(text, &mut spans);

        Ok(resolve_overlaps(spans))
    }
}
