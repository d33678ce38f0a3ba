use isolang::Language;
use log::warn;
use std::cmp::Ordering;
use std::fmt;

/// Language utilities for ISO language code handling
///
/// This module provides the lenient resolver used on track labels, sidecar
/// filenames and command line arguments, on top of ISO 639-1 (2-letter) and
/// ISO 639-2 (3-letter) codes.
/// Code used for the undefined language in containers and on the command line
pub const UNDEFINED_CODE: &str = "und";

/// Canonical subtitle language
///
/// Regions are folded away: `en`, `eng`, `en-US` and `English` all end up as
/// the same value, so it can be used as a set or map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleLanguage {
    /// A language known to ISO 639
    Known(Language),
    /// Language could not be determined
    Undefined,
}

impl SubtitleLanguage {
    /// ISO 639-3 code, `und` for the undefined language
    pub fn code(&self) -> &'static str {
        match self {
            Self::Known(lang) => lang.to_639_3(),
            Self::Undefined => UNDEFINED_CODE,
        }
    }

    /// English name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Self::Known(lang) => lang.to_name(),
            Self::Undefined => "Undefined",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl Ord for SubtitleLanguage {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => Ordering::Equal,
            (Self::Undefined, Self::Known(_)) => Ordering::Greater,
            (Self::Known(_), Self::Undefined) => Ordering::Less,
            (Self::Known(a), Self::Known(b)) => a.to_639_3().cmp(b.to_639_3()),
        }
    }
}

impl PartialOrd for SubtitleLanguage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SubtitleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        "mao" => Some("mri"),
        "tib" => Some("bod"),
        // Withdrawn from ISO 639-2 but still found in older files
        "scc" => Some("srp"),
        "scr" => Some("hrv"),
        _ => None,
    }
}

/// Look up a bare 2- or 3-letter code, already lowercased
fn language_from_code(code: &str) -> Option<Language> {
    match code.len() {
        2 => Language::from_639_1(code),
        3 => Language::from_639_3(code)
            .or_else(|| part2b_to_part2t(code).and_then(Language::from_639_3)),
        _ => None,
    }
}

/// Look up an English language name, ignoring case
fn language_from_name(name: &str) -> Option<Language> {
    let lowered = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    Language::from_name_lowercase(&lowered)
}

/// Parse a language code, a code with a region subtag, or an English name
///
/// Returns `None` when nothing matches, or when the text explicitly names
/// the undefined language.
pub fn parse_language(raw: &str) -> Option<Language> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() || normalized == UNDEFINED_CODE {
        return None;
    }

    let base = normalized.split(['-', '_']).next().unwrap_or_default();
    if base == UNDEFINED_CODE {
        return None;
    }

    language_from_code(base)
        .or_else(|| language_from_name(&normalized))
        .or_else(|| language_from_name(base))
}

/// Resolve a language code, optionally followed by a region subtag
///
/// Unlike [`resolve`], English names are not tried. Used on the language
/// field of container tracks.
pub fn resolve_code(raw: &str) -> SubtitleLanguage {
    let normalized = raw.trim().to_lowercase();
    let base = normalized.split(['-', '_']).next().unwrap_or_default();

    match language_from_code(base) {
        Some(lang) => SubtitleLanguage::Known(lang),
        None => {
            if !base.is_empty() && base != UNDEFINED_CODE {
                warn!("'{}' is not a valid language code, using undefined", raw.trim());
            }
            SubtitleLanguage::Undefined
        }
    }
}

/// Resolve loosely formatted text into a subtitle language
///
/// Accepts ISO 639-1/639-2 codes (optionally followed by a region joined with
/// `-` or `_`) and English language names, case-insensitively. Anything else
/// becomes [`SubtitleLanguage::Undefined`]; this never fails.
pub fn resolve(raw: &str) -> SubtitleLanguage {
    match parse_language(raw) {
        Some(lang) => SubtitleLanguage::Known(lang),
        None => {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(UNDEFINED_CODE) {
                warn!("'{}' is not a valid language, using undefined", trimmed);
            }
            SubtitleLanguage::Undefined
        }
    }
}
