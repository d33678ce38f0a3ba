/*!
 * Conversion planning.
 *
 * Decides which subtitles still have to be embedded in a container and
 * which remux strategy embeds them.
 */

use log::debug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::language_utils::SubtitleLanguage;

/// Sidecar subtitles whose language is not embedded yet, in discovery order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddableSubtitles {
    by_language: BTreeMap<SubtitleLanguage, Vec<PathBuf>>,
}

impl EmbeddableSubtitles {
    /// Keep every available subtitle whose language is not in `embedded`
    pub fn compute<'a, I>(available: I, embedded: &BTreeSet<SubtitleLanguage>) -> Self
    where
        I: IntoIterator<Item = (&'a PathBuf, &'a SubtitleLanguage)>,
    {
        let mut by_language: BTreeMap<SubtitleLanguage, Vec<PathBuf>> = BTreeMap::new();
        for (path, language) in available {
            if !embedded.contains(language) {
                by_language.entry(*language).or_default().push(path.clone());
            }
        }
        Self { by_language }
    }

    /// Number of distinct languages
    pub fn len(&self) -> usize {
        self.by_language.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }

    pub fn contains(&self, language: &SubtitleLanguage) -> bool {
        self.by_language.contains_key(language)
    }

    /// First discovered candidate of a language
    pub fn first(&self, language: &SubtitleLanguage) -> Option<&PathBuf> {
        self.by_language.get(language).and_then(|paths| paths.first())
    }

    /// All candidates of a language
    pub fn candidates(&self, language: &SubtitleLanguage) -> &[PathBuf] {
        self.by_language.get(language).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn languages(&self) -> impl Iterator<Item = &SubtitleLanguage> {
        self.by_language.keys()
    }

    /// First candidate of every language
    pub fn firsts(&self) -> Vec<(SubtitleLanguage, PathBuf)> {
        self.by_language
            .iter()
            .filter_map(|(lang, paths)| paths.first().map(|p| (*lang, p.clone())))
            .collect()
    }
}

/// Caller policy for strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanPolicy {
    /// Embed a single language
    pub single: bool,
    /// Always use the multi-stream remux
    pub force_multi: bool,
}

/// How the missing subtitles get embedded
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// One subtitle, embedded with ffmpeg
    SingleStream {
        language: SubtitleLanguage,
        subtitle: PathBuf,
    },
    /// Several subtitles in one mkvmerge run
    MultiStream {
        subtitles: Vec<(SubtitleLanguage, PathBuf)>,
    },
    /// Nothing to embed
    NoOp,
}

impl Strategy {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleStream { language, .. } => write!(f, "single-stream ({})", language),
            Self::MultiStream { subtitles } => {
                let codes: Vec<&str> = subtitles.iter().map(|(l, _)| l.code()).collect();
                write!(f, "multi-stream ({})", codes.join(", "))
            }
            Self::NoOp => write!(f, "no-op"),
        }
    }
}

/// Result of planning one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    pub strategy: Strategy,
    pub embeddable: EmbeddableSubtitles,
}

/// Check whether the container already holds every target language
pub fn is_satisfied(targets: &BTreeSet<SubtitleLanguage>, embedded: &BTreeSet<SubtitleLanguage>) -> bool {
    targets.is_subset(embedded)
}

/// Plan the embedding of the missing subtitles
///
/// Any remux strategy needs at least one embeddable subtitle. Multi-stream
/// wins when forced or when two or more languages are missing outside
/// single mode; single-stream is used in single mode or when exactly one
/// language is missing.
pub fn plan(
    targets: &BTreeSet<SubtitleLanguage>,
    embedded: &BTreeSet<SubtitleLanguage>,
    available: &BTreeMap<PathBuf, SubtitleLanguage>,
    policy: PlanPolicy,
) -> ConversionPlan {
    let embeddable = EmbeddableSubtitles::compute(available, embedded);
    debug!("Subtitles to be embedded: {:?}", embeddable);

    let strategy = if embeddable.is_empty() {
        Strategy::NoOp
    } else if policy.force_multi || (!policy.single && embeddable.len() >= 2) {
        Strategy::MultiStream {
            subtitles: embeddable.firsts(),
        }
    } else if policy.single || embeddable.len() == 1 {
        select_single(targets, embedded, &embeddable)
    } else {
        Strategy::NoOp
    };

    ConversionPlan { strategy, embeddable }
}

// A missing target language wins; otherwise the sole embeddable language
fn select_single(
    targets: &BTreeSet<SubtitleLanguage>,
    embedded: &BTreeSet<SubtitleLanguage>,
    embeddable: &EmbeddableSubtitles,
) -> Strategy {
    let missing_target = targets
        .iter()
        .filter(|lang| !embedded.contains(*lang))
        .find(|lang| embeddable.contains(*lang));

    let language = match missing_target {
        Some(lang) => *lang,
        None if embeddable.len() == 1 => match embeddable.languages().next() {
            Some(lang) => *lang,
            None => return Strategy::NoOp,
        },
        None => {
            debug!("No subtitle found for the requested languages");
            return Strategy::NoOp;
        }
    };

    match embeddable.first(&language) {
        Some(subtitle) => Strategy::SingleStream {
            language,
            subtitle: subtitle.clone(),
        },
        None => Strategy::NoOp,
    }
}
