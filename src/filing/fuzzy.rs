/*!
 * Fuzzy matching for directory names.
 *
 * Provides Levenshtein distance-based fuzzy matching so that small title
 * variations ("The Office", "The office (US)") land in the same directory.
 */

/// Fuzzy matcher using Levenshtein distance
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    /// Threshold for fuzzy matching (0.0-1.0, higher = stricter)
    threshold: f32,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

impl FuzzyMatcher {
    /// Create a new fuzzy matcher with custom threshold
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Calculate similarity between two strings (0.0-1.0)
    ///
    /// Uses normalized Levenshtein distance, ignoring case.
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let a_lower = a.to_lowercase();
        let b_lower = b.to_lowercase();

        let distance = levenshtein_distance(&a_lower, &b_lower);
        let max_len = a_lower.chars().count().max(b_lower.chars().count());

        1.0 - (distance as f32 / max_len as f32)
    }

    /// Find the closest candidate at or above the threshold
    ///
    /// Ties keep the earliest candidate.
    pub fn find_best_match<'a, S: AsRef<str>>(&self, text: &str, candidates: &'a [S]) -> Option<&'a str> {
        let mut best_match: Option<(&str, f32)> = None;

        for candidate in candidates {
            let candidate = candidate.as_ref();
            let sim = self.similarity(text, candidate);
            if sim < self.threshold {
                continue;
            }
            match best_match {
                Some((_, best_sim)) if sim <= best_sim => {}
                _ => best_match = Some((candidate, sim)),
            }
        }

        best_match.map(|(candidate, _)| candidate)
    }
}

/// Calculate Levenshtein distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    // Two-row optimization
    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr_row[0] = i;

        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };

            curr_row[j] = (prev_row[j] + 1) // deletion
                .min(curr_row[j - 1] + 1) // insertion
                .min(prev_row[j - 1] + cost); // substitution
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}
