// src/scoring/structure.rs — Structural modifiers computed from the raw text

use crate::infra::config::ScoringConfig;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Blank-line-separated segments longer than `min_chars`, so stray newlines
/// and whitespace-only runs do not count as paragraphs.
pub fn paragraphs(text: &str, min_chars: usize) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|seg| seg.chars().count() > min_chars)
        .collect()
}

/// Length modifier buckets: full credit inside the target range, a reduced
/// value inside the wider soft band, a low floor everywhere else. Thresholds
/// come from configuration; observed deployments disagree on the literal
/// ranges.
pub fn length_modifier(words: usize, config: &ScoringConfig) -> f32 {
    let [target_min, target_max] = config.target_word_range;
    let [soft_min, soft_max] = config.soft_word_range;

    if (target_min..=target_max).contains(&words) {
        1.0
    } else if (soft_min..=soft_max).contains(&words) {
        config.near_penalty
    } else {
        config.far_penalty
    }
}

/// Exact paragraph count earns 1.0; anything else earns the configured
/// penalty. No partial credit for being close.
pub fn paragraph_modifier(text: &str, config: &ScoringConfig) -> f32 {
    let count = paragraphs(text, config.min_paragraph_chars).len();
    if count == config.required_paragraph_count {
        1.0
    } else {
        config.paragraph_penalty
    }
}
