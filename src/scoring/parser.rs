// src/scoring/parser.rs — Tolerant parsing of judge assessments
//
// Judge output is unreliable free text: wrong line counts, extra prose,
// missing labels. The score therefore comes from counting occurrences of the
// affirmative token, never from strict per-line parsing. Per-line flags are
// recorded best-effort for the reflection trace only.

/// Case-insensitive count of affirmative-token occurrences in the assessment.
/// Unclamped; the scorer clamps to the criteria count.
pub fn count_affirmative(assessment: &str, token: &str) -> usize {
    let haystack = assessment.to_lowercase();
    let needle = token.to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(&needle).count()
}

/// Best-effort per-line flags: one bool per non-empty assessment line, true
/// when the line contains the affirmative token. Length may be shorter or
/// longer than the criteria list when the judge misbehaves; callers must not
/// assume it lines up.
pub fn judged_flags(assessment: &str, token: &str) -> Vec<bool> {
    let needle = token.to_lowercase();
    assessment
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_well_formed() {
        let assessment = "1. Ja\n2. Nein\n3. Ja\n4. Ja";
        assert_eq!(count_affirmative(assessment, "ja"), 3);
    }

    #[test]
    fn test_count_case_insensitive() {
        assert_eq!(count_affirmative("JA, ja, Ja", "ja"), 3);
    }

    #[test]
    fn test_count_tolerates_extra_prose() {
        let assessment =
            "Die Antworten lauten: Ja zur ersten Frage. Zur zweiten leider Nein. Drittens: Ja.";
        assert_eq!(count_affirmative(assessment, "ja"), 2);
    }

    #[test]
    fn test_count_empty_assessment() {
        assert_eq!(count_affirmative("", "ja"), 0);
    }

    #[test]
    fn test_count_empty_token() {
        assert_eq!(count_affirmative("Ja Ja Ja", ""), 0);
    }

    #[test]
    fn test_count_can_exceed_criteria() {
        // Six hits for four criteria; clamping happens in the scorer.
        assert_eq!(count_affirmative("ja ja ja ja ja ja", "ja"), 6);
    }

    #[test]
    fn test_flags_well_formed() {
        let assessment = "1. Ja\n2. Nein\n3. Ja\n4. Ja";
        assert_eq!(judged_flags(assessment, "ja"), vec![true, false, true, true]);
    }

    #[test]
    fn test_flags_wrong_line_count() {
        // Judge answered three questions out of four; flags are just short.
        let assessment = "Ja\nNein\nJa";
        assert_eq!(judged_flags(assessment, "ja").len(), 3);
    }

    #[test]
    fn test_flags_skip_blank_lines() {
        let assessment = "Ja\n\n\nNein\n";
        assert_eq!(judged_flags(assessment, "ja"), vec![true, false]);
    }
}
