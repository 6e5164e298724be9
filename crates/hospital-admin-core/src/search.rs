//! Typo-tolerant patient name search.

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::models::Patient;

/// Minimum similarity for a fuzzy (non-substring) name match.
pub const FUZZY_THRESHOLD: f64 = 0.82;

/// Combined similarity of two names in `[0, 1]`, case-insensitive.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    let jw = jaro_winkler(&a, &b);
    let lev = normalized_levenshtein(&a, &b);
    jw * 0.6 + lev * 0.4
}

/// Best similarity between the query and the full name or any single word of it.
fn best_score(query: &str, name: &str) -> f64 {
    name.split_whitespace()
        .map(|word| name_similarity(query, word))
        .fold(name_similarity(query, name), f64::max)
}

/// Merge exact (substring) hits with fuzzy matches from `candidates`.
///
/// Exact hits keep their order and come first. Fuzzy matches follow,
/// best score first, and the result is cut to `limit`.
pub fn rank_patients(
    query: &str,
    exact: Vec<Patient>,
    candidates: Vec<Patient>,
    limit: usize,
) -> Vec<Patient> {
    let mut fuzzy: Vec<(f64, Patient)> = candidates
        .into_iter()
        .filter(|c| !exact.iter().any(|e| e.id == c.id))
        .map(|c| (best_score(query, &c.name), c))
        .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
        .collect();
    fuzzy.sort_by(|a, b| b.0.total_cmp(&a.0));

    exact
        .into_iter()
        .chain(fuzzy.into_iter().map(|(_, p)| p))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;

    #[test]
    fn test_similarity_tolerates_typos() {
        assert!(name_similarity("Jonathan", "Jonathon") > FUZZY_THRESHOLD);
        assert!(name_similarity("Smith", "smith") > 0.99);
        assert!(name_similarity("Smith", "Okafor") < FUZZY_THRESHOLD);
    }

    #[test]
    fn test_exact_hits_come_first() {
        let exact = vec![Patient::new("Maria Gomez".into(), Gender::Female)];
        let candidates = vec![
            exact[0].clone(),
            Patient::new("Mario Gomes".into(), Gender::Male),
            Patient::new("Peter Lindqvist".into(), Gender::Male),
        ];

        let ranked = rank_patients("Maria Gomez", exact, candidates, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "Maria Gomez");
        assert_eq!(ranked[1].name, "Mario Gomes");
    }

    #[test]
    fn test_word_match_and_limit() {
        let candidates = vec![
            Patient::new("Anna Kowalski".into(), Gender::Female),
            Patient::new("Jan Kowalsky".into(), Gender::Male),
        ];
        let ranked = rank_patients("kowalski", Vec::new(), candidates.clone(), 10);
        assert_eq!(ranked.len(), 2);

        let limited = rank_patients("kowalski", Vec::new(), candidates, 1);
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].name, "Anna Kowalski");
    }
}
