//! Score ranking helpers.
//!
//! All orderings are stable: equal scores keep the lower index first.

use std::cmp::Ordering;
use std::collections::HashMap;

use lessonmap_core::MatchCandidate;

fn by_score_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal)
}

/// Index and score of the best entry, lowest index on ties
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((idx, score)),
        })
}

/// The `k` best entries scoring at least `threshold`, best first
pub fn top_k(scores: &[f32], k: usize, threshold: f32) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| *score >= threshold)
        .collect();
    ranked.sort_by(by_score_desc);
    ranked.truncate(k);
    ranked
}

/// Collapse candidates with the same term.
///
/// The surviving entry takes the highest score and that entry's origin;
/// terms keep the position where they were first seen.
pub fn dedupe(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut out: Vec<MatchCandidate> = Vec::with_capacity(candidates.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        match seen.get(&candidate.term) {
            Some(&idx) => {
                if candidate.score > out[idx].score {
                    out[idx].score = candidate.score;
                    out[idx].origin = candidate.origin;
                }
            }
            None => {
                seen.insert(candidate.term.clone(), out.len());
                out.push(candidate);
            }
        }
    }
    out
}
