//! Maximal marginal relevance re-ranking.

use super::{cosine_similarity, SearchResult};

/// Select up to `k` candidates balancing relevance to the query against
/// redundancy with already selected candidates.
///
/// Each step picks the candidate maximizing
/// `lambda_mult * sim(query, c) - (1 - lambda_mult) * max(sim(c, selected))`.
/// Results come back in selection order and keep their query similarity as score.
pub fn max_marginal_relevance(
    query_embedding: &[f32],
    candidates: Vec<SearchResult>,
    k: usize,
    lambda_mult: f32,
) -> Vec<SearchResult> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let lambda = lambda_mult.clamp(0.0, 1.0);
    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query_embedding, &c.document.embedding))
        .collect();

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut selected: Vec<usize> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|&s| {
                    cosine_similarity(
                        &candidates[idx].document.embedding,
                        &candidates[s].document.embedding,
                    )
                })
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };

            let score = lambda * relevance[idx] - (1.0 - lambda) * redundancy;
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
        }

        selected.push(remaining.remove(best_pos));
    }

    let mut slots: Vec<Option<SearchResult>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .filter_map(|idx| {
            slots[idx].take().map(|mut result| {
                result.score = relevance[idx];
                result
            })
        })
        .collect()
}
