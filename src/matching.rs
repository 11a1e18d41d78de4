//! Scored title matching for picking among same-title candidates.
//!
//! Batch lookups often get several plausible hits back for one query
//! string; instead of blindly trusting "the first array element is the
//! best match", this module scores candidates explicitly so the choice
//! is deterministic and testable. An exact title or synonym match scores
//! highest; otherwise the provider's own relevance ordering is trusted
//! via a positional tiebreak.

use crate::types::MediaItem;

/// Scores how well an item's titles match a query.
///
/// Exact title/original-title match (case-insensitive) scores highest,
/// then containment, then word overlap.
pub fn match_score(item: &MediaItem, query: &str) -> u32 {
    let query = query.trim().to_lowercase();
    let mut best = 0u32;

    let mut candidates = vec![item.title.as_str()];
    if let Some(original) = item.original_title.as_deref() {
        candidates.push(original);
    }

    for title in candidates {
        let title = title.to_lowercase();
        let score = if title == query {
            100
        } else if title.contains(&query) || query.contains(title.as_str()) {
            50
        } else {
            word_overlap_score(&title, &query)
        };
        best = best.max(score);
    }

    best
}

fn word_overlap_score(title: &str, query: &str) -> u32 {
    let query_words: Vec<&str> = query.split_whitespace().collect();
    if query_words.is_empty() {
        return 0;
    }

    let title_words: Vec<&str> = title.split_whitespace().collect();
    let mut matches = 0u32;
    for query_word in &query_words {
        if title_words
            .iter()
            .any(|w| w.contains(query_word) || query_word.contains(w))
        {
            matches += 1;
        }
    }

    (matches * 25) / query_words.len() as u32
}

/// Picks the best-matching item for a query.
///
/// Ties fall back to the provider's own ordering: among equal scores the
/// earlier item wins, so a provider that already sorts by relevance keeps
/// its say.
pub fn best_match<'a>(items: &'a [MediaItem], query: &str) -> Option<&'a MediaItem> {
    items
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            match_score(a, query)
                .cmp(&match_score(b, query))
                // max_by keeps the later element on ties; prefer the earlier
                .then(ib.cmp(ia))
        })
        .map(|(_, item)| item)
}
