use crate::models::{RankedItem, RankedItemView};

/// Score returned when an item cannot be located among its peers
const FALLBACK_SCORE: f64 = 1.0;

/// Maps an item's rank to a 1.0-10.0 score within its tier's band
///
/// The peer group is every item in `all_items` sharing the item's tier and
/// media type. Positions are spread linearly from the band's high end (best
/// rank) to its low end (worst rank), rounded to one decimal. Scores are never
/// stored, so any rank or tier change is reflected on the next read.
pub fn score(item: &RankedItem, all_items: &[RankedItem]) -> f64 {
    let mut peers: Vec<&RankedItem> = all_items
        .iter()
        .filter(|peer| peer.tier == item.tier && peer.media_type == item.media_type)
        .collect();
    peers.sort_by_key(|peer| peer.rank);

    let Some(index) = peers.iter().position(|peer| peer.id == item.id) else {
        return FALLBACK_SCORE;
    };

    let (high, low) = item.tier.score_band();
    let count = peers.len();
    if count == 1 {
        return high;
    }

    let raw = high - (high - low) * index as f64 / (count - 1) as f64;
    round_to_tenth(raw)
}

/// Attaches scores to a list of items, preserving order
pub fn with_scores(items: Vec<RankedItem>) -> Vec<RankedItemView> {
    let scores: Vec<f64> = items.iter().map(|item| score(item, &items)).collect();
    items
        .into_iter()
        .zip(scores)
        .map(|(item, score)| RankedItemView { item, score })
        .collect()
}

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
