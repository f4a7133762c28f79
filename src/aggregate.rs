use std::collections::{BTreeSet, HashMap};

use crate::domain::{ArtistRecord, HistoryItem, RankedList};

pub const DEFAULT_TOP_N: usize = 5;

/// Sorts labels by descending count, breaking ties by ascending label, and
/// keeps the first `top_n`.
pub fn rank_counts(counts: HashMap<String, usize>, top_n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a_label, a_count), (b_label, b_count)| {
        b_count.cmp(a_count).then_with(|| a_label.cmp(b_label))
    });
    ranked.truncate(top_n);
    ranked
}

/// Every genre tag on every record counts once per record, so an artist
/// listed twice weighs twice.
pub fn count_genres(artists: &[ArtistRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for artist in artists {
        let tags: BTreeSet<&str> = artist.genres.iter().map(String::as_str).collect();
        for tag in tags {
            *counts.entry(tag.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

pub fn count_primary_artists(items: &[HistoryItem]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for artist in items.iter().filter_map(HistoryItem::primary_artist) {
        *counts.entry(artist.name.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn top_genres(artists: &[ArtistRecord], top_n: usize) -> RankedList {
    labels(rank_counts(count_genres(artists), top_n))
}

pub fn top_artists(items: &[HistoryItem], top_n: usize) -> RankedList {
    labels(rank_counts(count_primary_artists(items), top_n))
}

fn labels(ranked: Vec<(String, usize)>) -> RankedList {
    RankedList::from_ranked(ranked.into_iter().map(|(label, _)| label).collect())
}
