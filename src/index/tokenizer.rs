//! Text tokenization shared by the indexer and the search engine

use crate::storage::Posting;
use std::collections::BTreeMap;
use unicode_segmentation::UnicodeSegmentation;

/// Tokens of this many characters or fewer are not indexed
pub const MIN_TOKEN_CHARS: usize = 2;

/// Splits text into lowercase index terms
///
/// Words are found by Unicode word segmentation, so punctuation never ends
/// up inside a term. Terms of two characters or fewer are dropped.
///
/// # Examples
///
/// ```
/// use sumi_index::index::tokenize;
///
/// assert_eq!(tokenize("The Rust crawler, v2!"), vec!["the", "rust", "crawler"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > MIN_TOKEN_CHARS)
        .collect()
}

/// Builds one posting per distinct term of `content`
///
/// Positions are offsets into the token stream produced by [`tokenize`].
/// Postings are ordered by word.
pub fn build_postings(content: &str) -> Vec<Posting> {
    let mut positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();

    for (position, token) in tokenize(content).into_iter().enumerate() {
        positions.entry(token).or_default().push(position as u32);
    }

    positions
        .into_iter()
        .map(|(word, positions)| Posting {
            word,
            frequency: positions.len() as u32,
            positions,
        })
        .collect()
}
