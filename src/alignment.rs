//! Word alignment engine
//!
//! Pure functions that turn a corrected sentence into tappable, wrapped rows:
//! tokenize, mark which corrected words the user already had, pack tokens into
//! rows greedily, and map a row/column back to the token's flat position.
//!
//! The classifier is a set-membership test, not a positional diff. Reordered or
//! repeated words can be reported as present when they moved; that is accepted.

use crate::conversation::{TranslationTarget, Turn};
use std::collections::HashSet;

#[cfg(test)]
mod proptests;

/// Extra width added to every token when packing rows
pub const TOKEN_PADDING: f64 = 10.0;

/// Split on whitespace. Punctuation stays attached to its word.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Keep only letters and digits; case is preserved.
fn normalize(token: &str) -> String {
    token.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// For each corrected token, whether its normalized form occurs anywhere in
/// the original tokens.
pub fn classify<C, O>(corrected: &[C], original: &[O]) -> Vec<bool>
where
    C: AsRef<str>,
    O: AsRef<str>,
{
    let known: HashSet<String> = original.iter().map(|t| normalize(t.as_ref())).collect();
    corrected
        .iter()
        .map(|t| known.contains(&normalize(t.as_ref())))
        .collect()
}

/// Greedy left-to-right row packing with [`TOKEN_PADDING`] per token.
pub fn wrap<'a, T, F>(tokens: &'a [T], width_fn: F, max_width: f64) -> Vec<Vec<&'a str>>
where
    T: AsRef<str>,
    F: Fn(&str) -> f64,
{
    wrap_with_padding(tokens, width_fn, max_width, TOKEN_PADDING)
}

/// Greedy packing with an explicit per-token padding.
///
/// A token wider than `max_width` is never split; it gets a row of its own.
pub fn wrap_with_padding<'a, T, F>(
    tokens: &'a [T],
    width_fn: F,
    max_width: f64,
    padding: f64,
) -> Vec<Vec<&'a str>>
where
    T: AsRef<str>,
    F: Fn(&str) -> f64,
{
    let mut rows = Vec::new();
    let mut current_row: Vec<&str> = Vec::new();
    let mut current_width = 0.0;

    for token in tokens {
        let token = token.as_ref();
        let width = width_fn(token) + padding;
        if current_width + width > max_width && !current_row.is_empty() {
            rows.push(std::mem::take(&mut current_row));
            current_row.push(token);
            current_width = width;
        } else {
            current_row.push(token);
            current_width += width;
        }
    }

    if !current_row.is_empty() {
        rows.push(current_row);
    }

    rows
}

/// Number of tokens in all rows before `row`, plus `col`.
pub fn flat_index<T>(rows: &[Vec<T>], row: usize, col: usize) -> usize {
    rows.iter().take(row).map(Vec::len).sum::<usize>() + col
}

/// Like [`flat_index`], but `None` when the position does not hold a token.
pub fn checked_flat_index<T>(rows: &[Vec<T>], row: usize, col: usize) -> Option<usize> {
    let target_row = rows.get(row)?;
    (col < target_row.len()).then(|| flat_index(rows, row, col))
}

/// One token placed in a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedToken {
    pub text: String,
    /// Position in the unwrapped token sequence
    pub index: usize,
    /// Whether the user already wrote this word; only known for corrections
    pub in_original: Option<bool>,
}

/// Wrapped, classified view of one token sequence of a finalized turn
#[derive(Debug, Clone)]
pub struct TokenLayout {
    target: TranslationTarget,
    rows: Vec<Vec<PlacedToken>>,
}

impl TokenLayout {
    /// Lay out the corrected sentence or the reply of `turn`. `None` until the
    /// turn has that sequence.
    pub fn for_turn<F>(
        turn: &Turn,
        target: TranslationTarget,
        width_fn: F,
        max_width: f64,
        padding: f64,
    ) -> Option<Self>
    where
        F: Fn(&str) -> f64,
    {
        let tokens = turn.tokens(target)?;
        let presence = match target {
            TranslationTarget::Correction => Some(classify(tokens, &turn.original_tokens())),
            TranslationTarget::Reply => None,
        };

        let mut index = 0;
        let rows = wrap_with_padding(tokens, width_fn, max_width, padding)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|text| {
                        let placed = PlacedToken {
                            text: text.to_string(),
                            index,
                            in_original: presence.as_ref().map(|p| p[index]),
                        };
                        index += 1;
                        placed
                    })
                    .collect()
            })
            .collect();

        Some(Self { target, rows })
    }

    pub fn target(&self) -> TranslationTarget {
        self.target
    }

    pub fn rows(&self) -> &[Vec<PlacedToken>] {
        &self.rows
    }

    pub fn token_at(&self, row: usize, col: usize) -> Option<&PlacedToken> {
        self.rows.get(row)?.get(col)
    }

    /// Resolve a tapped position to the word's translation in `turn`.
    pub fn translation_at<'t>(&self, turn: &'t Turn, row: usize, col: usize) -> Option<&'t str> {
        let index = checked_flat_index(&self.rows, row, col)?;
        turn.translation_at(self.target, index)
    }
}
