//! Property-based tests for the word alignment engine
//!
//! - Wrapping never loses, duplicates or reorders tokens
//! - Rows never exceed the width unless they hold a single token
//! - Packing is greedy: the next row's first token never fit on the previous row
//! - Flat indices walk the original sequence in order

use super::*;
use proptest::prelude::*;

fn arb_tokens() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Zäö,.!?]{1,15}", 0..30)
}

fn char_width(token: &str) -> f64 {
    f64::from(u32::try_from(token.chars().count()).unwrap_or(u32::MAX)) * 8.0
}

fn row_width(row: &[&str], padding: f64) -> f64 {
    row.iter().map(|t| char_width(t) + padding).sum()
}

proptest! {
    #[test]
    fn prop_wrap_preserves_token_order(tokens in arb_tokens(), max_width in 1.0f64..400.0) {
        let rows = wrap(&tokens, char_width, max_width);
        let flattened: Vec<&str> = rows.iter().flatten().copied().collect();
        let expected: Vec<&str> = tokens.iter().map(String::as_str).collect();
        prop_assert_eq!(flattened, expected);
    }

    #[test]
    fn prop_wrap_has_no_empty_rows(tokens in arb_tokens(), max_width in 1.0f64..400.0) {
        let rows = wrap(&tokens, char_width, max_width);
        prop_assert!(rows.iter().all(|row| !row.is_empty()));
    }

    #[test]
    fn prop_rows_fit_or_hold_one_token(tokens in arb_tokens(), max_width in 1.0f64..400.0) {
        let rows = wrap(&tokens, char_width, max_width);
        for row in &rows {
            prop_assert!(row.len() == 1 || row_width(row, TOKEN_PADDING) <= max_width);
        }
    }

    #[test]
    fn prop_wrap_is_greedy(tokens in arb_tokens(), max_width in 1.0f64..400.0) {
        let rows = wrap(&tokens, char_width, max_width);
        for pair in rows.windows(2) {
            let carried = char_width(pair[1][0]) + TOKEN_PADDING;
            prop_assert!(row_width(&pair[0], TOKEN_PADDING) + carried > max_width);
        }
    }

    #[test]
    fn prop_wrap_is_deterministic(tokens in arb_tokens(), max_width in 1.0f64..400.0) {
        prop_assert_eq!(
            wrap(&tokens, char_width, max_width),
            wrap(&tokens, char_width, max_width)
        );
    }

    #[test]
    fn prop_flat_index_walks_sequence(tokens in arb_tokens(), max_width in 1.0f64..400.0) {
        let rows = wrap(&tokens, char_width, max_width);
        let mut expected = 0;
        for (r, row) in rows.iter().enumerate() {
            for (c, token) in row.iter().enumerate() {
                let index = flat_index(&rows, r, c);
                prop_assert_eq!(index, expected);
                prop_assert_eq!(checked_flat_index(&rows, r, c), Some(index));
                prop_assert_eq!(tokens[index].as_str(), *token);
                expected += 1;
            }
        }
    }

    #[test]
    fn prop_classify_self_is_all_present(tokens in arb_tokens()) {
        let presence = classify(&tokens, &tokens);
        prop_assert_eq!(presence.len(), tokens.len());
        prop_assert!(presence.iter().all(|p| *p));
    }

    #[test]
    fn prop_classify_ignores_punctuation(tokens in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        let punctuated: Vec<String> = tokens.iter().map(|t| format!("{t},")).collect();
        prop_assert!(classify(&punctuated, &tokens).iter().all(|p| *p));
    }

    #[test]
    fn prop_tokenize_matches_whitespace_split(text in "[a-zA-Z ,.\t\n]{0,80}") {
        let tokens = tokenize(&text);
        prop_assert!(tokens.iter().all(|t| !t.is_empty() && !t.contains(char::is_whitespace)));
        prop_assert_eq!(tokens.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }
}
