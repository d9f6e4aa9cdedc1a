//! Property coverage for input normalization.

use proptest::prelude::*;
use tutorweave::normalize::normalize;

fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || matches!(c, '.' | ',' | '?' | '!' | '-' | '(' | ')')
}

proptest! {
    #[test]
    fn normalization_is_idempotent(input in ".*") {
        let once = normalize(&input);
        prop_assert_eq!(&normalize(&once), &once);
    }

    #[test]
    fn output_is_trimmed_and_single_spaced(input in ".*") {
        let out = normalize(&input);
        prop_assert!(!out.starts_with(' '));
        prop_assert!(!out.ends_with(' '));
        prop_assert!(!out.contains("  "));
    }

    #[test]
    fn output_contains_only_kept_characters_and_spaces(input in ".*") {
        let out = normalize(&input);
        prop_assert!(out.chars().all(|c| c == ' ' || is_kept(c)));
    }

    #[test]
    fn kept_characters_survive_in_order(input in "[a-z0-9?!. ]*") {
        let out = normalize(&input);
        let expected: Vec<char> = input.chars().filter(|c| is_kept(*c)).collect();
        let got: Vec<char> = out.chars().filter(|c| *c != ' ').collect();
        prop_assert_eq!(got, expected);
    }
}
