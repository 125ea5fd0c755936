use crm_import::normalize::normalize_header;
use proptest::prelude::*;

#[test]
fn normalize_joins_words_with_underscores() {
    assert_eq!(normalize_header("First Name"), "first_name");
}

#[test]
fn normalize_collapses_and_strips_punctuation() {
    assert_eq!(normalize_header("  E-Mail!! "), "e_mail");
    assert_eq!(normalize_header("Zip / Postal   Code"), "zip_postal_code");
}

#[test]
fn normalize_replaces_non_ascii_letters() {
    assert_eq!(normalize_header("Prénom"), "pr_nom");
}

#[test]
fn normalize_of_punctuation_only_is_empty() {
    assert_eq!(normalize_header(" -- "), "");
}

proptest! {
    #[test]
    fn normalize_is_idempotent_and_token_shaped(input in "\\PC{0,24}") {
        let once = normalize_header(&input);
        prop_assert_eq!(normalize_header(&once), once.clone());
        prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!once.contains("__"));
        prop_assert!(!once.starts_with('_') && !once.ends_with('_'));
    }
}
