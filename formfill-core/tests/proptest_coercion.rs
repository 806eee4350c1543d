//! Property tests for value coercion and base64 handling

use base64::{engine::general_purpose::STANDARD, Engine as _};
use formfill::image_source::decode_base64;
use formfill::value::{is_checked, parse_flag, to_field_text};
use proptest::prelude::*;
use serde_json::Value;

fn mixed_case(token: &'static str) -> impl Strategy<Value = String> {
    proptest::collection::vec(any::<bool>(), token.len()).prop_map(move |upper| {
        token
            .chars()
            .zip(upper)
            .map(|(c, u)| if u { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

proptest! {
    #[test]
    fn checked_tokens_in_any_case(
        token in prop_oneof![
            mixed_case("true"),
            mixed_case("1"),
            mixed_case("yes"),
            mixed_case("on"),
            mixed_case("x"),
        ]
    ) {
        prop_assert!(is_checked(&Value::String(token)));
    }

    #[test]
    fn other_tokens_are_unchecked(token in "[a-z0-9]{2,8}") {
        prop_assume!(!["true", "yes", "on"].contains(&token.as_str()));
        prop_assert!(!is_checked(&Value::String(token)));
    }

    #[test]
    fn flags_ignore_case_and_whitespace(
        token in prop_oneof![mixed_case("true"), mixed_case("on"), mixed_case("yes")],
        pad in " {0,3}",
    ) {
        let padded = format!("{pad}{token}{pad}");
        prop_assert!(parse_flag(&padded));
    }

    #[test]
    fn strings_are_written_verbatim(text in ".*") {
        prop_assert_eq!(to_field_text(&Value::String(text.clone())), text);
    }

    #[test]
    fn base64_tolerates_whitespace_and_missing_padding(
        bytes in proptest::collection::vec(any::<u8>(), 1..256),
        break_at in 0usize..64,
    ) {
        let encoded = STANDARD.encode(&bytes);
        let unpadded = encoded.trim_end_matches('=');
        let split = break_at.min(unpadded.len());
        let messy = format!(" {}\n{} ", &unpadded[..split], &unpadded[split..]);

        prop_assert_eq!(decode_base64(&messy), Some(bytes));
    }

    #[test]
    fn data_url_payloads_decode(bytes in proptest::collection::vec(any::<u8>(), 1..128)) {
        let url = format!("data:application/octet-stream;base64,{}", STANDARD.encode(&bytes));
        prop_assert_eq!(decode_base64(&url), Some(bytes));
    }
}
