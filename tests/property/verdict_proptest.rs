//! Property-based tests for moderation verdicts

use proptest::prelude::*;
use serde_json::json;
use storychain::backend::moderation::verdict::{evaluate, is_flagged, SCORE_THRESHOLD};

proptest! {
    #[test]
    fn test_bare_boolean_decides(flag in any::<bool>()) {
        prop_assert_eq!(is_flagged(&json!(flag)), flag);
    }

    #[test]
    fn test_score_compared_to_threshold(score in 0.0f64..1.0) {
        let response = json!({ "score": score });
        prop_assert_eq!(is_flagged(&response), score > SCORE_THRESHOLD);
    }

    #[test]
    fn test_string_scores_match_numbers(score in 0.0f64..1.0) {
        let numeric = is_flagged(&json!({ "score": score }));
        let textual = is_flagged(&json!({ "score": score.to_string() }));
        prop_assert_eq!(numeric, textual);
    }

    #[test]
    fn test_flag_key_beats_score(flag in any::<bool>(), score in 0.0f64..1.0) {
        let verdict = evaluate(&json!({ "flagged": flag, "score": score }));
        prop_assert_eq!(verdict.flagged, flag);
        prop_assert_eq!(verdict.rule, Some("flag_key"));
    }

    #[test]
    fn test_unrelated_keys_are_clean(key in "[a-z]{1,8}", value in "[a-z]{0,8}") {
        prop_assume!(!matches!(key.as_str(), "reason" | "label" | "result" | "prediction" | "score"));
        let response = json!({ key: value });
        prop_assert!(!is_flagged(&response));
    }
}
