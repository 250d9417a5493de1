use proptest::prelude::*;
use tokenize::tokenize;
use wordiff::{apply, diff_tokens, edit_distance, EditOp};

fn sentence() -> impl Strategy<Value = String> {
    let word = prop::sample::select(vec![
        "the", "lessee", "shall", "pay", "$100", "$150", "15%", "30", "days", ",", ".", "Net",
        "1,000.50", "đồng",
    ]);
    let sep = prop::sample::select(vec![" ", "  ", "\n", ""]);
    prop::collection::vec((word, sep), 0..12).prop_map(|parts| {
        parts
            .into_iter()
            .map(|(w, s)| format!("{w}{s}"))
            .collect::<String>()
    })
}

proptest! {
    #[test]
    fn apply_rebuilds_new_tokens(old in sentence(), new in sentence()) {
        let old_tokens = tokenize(&old);
        let new_tokens = tokenize(&new);
        let script = diff_tokens(&old_tokens, &new_tokens);
        let rebuilt = apply(&script, &old_tokens, &new_tokens).unwrap();
        prop_assert_eq!(rebuilt, new_tokens);
    }

    #[test]
    fn spans_tile_both_sequences(old in sentence(), new in sentence()) {
        let old_tokens = tokenize(&old);
        let new_tokens = tokenize(&new);
        let script = diff_tokens(&old_tokens, &new_tokens);

        let old_covered: usize = script.iter().filter_map(EditOp::old_span).map(|s| s.len()).sum();
        let new_covered: usize = script.iter().filter_map(EditOp::new_span).map(|s| s.len()).sum();
        prop_assert_eq!(old_covered, old_tokens.len());
        prop_assert_eq!(new_covered, new_tokens.len());
    }

    #[test]
    fn identity_iff_equal_text(text in sentence()) {
        let tokens = tokenize(&text);
        let script = diff_tokens(&tokens, &tokens);
        prop_assert!(script.is_identity());
        prop_assert_eq!(edit_distance(&tokens, &tokens), 0);
    }
}

#[test]
fn distance_is_symmetric_on_fixed_cases() {
    let cases = [
        ("pay 30 days", "pay 45 days"),
        ("", "something new"),
        ("Net 30.", "Net 30 days."),
    ];
    for (a, b) in cases {
        let a = tokenize(a);
        let b = tokenize(b);
        assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
    }
}
