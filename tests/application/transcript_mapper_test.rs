use whisper_gateway::application::services::{map_segment, segment_confidence};

use crate::helpers::{segment, word};

#[test]
fn given_avg_logprob_when_scoring_then_confidence_is_its_exponent() {
    let confidence = segment_confidence(Some(0.8f64.ln()), None).unwrap();
    assert!((confidence - 0.8).abs() < 1e-12);
}

#[test]
fn given_avg_logprob_and_words_when_scoring_then_logprob_wins() {
    let words = vec![word(0.0, 1.0, "hi", Some(0.1))];
    let confidence = segment_confidence(Some(0.5f64.ln()), Some(&words)).unwrap();
    assert!((confidence - 0.5).abs() < 1e-12);
}

#[test]
fn given_positive_logprob_when_scoring_then_confidence_is_clamped_to_one() {
    assert_eq!(segment_confidence(Some(0.5), None), Some(1.0));
}

#[test]
fn given_only_word_probabilities_when_scoring_then_confidence_is_their_mean() {
    let words = vec![
        word(0.0, 0.5, "a", Some(0.9)),
        word(0.5, 1.0, "b", Some(0.7)),
    ];
    let confidence = segment_confidence(None, Some(&words)).unwrap();
    assert!((confidence - 0.8).abs() < 1e-12);
}

#[test]
fn given_words_missing_probabilities_when_scoring_then_they_are_skipped() {
    let words = vec![word(0.0, 0.5, "a", Some(0.6)), word(0.5, 1.0, "b", None)];
    let confidence = segment_confidence(None, Some(&words)).unwrap();
    assert!((confidence - 0.6).abs() < 1e-12);
}

#[test]
fn given_no_logprob_and_no_words_when_scoring_then_confidence_is_absent() {
    assert_eq!(segment_confidence(None, None), None);
    assert_eq!(segment_confidence(None, Some(&[])), None);
}

#[test]
fn given_nan_logprob_when_scoring_then_falls_back_to_words() {
    let words = vec![word(0.0, 0.5, "a", Some(0.4))];
    let confidence = segment_confidence(Some(f64::NAN), Some(&words)).unwrap();
    assert!((confidence - 0.4).abs() < 1e-12);
}

#[test]
fn given_detailed_mapping_when_segment_has_words_then_words_and_text_are_carried() {
    let mut recognized = segment(1.0, 2.0, "  hello there ");
    recognized.words = Some(vec![
        word(1.0, 1.4, "hello", Some(0.9)),
        word(1.5, 2.0, "there", Some(0.5)),
    ]);

    let mapped = map_segment(recognized, true);

    assert_eq!(mapped.text, "hello there");
    assert_eq!(mapped.start, 1.0);
    assert_eq!(mapped.end, 2.0);
    let words = mapped.words.unwrap();
    assert_eq!(words.len(), 2);
    assert_eq!(words[1].word, "there");
    assert_eq!(words[1].probability, Some(0.5));
    assert!((mapped.confidence.unwrap() - 0.7).abs() < 1e-12);
}

#[test]
fn given_bare_mapping_when_segment_has_details_then_they_are_dropped() {
    let mut recognized = segment(0.0, 1.0, " hi ");
    recognized.avg_logprob = Some(-0.2);
    recognized.words = Some(vec![word(0.0, 1.0, "hi", Some(0.9))]);

    let mapped = map_segment(recognized, false);

    assert_eq!(mapped.text, "hi");
    assert!(mapped.confidence.is_none());
    assert!(mapped.words.is_none());
}

#[test]
fn given_unscored_or_out_of_range_words_when_mapping_then_probability_stays_in_unit_range() {
    let mut recognized = segment(0.0, 2.0, "a b c");
    recognized.words = Some(vec![
        word(0.0, 0.5, "a", None),
        word(0.5, 1.0, "b", Some(1.2)),
        word(1.0, 2.0, "c", Some(f64::NAN)),
    ]);

    let mapped = map_segment(recognized, true);

    let probabilities: Vec<_> = mapped.words.unwrap().iter().map(|w| w.probability).collect();
    assert_eq!(probabilities, [None, Some(1.0), None]);
}

#[test]
fn given_unscored_word_when_serialized_then_probability_is_null() {
    let mut recognized = segment(0.0, 1.0, "hi");
    recognized.words = Some(vec![word(0.0, 1.0, "hi", None)]);

    let json = serde_json::to_value(map_segment(recognized, true)).unwrap();

    assert!(json["words"][0]["probability"].is_null());
    assert_eq!(json["words"][0]["word"], "hi");
}
