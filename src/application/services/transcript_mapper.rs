use crate::application::ports::{RecognizedSegment, RecognizedWord};
use crate::domain::{TranscriptSegment, TranscriptWord};

/// Confidence for one segment.
///
/// A finite mean log-probability wins (`exp`, clamped to `[0, 1]`); otherwise
/// the mean of the known word probabilities; otherwise none.
pub fn segment_confidence(avg_logprob: Option<f64>, words: Option<&[RecognizedWord]>) -> Option<f64> {
    if let Some(logprob) = avg_logprob.filter(|lp| !lp.is_nan()) {
        return Some(logprob.exp().clamp(0.0, 1.0));
    }

    let probabilities: Vec<f64> = words?
        .iter()
        .filter_map(|w| w.probability)
        .filter(|p| p.is_finite())
        .collect();

    if probabilities.is_empty() {
        return None;
    }

    Some(probabilities.iter().sum::<f64>() / probabilities.len() as f64)
}

/// Reshapes an engine segment into the response schema.
///
/// With `detailed` off the segment carries only timing and text.
pub fn map_segment(segment: RecognizedSegment, detailed: bool) -> TranscriptSegment {
    let text = segment.text.trim().to_string();

    if !detailed {
        return TranscriptSegment {
            start: segment.start,
            end: segment.end,
            text,
            confidence: None,
            words: None,
        };
    }

    let confidence = segment_confidence(segment.avg_logprob, segment.words.as_deref());
    let words = segment.words.map(|words| {
        words
            .into_iter()
            .map(|w| TranscriptWord {
                start: w.start,
                end: w.end,
                word: w.word,
                probability: w
                    .probability
                    .filter(|p| p.is_finite())
                    .map(|p| p.clamp(0.0, 1.0)),
            })
            .collect()
    });

    TranscriptSegment {
        start: segment.start,
        end: segment.end,
        text,
        confidence,
        words,
    }
}
