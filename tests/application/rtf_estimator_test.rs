use std::sync::Arc;

use whisper_gateway::application::services::{DEFAULT_RTF_ESTIMATE, RtfEstimator};

#[test]
fn given_new_estimator_when_reading_then_returns_configured_default() {
    let estimator = RtfEstimator::new(1.0, 0.2);
    assert_eq!(estimator.estimate(), 1.0);

    let custom = RtfEstimator::new(0.35, 0.2);
    assert_eq!(custom.estimate(), 0.35);
}

#[test]
fn given_default_estimator_when_reading_then_uses_default_constant() {
    assert_eq!(RtfEstimator::default().estimate(), DEFAULT_RTF_ESTIMATE);
}

#[test]
fn given_first_observation_when_updating_then_estimate_becomes_observed_value() {
    let estimator = RtfEstimator::new(1.0, 0.2);
    estimator.update(2.0);
    assert_eq!(estimator.estimate(), 2.0);
}

#[test]
fn given_prior_average_when_updating_then_applies_exponential_smoothing() {
    let estimator = RtfEstimator::new(1.0, 0.2);
    estimator.update(2.0);
    estimator.update(1.0);
    assert!((estimator.estimate() - 1.8).abs() < 1e-12);
}

#[test]
fn given_estimate_when_forecasting_then_scales_audio_duration() {
    let estimator = RtfEstimator::new(0.5, 0.2);
    assert!((estimator.estimate_processing_secs(60.0) - 30.0).abs() < 1e-12);
}

#[test]
fn given_concurrent_identical_updates_when_reading_then_no_update_corrupts_average() {
    let estimator = Arc::new(RtfEstimator::new(1.0, 0.2));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let estimator = Arc::clone(&estimator);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    estimator.update(0.4);
                    let _ = estimator.estimate();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!((estimator.estimate() - 0.4).abs() < 1e-9);
}
