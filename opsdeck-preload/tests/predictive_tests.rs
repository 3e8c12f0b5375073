use opsdeck_preload::{DataPreloader, PredictiveConfig, PredictivePreloader, PreloadConfig};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

fn predictor(config: PredictiveConfig) -> PredictivePreloader<String> {
    let preloader = DataPreloader::new(PreloadConfig {
        prefetch_delay_ms: 0,
        ..Default::default()
    });
    PredictivePreloader::new(preloader, config)
}

fn record_all(p: &mut PredictivePreloader<String>, keys: &[&str]) {
    for key in keys {
        p.record_access(key);
    }
}

fn history_keys(p: &PredictivePreloader<String>) -> Vec<String> {
    p.access_history().into_iter().map(|r| r.key).collect()
}

// ── History ──────────────────────────────────────────────────────

#[test]
fn records_accesses_in_order() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "b", "a"]);

    assert_eq!(history_keys(&p), vec!["a", "b", "a"]);
}

#[test]
fn history_drops_oldest_beyond_capacity() {
    let mut p = predictor(PredictiveConfig {
        max_history_size: 3,
        ..Default::default()
    });
    record_all(&mut p, &["k1", "k2", "k3", "k4", "k5"]);

    assert_eq!(history_keys(&p), vec!["k3", "k4", "k5"]);
}

#[test]
fn frequency_counts_only_retained_history() {
    let mut p = predictor(PredictiveConfig {
        max_history_size: 4,
        ..Default::default()
    });
    record_all(&mut p, &["a", "a", "b", "a", "b", "c"]);

    let frequency = p.access_frequency();
    assert_eq!(frequency.get("a"), Some(&1));
    assert_eq!(frequency.get("b"), Some(&2));
    assert_eq!(frequency.get("c"), Some(&1));
}

#[test]
fn clear_history_resets_everything() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "a", "a"]);

    p.clear_history();

    assert!(p.access_history().is_empty());
    assert!(p.access_frequency().is_empty());
    assert!(p.predict_next_keys("x").is_empty());
}

#[test]
fn disabled_predictor_records_nothing() {
    let mut p = predictor(PredictiveConfig {
        enabled: false,
        ..Default::default()
    });
    record_all(&mut p, &["a", "a", "a", "a"]);

    assert!(p.access_history().is_empty());
    assert!(p.predict_next_keys("b").is_empty());
}

// ── Prediction ───────────────────────────────────────────────────

#[test]
fn keys_below_threshold_are_not_predicted() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "a", "b", "b", "b"]);

    assert_eq!(p.predict_next_keys("x"), vec!["b"]);
}

#[test]
fn current_key_is_excluded() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "a", "a", "b", "b", "b"]);

    assert_eq!(p.predict_next_keys("a"), vec!["b"]);
}

#[test]
fn predictions_rank_by_frequency_then_recency() {
    let mut p = predictor(PredictiveConfig {
        max_predictions: 5,
        ..Default::default()
    });
    record_all(
        &mut p,
        &["a", "b", "c", "a", "b", "c", "c", "a", "b", "d", "d", "d", "c"],
    );
    // c: 4, then a/b/d tied at 3 with d most recent, then b, then a.

    assert_eq!(p.predict_next_keys("x"), vec!["c", "d", "b", "a"]);
}

#[test]
fn predictions_are_truncated() {
    let mut p = predictor(PredictiveConfig {
        max_predictions: 2,
        prediction_threshold: 1,
        ..Default::default()
    });
    record_all(&mut p, &["a", "b", "c", "d"]);

    assert_eq!(p.predict_next_keys("x"), vec!["d", "c"]);
}

#[test]
fn empty_history_predicts_nothing() {
    let p = predictor(PredictiveConfig::default());
    assert!(p.predict_next_keys("a").is_empty());
}

// ── prefetch_predicted ───────────────────────────────────────────

#[tokio::test]
async fn prefetch_predicted_loads_each_prediction_once() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "a", "a", "b", "b", "b", "c"]);
    let loaded = RefCell::new(Vec::new());

    p.prefetch_predicted("c", |key| {
        loaded.borrow_mut().push(key.to_string());
        let value = format!("data:{key}");
        async move { Ok(Some(value)) }
    })
    .await;

    assert_eq!(loaded.into_inner(), vec!["b", "a"]);
    assert_eq!(p.preloader().get("a").unwrap().value, "data:a");
    assert_eq!(p.preloader().cache_keys(), vec!["a", "b"]);
}

#[tokio::test]
async fn prefetch_predicted_without_predictions_never_loads() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "b"]);
    let calls = RefCell::new(0);

    p.prefetch_predicted("a", |_key| {
        *calls.borrow_mut() += 1;
        async { Ok(Some("v".to_string())) }
    })
    .await;

    assert_eq!(*calls.borrow(), 0);
}

#[tokio::test]
async fn prefetch_predicted_survives_per_key_failures() {
    let mut p = predictor(PredictiveConfig::default());
    record_all(&mut p, &["a", "a", "a", "b", "b", "b", "b"]);
    let attempted = RefCell::new(Vec::new());

    p.prefetch_predicted("x", |key| {
        attempted.borrow_mut().push(key.to_string());
        let outcome = if key == "b" {
            Err(anyhow::anyhow!("gateway timeout"))
        } else {
            Ok(Some("v".to_string()))
        };
        async move { outcome }
    })
    .await;

    assert_eq!(attempted.into_inner(), vec!["b", "a"]);
    assert_eq!(p.preloader().cache_keys(), vec!["a"]);
}
