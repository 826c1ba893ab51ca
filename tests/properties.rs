//! Property tests for signal invariants.
//!
//! Uses proptest to verify:
//! 1. Geometry never divides by zero and only classifies inside thresholds
//! 2. `executable == (score >= min_signal_score)` for every signal
//! 3. Non-pinbars never score
//! 4. Short windows and inverted RSI levels are rejected
//! 5. Loosening a confirmation threshold never lowers the score

use pinbar::prelude::*;
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_candle() -> impl Strategy<Value = Candle> {
    (
        50.0..150.0_f64,
        0.0..20.0_f64,
        0.0..=1.0_f64,
        0.0..=1.0_f64,
        0.0..10_000.0_f64,
    )
        .prop_map(|(low, range, a, b, volume)| {
            let high = low + range;
            Candle::new(0, low + a * range, high, low, low + b * range, volume)
        })
}

fn context(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let p = 100.0 + (i % 5) as f64;
            Candle::new(i as i64, p, p + 1.0, p - 1.0, p + 0.8, 1000.0)
        })
        .collect()
}

fn window_ending_with(last: Candle) -> Vec<Candle> {
    let mut bars = context(60);
    bars.push(Candle { timestamp: 60, ..last });
    bars
}

// ── 1. Geometry ──────────────────────────────────────────────────────

proptest! {
    /// Ratios stay finite for every well-formed candle, dojis and flat bars included.
    #[test]
    fn classify_is_total(candle in arb_candle()) {
        let c = classify(&candle, &DetectorConfig::default());
        prop_assert!(c.body_ratio.is_finite());
        prop_assert!(c.lower_shadow_ratio.is_finite());
        prop_assert!(c.upper_shadow_ratio.is_finite());
        prop_assert!((0.0..=1.0).contains(&c.quality()));
    }

    /// A pinbar classification always satisfies the configured thresholds.
    #[test]
    fn pinbars_respect_thresholds(candle in arb_candle()) {
        let config = DetectorConfig::default();
        let c = classify(&candle, &config);
        match c.kind {
            PinbarKind::Hammer => {
                prop_assert!(c.lower_shadow_ratio >= config.min_shadow_body_ratio);
                prop_assert!(c.body_ratio <= config.max_body_ratio);
                prop_assert!(c.upper_shadow <= config.max_opposite_shadow_ratio * c.lower_shadow);
            },
            PinbarKind::ShootingStar => {
                prop_assert!(c.upper_shadow_ratio >= config.min_shadow_body_ratio);
                prop_assert!(c.body_ratio <= config.max_body_ratio);
                prop_assert!(c.lower_shadow <= config.max_opposite_shadow_ratio * c.upper_shadow);
            },
            PinbarKind::None => {},
        }
    }

    /// Zero-range candles are never pinbars.
    #[test]
    fn flat_candle_never_classifies(price in 1.0..1_000.0_f64) {
        let flat = Candle::new(0, price, price, price, price, 1.0);
        prop_assert_eq!(classify(&flat, &DetectorConfig::default()).kind, PinbarKind::None);
    }
}

// ── 2-3. Signal invariants ───────────────────────────────────────────

proptest! {
    #[test]
    fn executable_iff_score_reaches_minimum(
        candle in arb_candle(),
        min_score in 1u8..=6,
    ) {
        let config = DetectorConfig { min_signal_score: min_score, ..DetectorConfig::default() };
        let signal = evaluate(&window_ending_with(candle), &config).unwrap();

        prop_assert!(signal.score() <= MAX_SCORE);
        prop_assert_eq!(signal.is_executable(), signal.score() >= min_score);
        prop_assert_eq!(signal.score(), signal.factors().points());
    }

    #[test]
    fn non_pinbars_never_score(candle in arb_candle()) {
        let signal = PinbarSignalEngine::new(DetectorConfig::default())
            .unwrap()
            .evaluate(&window_ending_with(candle))
            .unwrap();

        prop_assert_eq!(signal.direction(), signal.pattern().direction());
        if signal.pattern() == PinbarKind::None {
            prop_assert_eq!(signal.score(), 0);
            prop_assert_eq!(signal.direction(), SignalDirection::None);
            prop_assert!(!signal.is_executable());
        }
    }
}

// ── 4. Rejections ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn short_windows_rejected(len in 0usize..50) {
        let engine = PinbarSignalEngine::new(DetectorConfig::default()).unwrap();
        let result = engine.evaluate(&context(len));
        prop_assert_eq!(result, Err(SignalError::InsufficientData { need: 50, got: len }));
    }

    #[test]
    fn inverted_rsi_levels_rejected(oversold in 1.0..99.0_f64, gap in 0.0..50.0_f64) {
        let overbought = (oversold - gap).max(0.5);
        let config = DetectorConfig {
            rsi_oversold: oversold,
            rsi_overbought: overbought,
            ..DetectorConfig::default()
        };
        prop_assert!(matches!(
            PinbarSignalEngine::new(config),
            Err(SignalError::InvalidConfig(_))
        ));
    }
}

// ── 5. Monotonicity ──────────────────────────────────────────────────

proptest! {
    /// Geometry fixed, an easier volume threshold can only add the volume point.
    #[test]
    fn looser_volume_threshold_never_lowers_score(
        volume in 0.0..5_000.0_f64,
        strict in 0.5..4.0_f64,
        relax in 0.0..0.5_f64,
    ) {
        let last = Candle::new(60, 100.0, 101.0, 90.0, 100.5, volume);
        let bars = window_ending_with(last);
        let strict_cfg = DetectorConfig { volume_threshold: strict, ..DetectorConfig::default() };
        let loose_cfg = DetectorConfig { volume_threshold: strict - relax, ..DetectorConfig::default() };

        let a = evaluate(&bars, &strict_cfg).unwrap();
        let b = evaluate(&bars, &loose_cfg).unwrap();
        prop_assert!(b.score() >= a.score());
        prop_assert!(b.score() - a.score() <= 1);
    }

    /// Raising the oversold level can only add the RSI point.
    #[test]
    fn higher_oversold_never_lowers_score(low in 5.0..40.0_f64, raise in 0.0..25.0_f64) {
        let bars = window_ending_with(Candle::new(60, 100.0, 101.0, 90.0, 100.5, 2500.0));
        let a = evaluate(&bars, &DetectorConfig { rsi_oversold: low, ..DetectorConfig::default() })
            .unwrap();
        let b = evaluate(
            &bars,
            &DetectorConfig { rsi_oversold: low + raise, ..DetectorConfig::default() },
        )
        .unwrap();
        prop_assert!(b.score() >= a.score());
    }
}
