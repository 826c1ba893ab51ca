//! Integration tests for pinbar signal evaluation.
//!
//! These exercise the public API with a caller-defined bar type.

use pinbar::prelude::*;

/// Simple test bar structure without a timestamp
#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

impl TestBar {
    fn new(o: f64, h: f64, l: f64, c: f64, v: f64) -> Self {
        Self { o, h, l, c, v }
    }
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        self.v
    }
}

/// Oscillating bars that never classify as pinbars.
/// Swing lows sit at `base - 1`, swing highs at `base + 5`.
fn make_context_at(base: f64, n: usize) -> Vec<TestBar> {
    (0..n)
        .map(|i| {
            let p = base + (i % 5) as f64;
            TestBar::new(p, p + 1.0, p - 1.0, p + 0.8, 1000.0)
        })
        .collect()
}

fn make_context(n: usize) -> Vec<TestBar> {
    make_context_at(100.0, n)
}

fn with_last(last: TestBar) -> Vec<TestBar> {
    let mut bars = make_context(60);
    bars.push(last);
    bars
}

/// Hammer closing 0.1% above a swing-low support at 100.4
fn hammer_at_support() -> Vec<TestBar> {
    let mut bars = make_context_at(101.4, 60);
    bars.push(hammer());
    bars
}

/// Shooting star closing 0.1% below a swing-high resistance at 99.6
fn star_at_resistance() -> Vec<TestBar> {
    let mut bars = make_context_at(94.6, 60);
    bars.push(shooting_star());
    bars
}

fn hammer() -> TestBar {
    TestBar::new(100.0, 101.0, 90.0, 100.5, 2500.0)
}

fn shooting_star() -> TestBar {
    TestBar::new(100.0, 110.0, 99.0, 99.5, 2500.0)
}

fn engine() -> PinbarSignalEngine {
    PinbarSignalEngine::new(DetectorConfig::default()).unwrap()
}

fn scenario_config() -> DetectorConfig {
    DetectorConfig {
        min_shadow_body_ratio: 1.8,
        max_body_ratio: 0.4,
        ..DetectorConfig::default()
    }
}

// ============================================================
// GEOMETRY SCENARIOS
// ============================================================

#[test]
fn test_scenario_a_hammer() {
    let candidate = classify(&hammer(), &scenario_config());
    assert_eq!(candidate.kind, PinbarKind::Hammer);

    let signal = evaluate(&with_last(hammer()), &scenario_config()).unwrap();
    assert_eq!(signal.pattern(), PinbarKind::Hammer);
    assert_eq!(signal.direction(), SignalDirection::Long);
}

#[test]
fn test_scenario_b_shooting_star() {
    let candidate = classify(&shooting_star(), &scenario_config());
    assert_eq!(candidate.kind, PinbarKind::ShootingStar);

    let signal = evaluate(&with_last(shooting_star()), &scenario_config()).unwrap();
    assert_eq!(signal.pattern(), PinbarKind::ShootingStar);
    assert_eq!(signal.direction(), SignalDirection::Short);
}

#[test]
fn test_scenario_c_no_dominant_shadow() {
    let bar = TestBar::new(100.0, 100.5, 99.5, 100.3, 1000.0);
    let signal = evaluate(&with_last(bar), &scenario_config()).unwrap();
    assert_eq!(signal.pattern(), PinbarKind::None);
    assert_eq!(signal.direction(), SignalDirection::None);
    assert_eq!(signal.score(), 0);
    assert!(!signal.is_executable());
}

#[test]
fn test_scenario_d_rsi_point() {
    let bars = with_last(hammer());
    let rsi = engine().evaluate(&bars).unwrap().indicators().unwrap().rsi;

    let below = DetectorConfig {
        rsi_oversold: (rsi + 5.0).min(65.0),
        ..DetectorConfig::default()
    };
    let above = DetectorConfig {
        rsi_oversold: (rsi - 5.0).max(1.0),
        ..DetectorConfig::default()
    };

    let confirmed = evaluate(&bars, &below).unwrap();
    let unconfirmed = evaluate(&bars, &above).unwrap();

    assert_eq!(confirmed.candidate(), unconfirmed.candidate());
    assert!(confirmed.factors().rsi_confirmation);
    assert!(!unconfirmed.factors().rsi_confirmation);
    assert_eq!(confirmed.score(), unconfirmed.score() + 1);
}

// ============================================================
// CONFIRMATIONS
// ============================================================

#[test]
fn test_hammer_confirmations() {
    let signal = engine().evaluate(&hammer_at_support()).unwrap();
    let factors = signal.factors();

    assert!(factors.quality_point);
    assert!(factors.bollinger_confirmation);
    assert!(factors.volume_confirmation);
    assert!(factors.level_confirmation);
    assert!(factors.pattern_quality > 0.9);
    assert_eq!(signal.score(), factors.points());
    assert!(signal.is_executable());
    assert!((signal.confidence() - f64::from(signal.score()) / 6.0).abs() < 1e-12);
}

#[test]
fn test_shooting_star_confirmations() {
    let signal = engine().evaluate(&star_at_resistance()).unwrap();
    let factors = signal.factors();

    assert!(factors.bollinger_confirmation);
    assert!(factors.volume_confirmation);
    assert!(factors.level_confirmation);
    let level = signal.indicators().unwrap().confirming_level.unwrap();
    assert!((level - 99.6).abs() < 1e-9);

    let levels = signal.trade_levels().unwrap();
    assert!(levels.stop_loss > 110.0);
    assert!(levels.take_profits.iter().all(|&tp| tp < levels.entry));
}

#[test]
fn test_distant_levels_do_not_confirm() {
    // the wicks cross levels 1.5% (support 99) and 5% (resistance 105) from the close
    for last in [hammer(), shooting_star()] {
        let signal = engine().evaluate(&with_last(last)).unwrap();
        assert!(!signal.factors().level_confirmation);
        assert_eq!(signal.indicators().unwrap().confirming_level, None);
    }
}

#[test]
fn test_volume_below_threshold_loses_point() {
    let quiet = TestBar { v: 1000.0, ..hammer() };
    let loud = engine().evaluate(&with_last(hammer())).unwrap();
    let signal = engine().evaluate(&with_last(quiet)).unwrap();

    assert!(!signal.factors().volume_confirmation);
    assert_eq!(signal.score() + 1, loud.score());
}

#[test]
fn test_bars_without_timestamp() {
    let signal = engine().evaluate(&with_last(hammer())).unwrap();
    assert_eq!(signal.timestamp(), None);
}

#[test]
fn test_candle_carries_timestamp() {
    let bars: Vec<Candle> = with_last(hammer())
        .iter()
        .enumerate()
        .map(|(i, b)| Candle::new(1_700_000_000_000 + i as i64 * 3_600_000, b.o, b.h, b.l, b.c, b.v))
        .collect();
    let signal = engine().evaluate(&bars).unwrap();
    assert_eq!(signal.timestamp(), Some(1_700_000_000_000 + 60 * 3_600_000));
}

// ============================================================
// FAILURE SEMANTICS
// ============================================================

#[test]
fn test_window_shorter_than_lookbacks() {
    let config = DetectorConfig {
        sr_lookback: 30,
        ..DetectorConfig::default()
    };
    let engine = PinbarSignalEngine::new(config).unwrap();
    let bars = make_context(29);

    assert_eq!(
        engine.evaluate(&bars).unwrap_err(),
        SignalError::InsufficientData { need: 30, got: 29 }
    );
    assert!(engine.evaluate(&make_context(30)).is_ok());
}

#[test]
fn test_empty_window() {
    let bars: Vec<TestBar> = Vec::new();
    assert!(matches!(
        engine().evaluate(&bars),
        Err(SignalError::InsufficientData { got: 0, .. })
    ));
}

#[test]
fn test_invalid_config_rejected() {
    let config = DetectorConfig {
        rsi_oversold: 70.0,
        rsi_overbought: 70.0,
        ..DetectorConfig::default()
    };
    assert!(matches!(
        PinbarSignalEngine::new(config),
        Err(SignalError::InvalidConfig(_))
    ));
    assert!(matches!(
        evaluate(&with_last(hammer()), &config),
        Err(SignalError::InvalidConfig(_))
    ));
}

#[test]
fn test_invalid_candle_does_not_poison_engine() {
    let engine = engine();
    let bad = TestBar::new(100.0, 99.0, 101.0, 100.0, 1000.0);

    assert_eq!(
        engine.evaluate(&with_last(bad)).unwrap_err(),
        SignalError::InvalidCandle {
            index: 60,
            reason: "high < low"
        }
    );
    assert!(engine.evaluate(&with_last(hammer())).is_ok());
}

#[test]
fn test_zero_range_last_bar() {
    let flat = TestBar::new(100.0, 100.0, 100.0, 100.0, 5000.0);
    let signal = engine().evaluate(&with_last(flat)).unwrap();
    assert_eq!(signal.direction(), SignalDirection::None);
    assert_eq!(signal.score(), 0);
    assert!(!signal.is_executable());
}

// ============================================================
// SERIES AND PARALLEL
// ============================================================

#[test]
fn test_scan_series() {
    let mut bars = make_context(60);
    bars.push(hammer());
    bars.extend(make_context(20));
    bars.push(shooting_star());

    let found = engine().scan(&bars);
    let summary: Vec<(usize, PinbarKind)> =
        found.iter().map(|s| (s.index, s.signal.pattern())).collect();
    assert_eq!(summary, vec![(60, PinbarKind::Hammer), (81, PinbarKind::ShootingStar)]);
}

#[test]
fn test_parallel_matches_sequential() {
    let engine = engine();
    let a = with_last(hammer());
    let b = with_last(shooting_star());
    let c = make_context(10);

    let instruments: Vec<(&str, &[TestBar])> = vec![("BTCUSDT", &a), ("ETHUSDT", &b), ("NEW", &c)];
    let (mut signals, errors) = evaluate_parallel(&engine, instruments);
    signals.sort_by(|x, y| x.symbol.cmp(&y.symbol));

    assert_eq!(signals.len(), 2);
    assert_eq!(signals[0].signal, engine.evaluate(&a).unwrap());
    assert_eq!(signals[1].signal, engine.evaluate(&b).unwrap());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].symbol, "NEW");
}

#[test]
fn test_signal_serializes() {
    let signal = engine().evaluate(&with_last(hammer())).unwrap();
    let json = serde_json::to_value(&signal).unwrap();
    assert_eq!(json["direction"], "Long");
    assert_eq!(json["score"], u64::from(signal.score()));
    assert_eq!(json["candidate"]["kind"], "Hammer");
}
