use cryotherm_core::conversion::curves::{
    c100_temperature, mobile_bm_temperature, nico_cal_temperature, pt100_temperature,
    ForwardCurve, Pt100Curve,
};
use cryotherm_core::conversion::spline::DEFAULT_BOUNDARY_TOLERANCE;
use cryotherm_core::conversion::{
    CalibrationSpec, ConversionError, ConversionSettings, ProbeRegistry, ProbeType, RootFinder,
    SplineTable,
};

fn registry() -> ProbeRegistry {
    ProbeRegistry::standard(&ConversionSettings::default()).unwrap()
}

fn same(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[test]
fn test_mobile_bt_cold_branch_round_trip() {
    let reg = registry();
    let bt = ForwardCurve::mobile_bt();
    for t in [0.002, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 40.0, 60.0, 69.0] {
        let back = reg
            .convert_one(bt.resistance_of(t), ProbeType::MobileBt, false)
            .unwrap();
        assert!((back - t).abs() < 0.25, "T={} -> {}", t, back);
    }
}

#[test]
fn test_mobile_bt_warm_branch_knots() {
    let reg = registry();
    let bt = ForwardCurve::mobile_bt();
    for t in [100.0, 300.0, 1000.0] {
        let back = reg
            .convert_one(bt.resistance_of(t), "Mobile BT", true)
            .unwrap();
        assert!((back - t).abs() < 1e-6, "T={} -> {}", t, back);
    }
    // The stock coefficients are a coarse fit between knots (about 7 K off)
    for t in [80.0, 150.0, 200.0, 500.0, 800.0] {
        let back = reg
            .convert_one(bt.resistance_of(t), "Mobile BT", true)
            .unwrap();
        assert!((back - t).abs() < 8.0, "T={} -> {}", t, back);
    }
}

#[test]
fn test_mobile_bt_outside_table() {
    let reg = registry();
    // Below the curve minimum
    assert!(reg.convert_one(120.0, ProbeType::MobileBt, true).unwrap().is_nan());
    assert!(reg.convert_one(120.0, ProbeType::MobileBt, false).unwrap().is_nan());
    // Beyond the last segment of each branch
    assert_eq!(reg.convert_one(5000.0, ProbeType::MobileBt, true).unwrap(), 1e4);
    assert_eq!(reg.convert_one(1e5, ProbeType::MobileBt, false).unwrap(), 1e-3);
}

#[test]
fn test_spline_lower_bound_is_constant_term() {
    let table = SplineTable::mobile_bt(DEFAULT_BOUNDARY_TOLERANCE).unwrap();
    for above in [true, false] {
        for seg in table.segments(above) {
            assert_eq!(table.invert(seg.lower, above), seg.coefficients[0]);
        }
    }
}

#[test]
fn test_spline_segments_contiguous() {
    let table = SplineTable::mobile_bt(DEFAULT_BOUNDARY_TOLERANCE).unwrap();
    for above in [true, false] {
        for pair in table.segments(above).windows(2) {
            assert!((pair[1].lower - pair[0].upper).abs() <= DEFAULT_BOUNDARY_TOLERANCE);
        }
    }
}

#[test]
fn test_mobile_ht_both_branches() {
    let reg = registry();
    let ht = ForwardCurve::mobile_ht();
    for t in [100.0, 150.0, 200.0, 250.0, 300.0, 400.0] {
        let back = reg.convert_one(ht.resistance_of(t), ProbeType::MobileHt, true).unwrap();
        assert!((back - t).abs() < 1e-6, "T={} -> {}", t, back);
    }
    for t in [2.0, 3.0, 4.0, 5.0, 10.0, 20.0, 50.0, 69.0] {
        let back = reg.convert_one(ht.resistance_of(t), ProbeType::MobileHt, false).unwrap();
        assert!((back - t).abs() < 1e-6, "T={} -> {}", t, back);
    }
}

#[test]
fn test_mobile_bt_by_root_finding() {
    let reg = ProbeRegistry::empty(&ConversionSettings::default())
        .with_spec(ProbeType::MobileBt, CalibrationSpec::mobile_bt_root());
    let bt = ForwardCurve::mobile_bt();
    for t in [0.05, 1.0, 5.0] {
        let back = reg.convert_one(bt.resistance_of(t), ProbeType::MobileBt, false).unwrap();
        assert!((back - t).abs() < 1e-6, "T={} -> {}", t, back);
    }
    for t in [100.0, 200.0, 300.0] {
        let back = reg.convert_one(bt.resistance_of(t), ProbeType::MobileBt, true).unwrap();
        assert!((back - t).abs() < 1e-6, "T={} -> {}", t, back);
    }
}

#[test]
fn test_root_failure_uses_fallback() {
    let settings = ConversionSettings {
        fallback_temperature: 123.0,
        ..ConversionSettings::default()
    };
    let reg = ProbeRegistry::standard(&settings).unwrap();
    assert_eq!(reg.convert_one(-100.0, ProbeType::MobileHt, true).unwrap(), 123.0);
    assert_eq!(reg.convert_one(-100.0, ProbeType::MobileHt, false).unwrap(), 123.0);
}

#[test]
fn test_tight_budget_fails_over() {
    let settings = ConversionSettings {
        solver: RootFinder {
            max_iterations: 1,
            ..RootFinder::default()
        },
        ..ConversionSettings::default()
    };
    let reg = ProbeRegistry::standard(&settings).unwrap();
    let r = ForwardCurve::mobile_ht().resistance_of(300.0);
    assert_eq!(reg.convert_one(r, ProbeType::MobileHt, true).unwrap(), 500.0);
}

#[test]
fn test_batch_equals_scalar() {
    let reg = registry();
    let resistances = [100.0, 137.5, 150.0, 300.0, 1234.5, 5000.0, 20000.0, 1e5, -5.0];
    for t in ProbeType::ALL {
        for above in [true, false] {
            let many = reg.convert_many(&resistances, t, above).unwrap();
            assert_eq!(many.len(), resistances.len());
            for (r, m) in resistances.iter().zip(&many) {
                let one = reg.convert_one(*r, t, above).unwrap();
                assert!(same(one, *m), "{} R={}: {} vs {}", t, r, one, m);
            }
        }
    }
}

#[test]
fn test_batch_elements_independent() {
    let reg = registry();
    let ht = ForwardCurve::mobile_ht();
    let bt = ForwardCurve::mobile_bt();

    // In range, no root, in range
    let batch = [ht.resistance_of(150.0), -100.0, ht.resistance_of(300.0)];
    let temps = reg.convert_many(&batch, ProbeType::MobileHt, true).unwrap();
    assert!((temps[0] - 150.0).abs() < 1e-6);
    assert_eq!(temps[1], 500.0);
    assert!((temps[2] - 300.0).abs() < 1e-6);

    // In range, below the table, above the table, in range
    let batch = [bt.resistance_of(100.0), 120.0, 5000.0, bt.resistance_of(300.0)];
    let temps = reg.convert_many(&batch, ProbeType::MobileBt, true).unwrap();
    assert!((temps[0] - 100.0).abs() < 1e-6);
    assert!(temps[1].is_nan());
    assert_eq!(temps[2], 1e4);
    assert!((temps[3] - 300.0).abs() < 1e-6);

    for (t, above) in [(ProbeType::MobileHt, true), (ProbeType::MobileHt, false), (ProbeType::MobileBt, false)] {
        let mixed = [ht.resistance_of(5.0), 120.0, 1e7, -100.0, bt.resistance_of(0.1)];
        let many = reg.convert_many(&mixed, t, above).unwrap();
        for (r, m) in mixed.iter().zip(&many) {
            let one = reg.convert_one(*r, t, above).unwrap();
            assert!(same(one, *m), "{} R={}: {} vs {}", t, r, one, m);
        }
    }
}

/// Resistance span each probe type is calibrated over
fn valid_range(t: ProbeType) -> (f64, f64) {
    match t {
        ProbeType::MobileBt | ProbeType::MobileHt => (50.0, 1e6),
        ProbeType::Pt100 => (18.0, 400.0),
        ProbeType::MobileBm => (117.0, 1e6),
        ProbeType::NicoBtCal | ProbeType::NicoBt => (1.0, 1e6),
    }
}

#[test]
fn test_finite_over_valid_range() {
    let reg = registry();
    let bt_floor = ForwardCurve::mobile_bt().resistance_of(70.0);
    for t in ProbeType::ALL {
        let (low, high) = valid_range(t);
        let ratio = (high / low).ln();
        let sweep: Vec<f64> = (0..=2000)
            .map(|i| low * (ratio * f64::from(i) / 2000.0).exp())
            .collect();
        for above in [true, false] {
            let temps = reg.convert_many(&sweep, t, above).unwrap();
            for (r, temp) in sweep.iter().zip(&temps) {
                if t == ProbeType::MobileBt && *r < bt_floor {
                    assert!(temp.is_nan(), "{} R={} gave {}", t, r, temp);
                } else {
                    assert!(temp.is_finite(), "{} R={} above={} gave {}", t, r, above, temp);
                }
            }
        }
    }
}

#[test]
fn test_empty_batch() {
    let reg = registry();
    assert!(reg.convert_many(&[], "PT100", false).unwrap().is_empty());
}

#[test]
fn test_unknown_probe_type() {
    let reg = registry();
    assert_eq!(
        reg.convert_one(100.0, "Bogus", false),
        Err(ConversionError::UnknownProbeType("Bogus".to_string()))
    );
    assert!(matches!(
        reg.convert_many(&[100.0], "Bogus", true),
        Err(ConversionError::UnknownProbeType(_))
    ));
}

#[test]
fn test_pt100_pair_consistent() {
    let forward = Pt100Curve::default();
    for t in [80.0, 100.0, 150.0, 200.0, 273.15, 300.0] {
        let back = pt100_temperature(forward.resistance_of(t));
        assert!((back - t).abs() < 1.0, "T={} -> {}", t, back);
    }
    assert!((pt100_temperature(100.0) - 275.72823).abs() < 1e-6);
}

#[test]
fn test_monotonic_closed_forms() {
    let increasing = |f: fn(f64) -> f64, rs: &[f64]| rs.windows(2).all(|w| f(w[1]) > f(w[0]));
    let decreasing = |f: fn(f64) -> f64, rs: &[f64]| rs.windows(2).all(|w| f(w[1]) < f(w[0]));

    let pt: Vec<f64> = (0..200).map(|i| 20.0 + f64::from(i)).collect();
    assert!(increasing(pt100_temperature, &pt));

    let bm: Vec<f64> = (0..1990).map(|i| 120.0 + 10.0 * f64::from(i)).collect();
    assert!(decreasing(mobile_bm_temperature, &bm));

    let nico: Vec<f64> = (0..2000).map(|i| 1000.5 + 10.0 * f64::from(i)).collect();
    assert!(decreasing(nico_cal_temperature, &nico));

    let c100: Vec<f64> = (0..100).map(|i| 90.0 + 50.0 * f64::from(i)).collect();
    assert!(decreasing(c100_temperature, &c100));
}

#[test]
fn test_regime_flag_only_for_mobile_probes() {
    let flagged: Vec<_> = ProbeType::SELECTABLE
        .into_iter()
        .filter(|t| t.uses_regime_flag())
        .collect();
    assert_eq!(flagged, vec![ProbeType::MobileBt, ProbeType::MobileHt]);
}

#[test]
fn test_nico_legacy_name_accepted() {
    let reg = registry();
    assert!(!ProbeType::SELECTABLE.contains(&ProbeType::NicoBt));
    let t = reg.convert_one(500.0, "NICO BT", false).unwrap();
    assert!((t - 11.374712936252575).abs() < 1e-9);
}
