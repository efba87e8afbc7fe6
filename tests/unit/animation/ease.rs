use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in Ease::ALL {
        assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
        assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
    }
}

#[test]
fn non_decreasing_on_samples() {
    for ease in Ease::ALL {
        let mut prev = ease.apply(0.0);
        for i in 1..=200 {
            let v = ease.apply(i as f64 / 200.0);
            assert!(v >= prev, "{ease:?} decreased at sample {i}");
            assert!((0.0..=1.0).contains(&v));
            prev = v;
        }
    }
}

#[test]
fn out_of_range_input_is_clamped() {
    for ease in Ease::ALL {
        assert_eq!(ease.apply(-3.0), 0.0);
        assert_eq!(ease.apply(7.5), 1.0);
        assert_eq!(ease.apply(f64::NAN), 0.0);
    }
}

#[test]
fn unknown_names_fall_back_to_linear() {
    assert_eq!(Ease::from_name("bounce"), Ease::Linear);
    assert_eq!(Ease::from_name(""), Ease::Linear);
    assert_eq!(Ease::from_name("easeInOutCubic"), Ease::InOutCubic);
    assert_eq!(Ease::from_name("in-out-quad"), Ease::InOutQuad);
    assert_eq!(Ease::from_name("out_cubic"), Ease::OutCubic);
    for ease in Ease::ALL {
        assert_eq!(Ease::from_name(ease.name()), ease);
    }
}

#[test]
fn serde_uses_camel_case_names() {
    let json = serde_json::to_string(&Ease::InOutQuad).unwrap();
    assert_eq!(json, "\"inOutQuad\"");
    let back: Ease = serde_json::from_str("\"outCubic\"").unwrap();
    assert_eq!(back, Ease::OutCubic);
}
