//! Tests for the built-in distance metrics.

use crate::distance::{
    cosine_distance, cosine_normalized_distance, normalize_in_place, DistanceMetric,
};

#[test]
fn test_cosine_reference_value() {
    let a = [0.448_195_98, 0.268_752_41, 0.021_644_49, 0.338_029_39, 0.248_201_9];
    let b = [0.994_484_02, 0.292_696_15, 0.985_861_98, 0.574_827_37, 0.129_947_58];

    let dist = cosine_distance(&a, &b);
    assert!(
        (dist - 0.255_461_37).abs() < 1e-6,
        "cosine distance drifted: {dist}"
    );
}

#[test]
fn test_cosine_normalized_reference_value() {
    // Inputs are not unit length on purpose: the metric trusts the caller.
    let a = [0.344_865_3, 0.461_270_5, 0.791_913_67, 0.057_099, 0.194_704_66];
    let b = [0.392_335_33, 0.376_183_26, 0.128_946_95, 0.504_112_72, 0.658_636_62];

    let dist = DistanceMetric::CosineNormalized.distance(&a, &b);
    assert!(
        (dist - 0.432_036_12).abs() < 1e-6,
        "cosine-normalized distance drifted: {dist}"
    );
}

#[test]
fn test_cosine_matches_angle() {
    for degrees in [0.0_f32, 15.0, 45.0, 90.0, 135.0, 180.0] {
        let theta = degrees.to_radians();
        let a = [1.0, 0.0];
        let b = [theta.cos(), theta.sin()];

        let expected = 1.0 - theta.cos();
        assert!((cosine_distance(&a, &b) - expected).abs() < 1e-6);
        assert!((cosine_normalized_distance(&a, &b) - expected).abs() < 1e-6);
    }
}

#[test]
fn test_cosine_is_commutative() {
    let a = [0.1, -0.4, 2.5, 0.0];
    let b = [1.5, 0.3, -0.2, 0.9];
    assert!((cosine_distance(&a, &b) - cosine_distance(&b, &a)).abs() < f32::EPSILON);
}

#[test]
fn test_cosine_zero_vector() {
    assert!((cosine_distance(&[0.0, 0.0], &[1.0, 2.0]) - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_cosine_ignores_magnitude() {
    let a = [1.0, 2.0, 3.0];
    let b = [10.0, 20.0, 30.0];
    assert!(cosine_distance(&a, &b).abs() < 1e-6);
}

#[test]
#[should_panic(expected = "Vector dimensions must match")]
fn test_length_mismatch_fails_fast() {
    let _ = cosine_distance(&[1.0, 0.0], &[1.0, 0.0, 0.0]);
}

#[test]
fn test_metric_ids_round_trip() {
    for metric in [DistanceMetric::Cosine, DistanceMetric::CosineNormalized] {
        assert_eq!(metric.id().parse::<DistanceMetric>(), Ok(metric));
    }
    assert!("l2".parse::<DistanceMetric>().is_err());
}

#[test]
fn test_metric_serde_uses_ids() {
    let json = serde_json::to_string(&DistanceMetric::CosineNormalized).unwrap();
    assert_eq!(json, "\"cosine-normalized\"");
}

#[test]
fn test_normalize_in_place() {
    let mut v = vec![3.0, 4.0];
    normalize_in_place(&mut v);
    assert!((v[0] - 0.6).abs() < 1e-6);
    assert!((v[1] - 0.8).abs() < 1e-6);

    let mut zero = vec![0.0, 0.0];
    normalize_in_place(&mut zero);
    assert_eq!(zero, vec![0.0, 0.0]);
}
