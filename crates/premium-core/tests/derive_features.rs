use premium_core::features::{bmi, AgeGroup, CityTier, DerivedFeatures, LifestyleRisk};
use premium_core::schema::{Occupation, RawInput};

fn sample() -> RawInput {
    RawInput {
        age: 34,
        weight: 82.0,
        height: 1.78,
        income: 18.2,
        smoker: false,
        city: "Seattle".into(),
        occupation: Occupation::SoftwareEngineer,
    }
}

#[test]
fn bmi_is_weight_over_height_squared() {
    for (w, h) in [(82.0, 1.78), (50.5, 1.6), (120.0, 2.01), (3.2, 0.5)] {
        let expect = w / (h * h);
        assert!((bmi(w, h) - expect).abs() < 1e-12, "w={w} h={h}");
    }
}

#[test]
fn lifestyle_risk_table() {
    assert_eq!(LifestyleRisk::classify(true, 31.0), LifestyleRisk::High);
    assert_eq!(LifestyleRisk::classify(true, 20.0), LifestyleRisk::Medium);
    assert_eq!(LifestyleRisk::classify(false, 28.0), LifestyleRisk::Medium);
    assert_eq!(LifestyleRisk::classify(false, 20.0), LifestyleRisk::Low);
}

#[test]
fn age_group_boundaries() {
    let cases = [
        (24, AgeGroup::Young),
        (25, AgeGroup::Adult),
        (44, AgeGroup::Adult),
        (45, AgeGroup::MiddleAged),
        (59, AgeGroup::MiddleAged),
        (60, AgeGroup::Senior),
    ];
    for (age, expect) in cases {
        assert_eq!(AgeGroup::from_age(age), expect, "age={age}");
    }
}

#[test]
fn city_tier_lookup_is_exact_and_case_sensitive() {
    assert_eq!(CityTier::lookup("Chicago"), CityTier::Tier1);
    assert_eq!(CityTier::lookup("Nashville"), CityTier::Tier2);
    assert_eq!(CityTier::lookup("Smalltown"), CityTier::Tier3);
    assert_eq!(CityTier::lookup("chicago"), CityTier::Tier3);
    assert_eq!(CityTier::lookup(" Chicago"), CityTier::Tier3);
}

#[test]
fn sample_input_derives_expected_record() {
    let input = sample().validate().unwrap();
    let f = DerivedFeatures::derive(&input);

    assert!((f.bmi - 25.88).abs() < 0.01, "bmi={}", f.bmi);
    assert_eq!(f.age_group, AgeGroup::Adult);
    assert_eq!(f.lifestyle_risk, LifestyleRisk::Low);
    assert_eq!(f.city_tier, CityTier::Tier1);
    assert_eq!(f.income, 18.2);
    assert_eq!(f.occupation, Occupation::SoftwareEngineer);
}

#[test]
fn derivation_is_idempotent() {
    let input = sample().validate().unwrap();
    let a = DerivedFeatures::derive(&input);
    let b = DerivedFeatures::derive(&input);
    assert_eq!(a, b);
}

#[test]
fn derived_record_serializes_with_wire_labels() {
    let input = RawInput {
        age: 50,
        smoker: true,
        weight: 100.0,
        city: "Tulsa".into(),
        ..sample()
    }
    .validate()
    .unwrap();
    let v = serde_json::to_value(DerivedFeatures::derive(&input)).unwrap();

    assert_eq!(v["age_group"], "middle_aged");
    assert_eq!(v["lifestyle_risk"], "high");
    assert_eq!(v["city_tier"], 2);
    assert_eq!(v["occupation"], "software_engineer");
}
