use crate::error::ValidationError;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Occupation labels the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    SoftwareEngineer,
    Teacher,
    Nurse,
    Driver,
    SalesExecutive,
    ConstructionWorker,
    Chef,
    Artist,
    DataScientist,
    Lawyer,
    Doctor,
    Accountant,
    Electrician,
    Mechanic,
    RetailStaff,
    Student,
    Unemployed,
    BusinessOwner,
    Freelancer,
    GovernmentJob,
    PrivateJob,
    Retired,
    Researcher,
    WarehouseWorker,
    SecurityGuard,
}

impl Occupation {
    pub const ALL: [Occupation; 25] = [
        Occupation::SoftwareEngineer,
        Occupation::Teacher,
        Occupation::Nurse,
        Occupation::Driver,
        Occupation::SalesExecutive,
        Occupation::ConstructionWorker,
        Occupation::Chef,
        Occupation::Artist,
        Occupation::DataScientist,
        Occupation::Lawyer,
        Occupation::Doctor,
        Occupation::Accountant,
        Occupation::Electrician,
        Occupation::Mechanic,
        Occupation::RetailStaff,
        Occupation::Student,
        Occupation::Unemployed,
        Occupation::BusinessOwner,
        Occupation::Freelancer,
        Occupation::GovernmentJob,
        Occupation::PrivateJob,
        Occupation::Retired,
        Occupation::Researcher,
        Occupation::WarehouseWorker,
        Occupation::SecurityGuard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Occupation::SoftwareEngineer => "software_engineer",
            Occupation::Teacher => "teacher",
            Occupation::Nurse => "nurse",
            Occupation::Driver => "driver",
            Occupation::SalesExecutive => "sales_executive",
            Occupation::ConstructionWorker => "construction_worker",
            Occupation::Chef => "chef",
            Occupation::Artist => "artist",
            Occupation::DataScientist => "data_scientist",
            Occupation::Lawyer => "lawyer",
            Occupation::Doctor => "doctor",
            Occupation::Accountant => "accountant",
            Occupation::Electrician => "electrician",
            Occupation::Mechanic => "mechanic",
            Occupation::RetailStaff => "retail_staff",
            Occupation::Student => "student",
            Occupation::Unemployed => "unemployed",
            Occupation::BusinessOwner => "business_owner",
            Occupation::Freelancer => "freelancer",
            Occupation::GovernmentJob => "government_job",
            Occupation::PrivateJob => "private_job",
            Occupation::Retired => "retired",
            Occupation::Researcher => "researcher",
            Occupation::WarehouseWorker => "warehouse_worker",
            Occupation::SecurityGuard => "security_guard",
        }
    }
}

impl fmt::Display for Occupation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Occupation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Occupation::ALL
            .iter()
            .copied()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| format!("unknown occupation '{s}'"))
    }
}

/// Request body of `/predict` and `/predict_proba`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// Age in years. `34.0` is read as `34`.
    #[serde(deserialize_with = "whole_number")]
    pub age: i64,
    /// Weight in kg.
    pub weight: f64,
    /// Height in meters.
    pub height: f64,
    /// Annual income (LPA in the training data).
    #[serde(alias = "income_lpa")]
    pub income: f64,
    pub smoker: bool,
    pub city: String,
    pub occupation: Occupation,
}

impl RawInput {
    /// Range checks in field order; the first violation wins.
    pub fn validate(self) -> Result<ValidInput, ValidationError> {
        if self.age <= 0 || self.age >= 120 {
            return Err(ValidationError::AgeOutOfRange(self.age));
        }
        positive("weight", self.weight)?;
        if !self.height.is_finite() {
            return Err(ValidationError::NotFinite { field: "height" });
        }
        if self.height <= 0.0 || self.height >= 2.5 {
            return Err(ValidationError::HeightOutOfRange(self.height));
        }
        positive("income", self.income)?;
        Ok(ValidInput { inner: self })
    }
}

/// Integer from a JSON number, accepting floats with no fractional part.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct WholeNumber;

    impl Visitor<'_> for WholeNumber {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
            if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }
    }

    deserializer.deserialize_any(WholeNumber)
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}

/// A `RawInput` that passed `RawInput::validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidInput {
    inner: RawInput,
}

impl Deref for ValidInput {
    type Target = RawInput;

    fn deref(&self) -> &RawInput {
        &self.inner
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbaResponse {
    pub classes: Vec<String>,
    pub proba: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn sample_is_valid() {
        let v = sample().validate().unwrap();
        assert_eq!(v.city, "Seattle");
    }

    #[test]
    fn age_bounds_are_exclusive() {
        for age in [0, 120, -3] {
            let err = RawInput { age, ..sample() }.validate().unwrap_err();
            assert_eq!(err, ValidationError::AgeOutOfRange(age));
        }
        assert!(RawInput { age: 1, ..sample() }.validate().is_ok());
        assert!(RawInput { age: 119, ..sample() }.validate().is_ok());
    }

    #[test]
    fn height_bounds_are_exclusive() {
        let err = RawInput { height: 2.5, ..sample() }.validate().unwrap_err();
        assert_eq!(err.field(), "height");
        let err = RawInput { height: 0.0, ..sample() }.validate().unwrap_err();
        assert_eq!(err.field(), "height");
    }

    #[test]
    fn non_positive_weight_and_income() {
        let err = RawInput { weight: 0.0, ..sample() }.validate().unwrap_err();
        assert_eq!(err.field(), "weight");
        let err = RawInput { income: -1.0, ..sample() }.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotPositive {
                field: "income",
                value: -1.0
            }
        );
    }

    #[test]
    fn infinite_weight_is_rejected() {
        let err = RawInput { weight: f64::INFINITY, ..sample() }.validate().unwrap_err();
        assert_eq!(err, ValidationError::NotFinite { field: "weight" });
    }

    #[test]
    fn income_lpa_alias_is_accepted() {
        let body = r#"{"age":34,"weight":82,"height":1.78,"income_lpa":18.2,
            "smoker":false,"city":"Seattle","occupation":"software_engineer"}"#;
        let raw: RawInput = serde_json::from_str(body).unwrap();
        assert_eq!(raw, sample());
    }

    #[test]
    fn whole_float_age_is_accepted() {
        let body = r#"{"age":34.0,"weight":82,"height":1.78,"income":18.2,
            "smoker":false,"city":"Seattle","occupation":"software_engineer"}"#;
        let raw: RawInput = serde_json::from_str(body).unwrap();
        assert_eq!(raw, sample());
    }

    #[test]
    fn fractional_or_non_numeric_age_fails_to_parse() {
        for age in ["34.5", "\"34\"", "1e300", "true"] {
            let body = format!(
                r#"{{"age":{age},"weight":82,"height":1.78,"income":18.2,
                "smoker":false,"city":"Seattle","occupation":"software_engineer"}}"#
            );
            let err = serde_json::from_str::<RawInput>(&body).unwrap_err();
            assert!(err.to_string().contains("whole number"), "{age}: {err}");
        }
    }

    #[test]
    fn unknown_occupation_fails_to_parse() {
        let body = r#"{"age":34,"weight":82,"height":1.78,"income":18.2,
            "smoker":false,"city":"Seattle","occupation":"astronaut"}"#;
        assert!(serde_json::from_str::<RawInput>(body).is_err());
        assert!("astronaut".parse::<Occupation>().is_err());
    }

    #[test]
    fn occupation_labels_match_wire_names() {
        assert_eq!(Occupation::ALL.len(), 25);
        for o in Occupation::ALL {
            let wire = serde_json::to_value(o).unwrap();
            assert_eq!(wire, serde_json::Value::String(o.as_str().to_string()));
        }
    }
}
