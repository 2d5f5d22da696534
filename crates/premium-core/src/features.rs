//! Derived features: the exact record the premium model was trained on.
//!
//! Every rule here is a pure function of a validated request. The same input
//! always yields the same `DerivedFeatures`.

use crate::schema::{Occupation, ValidInput};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

pub const TIER_1_CITIES: [&str; 21] = [
    "New York",
    "Los Angeles",
    "Chicago",
    "Houston",
    "Phoenix",
    "Philadelphia",
    "San Antonio",
    "San Diego",
    "Dallas",
    "San Jose",
    "Austin",
    "Jacksonville",
    "Fort Worth",
    "Columbus",
    "Charlotte",
    "San Francisco",
    "Indianapolis",
    "Seattle",
    "Denver",
    "Washington",
    "Boston",
];

pub const TIER_2_CITIES: [&str; 44] = [
    "Nashville",
    "El Paso",
    "Detroit",
    "Oklahoma City",
    "Portland",
    "Las Vegas",
    "Memphis",
    "Louisville",
    "Baltimore",
    "Milwaukee",
    "Albuquerque",
    "Tucson",
    "Fresno",
    "Sacramento",
    "Mesa",
    "Kansas City",
    "Atlanta",
    "Omaha",
    "Colorado Springs",
    "Raleigh",
    "Miami",
    "Long Beach",
    "Virginia Beach",
    "Oakland",
    "Minneapolis",
    "Tulsa",
    "Arlington",
    "Tampa",
    "New Orleans",
    "Wichita",
    "Cleveland",
    "Bakersfield",
    "Aurora",
    "Anaheim",
    "Honolulu",
    "Henderson",
    "Riverside",
    "Corpus Christi",
    "Lexington",
    "Stockton",
    "Hialeah",
    "Anchorage",
    "Plano",
    "Greensboro",
];

static TIER_1: OnceLock<HashSet<&'static str>> = OnceLock::new();
static TIER_2: OnceLock<HashSet<&'static str>> = OnceLock::new();

fn tier_1() -> &'static HashSet<&'static str> {
    TIER_1.get_or_init(|| TIER_1_CITIES.into_iter().collect())
}

fn tier_2() -> &'static HashSet<&'static str> {
    TIER_2.get_or_init(|| TIER_2_CITIES.into_iter().collect())
}

#[inline]
pub fn bmi(weight: f64, height: f64) -> f64 {
    weight / (height * height)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifestyleRisk {
    Low,
    Medium,
    High,
}

impl LifestyleRisk {
    /// Smoking alone is enough for `Medium`; `High` needs smoking and bmi > 30.
    pub fn classify(smoker: bool, bmi: f64) -> Self {
        if smoker && bmi > 30.0 {
            LifestyleRisk::High
        } else if smoker || bmi > 27.0 {
            LifestyleRisk::Medium
        } else {
            LifestyleRisk::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifestyleRisk::Low => "low",
            LifestyleRisk::Medium => "medium",
            LifestyleRisk::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Young,
    Adult,
    MiddleAged,
    Senior,
}

impl AgeGroup {
    pub fn from_age(age: i64) -> Self {
        if age < 25 {
            AgeGroup::Young
        } else if age < 45 {
            AgeGroup::Adult
        } else if age < 60 {
            AgeGroup::MiddleAged
        } else {
            AgeGroup::Senior
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Young => "young",
            AgeGroup::Adult => "adult",
            AgeGroup::MiddleAged => "middle_aged",
            AgeGroup::Senior => "senior",
        }
    }
}

/// Serialized as the bare integer 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CityTier {
    Tier1,
    Tier2,
    Tier3,
}

impl CityTier {
    /// Exact, case-sensitive set membership. Unknown cities are tier 3.
    pub fn lookup(city: &str) -> Self {
        if tier_1().contains(city) {
            CityTier::Tier1
        } else if tier_2().contains(city) {
            CityTier::Tier2
        } else {
            CityTier::Tier3
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            CityTier::Tier1 => 1,
            CityTier::Tier2 => 2,
            CityTier::Tier3 => 3,
        }
    }
}

impl From<CityTier> for u8 {
    fn from(t: CityTier) -> u8 {
        t.as_u8()
    }
}

impl TryFrom<u8> for CityTier {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(CityTier::Tier1),
            2 => Ok(CityTier::Tier2),
            3 => Ok(CityTier::Tier3),
            other => Err(format!("city tier must be 1, 2 or 3, got {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub bmi: f64,
    pub lifestyle_risk: LifestyleRisk,
    pub age_group: AgeGroup,
    pub city_tier: CityTier,
    pub income: f64,
    pub occupation: Occupation,
}

impl DerivedFeatures {
    pub fn derive(input: &ValidInput) -> Self {
        let bmi = bmi(input.weight, input.height);
        Self {
            bmi,
            lifestyle_risk: LifestyleRisk::classify(input.smoker, bmi),
            age_group: AgeGroup::from_age(input.age),
            city_tier: CityTier::lookup(&input.city),
            income: input.income,
            occupation: input.occupation,
        }
    }

    pub fn value(&self, column: FeatureColumn) -> ColumnValue {
        match column {
            FeatureColumn::Bmi => ColumnValue::Number(self.bmi),
            FeatureColumn::AgeGroup => ColumnValue::Category(self.age_group.as_str()),
            FeatureColumn::LifestyleRisk => ColumnValue::Category(self.lifestyle_risk.as_str()),
            FeatureColumn::CityTier => ColumnValue::Number(f64::from(self.city_tier.as_u8())),
            FeatureColumn::Income => ColumnValue::Number(self.income),
            FeatureColumn::Occupation => ColumnValue::Category(self.occupation.as_str()),
        }
    }
}

/// The six columns of the single-row record handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    Bmi,
    AgeGroup,
    LifestyleRisk,
    CityTier,
    Income,
    Occupation,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 6] = [
        FeatureColumn::Bmi,
        FeatureColumn::AgeGroup,
        FeatureColumn::LifestyleRisk,
        FeatureColumn::CityTier,
        FeatureColumn::Income,
        FeatureColumn::Occupation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::Bmi => "bmi",
            FeatureColumn::AgeGroup => "age_group",
            FeatureColumn::LifestyleRisk => "lifestyle_risk",
            FeatureColumn::CityTier => "city_tier",
            FeatureColumn::Income => "income",
            FeatureColumn::Occupation => "occupation",
        }
    }

    /// Artifacts trained on the LPA dataset call the income column `income_lpa`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "income_lpa" => Some(FeatureColumn::Income),
            _ => FeatureColumn::ALL.into_iter().find(|c| c.name() == name),
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FeatureColumn::Bmi | FeatureColumn::CityTier | FeatureColumn::Income
        )
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnValue {
    Number(f64),
    Category(&'static str),
}
