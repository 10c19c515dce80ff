use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const MAX_ECO_SCORE: u8 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sustainability rating in `0..=100`; higher is better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct EcoScore(u8);

impl EcoScore {
    pub const MIN: EcoScore = EcoScore(0);
    pub const MAX: EcoScore = EcoScore(MAX_ECO_SCORE);

    pub fn new(value: u16) -> Result<Self, DomainError> {
        if value > u16::from(MAX_ECO_SCORE) {
            return Err(DomainError::EcoScoreOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// True when `self` beats `baseline` by strictly more than `margin` points.
    pub fn exceeds_by(self, baseline: EcoScore, margin: u8) -> bool {
        u16::from(self.0) > u16::from(baseline.0) + u16::from(margin)
    }

    pub fn grade(self) -> EcoGrade {
        EcoGrade::from_score(self)
    }
}

impl TryFrom<u16> for EcoScore {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EcoScore> for u16 {
    fn from(score: EcoScore) -> Self {
        u16::from(score.0)
    }
}

impl fmt::Display for EcoScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcoGrade {
    A,
    B,
    C,
    D,
    E,
}

impl EcoGrade {
    pub fn from_score(score: EcoScore) -> Self {
        match score.value() {
            75.. => EcoGrade::A,
            65..=74 => EcoGrade::B,
            50..=64 => EcoGrade::C,
            30..=49 => EcoGrade::D,
            _ => EcoGrade::E,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EcoGrade::A => "Excellent",
            EcoGrade::B => "Good",
            EcoGrade::C => "Moderate",
            EcoGrade::D => "Poor",
            EcoGrade::E => "Bad",
        }
    }
}

/// Resource figures behind an eco-score. Every numeric field is optional; consumers fall back to
/// configured constants when one is absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    /// Liters of water.
    pub water: Option<f64>,
    /// Kilograms of CO₂.
    pub carbon: Option<f64>,
    pub recyclability_percent: Option<f64>,
    pub packaging: Option<String>,
    #[serde(default)]
    pub certifications: BTreeSet<String>,
    pub eco_tip: Option<String>,
}

/// Output of the external eco-score service for one product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EcoAssessment {
    pub score: EcoScore,
    pub breakdown: Option<Breakdown>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub material: String,
    #[serde(default)]
    pub packaging: String,
    pub eco_score: EcoScore,
    pub breakdown: Option<Breakdown>,
    #[serde(default)]
    pub certifications: BTreeSet<String>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        brand: impl Into<String>,
        material: impl Into<String>,
        eco_score: EcoScore,
    ) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            brand: brand.into(),
            material: material.into(),
            packaging: String::new(),
            eco_score,
            breakdown: None,
            certifications: BTreeSet::new(),
        }
    }

    pub fn with_breakdown(mut self, breakdown: Breakdown) -> Self {
        self.breakdown = Some(breakdown);
        self
    }

    pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
        self.packaging = packaging.into();
        self
    }

    pub fn with_certifications<I, S>(mut self, certifications: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.certifications = certifications.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the stored score and breakdown with a fresh assessment.
    pub fn apply_assessment(mut self, assessment: EcoAssessment) -> Self {
        self.eco_score = assessment.score;
        self.breakdown = assessment.breakdown;
        self
    }

    /// `name material brand`, the same field order the catalog index uses for its keys.
    pub fn search_text(&self) -> String {
        [self.name.as_str(), self.material.as_str(), self.brand.as_str()].join(" ")
    }

    pub fn carbon_kg(&self) -> Option<f64> {
        self.breakdown.as_ref().and_then(|breakdown| breakdown.carbon)
    }

    pub fn water_liters(&self) -> Option<f64> {
        self.breakdown.as_ref().and_then(|breakdown| breakdown.water)
    }
}
