//! Subscription tiers and the capability table every endpoint consults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Team,
}

/// Tier-gated product features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// No daily generation cap.
    UnlimitedGenerations,
    /// Viral-optimization block in caption prompts.
    ViralOptimization,
    BrandVoice,
    CompetitorResearch,
    Scheduling,
    /// Declared for the team plan; no behaviour beyond the label yet.
    TeamSeats,
    SharedLibrary,
}

const PAID_FEATURES: &[Feature] = &[
    Feature::UnlimitedGenerations,
    Feature::ViralOptimization,
    Feature::BrandVoice,
    Feature::CompetitorResearch,
    Feature::Scheduling,
];

const TEAM_FEATURES: &[Feature] = &[
    Feature::UnlimitedGenerations,
    Feature::ViralOptimization,
    Feature::BrandVoice,
    Feature::CompetitorResearch,
    Feature::Scheduling,
    Feature::TeamSeats,
    Feature::SharedLibrary,
];

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Team => "team",
        }
    }

    /// The declarative tier → feature table.
    pub const fn capabilities(&self) -> &'static [Feature] {
        match self {
            Tier::Free => &[],
            Tier::Pro => PAID_FEATURES,
            Tier::Team => TEAM_FEATURES,
        }
    }

    pub fn allows(&self, feature: Feature) -> bool {
        self.capabilities().contains(&feature)
    }
}

impl Feature {
    fn upgrade_message(&self) -> &'static str {
        match self {
            Feature::UnlimitedGenerations => "Upgrade to Pro for unlimited captions.",
            Feature::ViralOptimization => "Viral optimization is a Pro feature. Upgrade to unlock.",
            Feature::BrandVoice => "Brand voice training requires Pro subscription",
            Feature::CompetitorResearch => "Competitor Analysis is a Pro feature. Upgrade to unlock.",
            Feature::Scheduling => "Social Scheduling is a Pro feature. Upgrade to unlock.",
            Feature::TeamSeats | Feature::SharedLibrary => {
                "This feature requires a Team subscription."
            }
        }
    }
}

/// Shared authorization step: `Ok` if the tier includes `feature`.
pub fn require(tier: Tier, feature: Feature) -> Result<(), AppError> {
    if tier.allows(feature) {
        Ok(())
    } else {
        Err(AppError::UpgradeRequired(feature.upgrade_message().to_string()))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "team" => Ok(Tier::Team),
            other => Err(format!("invalid tier: {other}")),
        }
    }
}
