//! Chance Tiers
//!
//! Named probability buckets that decide whether an offer makes it into a
//! vendor's stock, and the gate that evaluates them.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Probability bucket for an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChanceTier {
    #[default]
    Always,
    Common,
    Normal,
    Rare,
    VeryRare,
}

impl ChanceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChanceTier::Always => "always",
            ChanceTier::Common => "common",
            ChanceTier::Normal => "normal",
            ChanceTier::Rare => "rare",
            ChanceTier::VeryRare => "very_rare",
        }
    }
}

/// Server-wide inclusion probabilities, one per non-`Always` tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChanceTable {
    pub common: f64,
    pub normal: f64,
    pub rare: f64,
    pub very_rare: f64,
}

impl Default for ChanceTable {
    fn default() -> Self {
        Self {
            common: 0.75,
            normal: 0.5,
            rare: 0.2,
            very_rare: 0.05,
        }
    }
}

impl ChanceTable {
    /// Inclusion probability for a tier
    pub fn probability(&self, tier: ChanceTier) -> f64 {
        match tier {
            ChanceTier::Always => 1.0,
            ChanceTier::Common => self.common,
            ChanceTier::Normal => self.normal,
            ChanceTier::Rare => self.rare,
            ChanceTier::VeryRare => self.very_rare,
        }
    }

    /// First tier whose probability lies outside `[0, 1]`, if any
    pub fn invalid_tier(&self) -> Option<(ChanceTier, f64)> {
        [
            ChanceTier::Common,
            ChanceTier::Normal,
            ChanceTier::Rare,
            ChanceTier::VeryRare,
        ]
        .into_iter()
        .map(|tier| (tier, self.probability(tier)))
        .find(|(_, p)| !(0.0..=1.0).contains(p))
    }
}

/// Decides whether an offer of a given tier is stocked this time around
pub trait ChanceGate {
    fn included(&self, tier: ChanceTier, rng: &mut dyn RngCore) -> bool;
}

impl ChanceGate for ChanceTable {
    fn included(&self, tier: ChanceTier, rng: &mut dyn RngCore) -> bool {
        // Always never touches the RNG so fixed offers cannot shift later draws
        if tier == ChanceTier::Always {
            return true;
        }
        rng.gen_range(0.0..1.0) < self.probability(tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_always_consumes_no_randomness() {
        let table = ChanceTable::default();
        let mut gated = StdRng::seed_from_u64(7);
        let mut untouched = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            assert!(table.included(ChanceTier::Always, &mut gated));
        }
        assert_eq!(gated.next_u64(), untouched.next_u64());
    }

    #[test]
    fn test_zero_and_one_probabilities() {
        let table = ChanceTable {
            common: 1.0,
            normal: 0.0,
            rare: 0.0,
            very_rare: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..1000 {
            assert!(table.included(ChanceTier::Common, &mut rng));
            assert!(!table.included(ChanceTier::Normal, &mut rng));
        }
    }

    #[test]
    fn test_invalid_tier_detected() {
        assert_eq!(ChanceTable::default().invalid_tier(), None);

        let table = ChanceTable {
            rare: 1.5,
            ..ChanceTable::default()
        };
        assert_eq!(table.invalid_tier(), Some((ChanceTier::Rare, 1.5)));
    }

    #[test]
    fn test_tier_names() {
        let tier: ChanceTier = serde_json::from_str("\"very_rare\"").unwrap();
        assert_eq!(tier, ChanceTier::VeryRare);
        assert_eq!(tier.as_str(), "very_rare");
    }
}
