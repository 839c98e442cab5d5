//! Price and Quantity Policies
//!
//! Declarative rules that resolve to a concrete unit price or stock count.
//! `Raw*` forms mirror the persisted catalog and may hold anything the file
//! says; the resolved forms are only built through `from_raw` and uphold the
//! bounds invariants.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::error::PolicyError;

/// Number of draws averaged by `PricePolicy::Varied`
const VARIED_DRAWS: u64 = 3;

/// Smallest average percentage `PricePolicy::Varied` can produce
const VARIED_MIN_PERCENT: u64 = 1;

// ============================================================================
// Raw (persisted) forms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawPricePolicy {
    Fixed(i64),
    Range(i64, i64),
    Scaled {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base: Option<i64>,
        divisor: i64,
    },
    Varied {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base: Option<i64>,
        low: i64,
        high: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RawQuantityPolicy {
    Fixed(i64),
    Range(i64, i64),
    #[default]
    Unlimited,
}

// ============================================================================
// Resolved forms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePolicy {
    Fixed(u32),
    Range { min: u32, max: u32 },
    /// `base / divisor`, rounded down
    Scaled { base: u32, divisor: u32 },
    /// `base` scaled by the average of several draws in `[low_percent, high_percent]`
    Varied {
        base: u32,
        low_percent: u32,
        high_percent: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityPolicy {
    Fixed(u32),
    Range { min: u32, max: u32 },
    /// Replenish to the resolver's configured default
    Unlimited,
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, PolicyError> {
    if value < 0 {
        return Err(PolicyError::Negative { field, value });
    }
    u32::try_from(value).map_err(|_| PolicyError::TooLarge { field, value })
}

fn ordered(field: &'static str, min: i64, max: i64) -> Result<(u32, u32), PolicyError> {
    let lo = non_negative(field, min)?;
    let hi = non_negative(field, max)?;
    if lo > hi {
        return Err(PolicyError::InvertedRange { field, min, max });
    }
    Ok((lo, hi))
}

impl PricePolicy {
    /// Validate a persisted price rule. `catalog_price` stands in for an
    /// omitted `base`.
    pub fn from_raw(raw: &RawPricePolicy, catalog_price: u32) -> Result<Self, PolicyError> {
        Ok(match *raw {
            RawPricePolicy::Fixed(amount) => PricePolicy::Fixed(non_negative("price", amount)?),
            RawPricePolicy::Range(min, max) => {
                let (min, max) = ordered("price", min, max)?;
                PricePolicy::Range { min, max }
            }
            RawPricePolicy::Scaled { base, divisor } => {
                let base = match base {
                    Some(b) => non_negative("price base", b)?,
                    None => catalog_price,
                };
                let divisor = non_negative("price divisor", divisor)?;
                if divisor == 0 {
                    return Err(PolicyError::ZeroDivisor);
                }
                PricePolicy::Scaled { base, divisor }
            }
            RawPricePolicy::Varied { base, low, high } => {
                let base = match base {
                    Some(b) => non_negative("price base", b)?,
                    None => catalog_price,
                };
                let (low_percent, high_percent) = ordered("price percent", low, high)?;
                PricePolicy::Varied {
                    base,
                    low_percent,
                    high_percent,
                }
            }
        })
    }

    pub fn to_raw(&self) -> RawPricePolicy {
        match *self {
            PricePolicy::Fixed(amount) => RawPricePolicy::Fixed(amount.into()),
            PricePolicy::Range { min, max } => RawPricePolicy::Range(min.into(), max.into()),
            PricePolicy::Scaled { base, divisor } => RawPricePolicy::Scaled {
                base: Some(base.into()),
                divisor: divisor.into(),
            },
            PricePolicy::Varied {
                base,
                low_percent,
                high_percent,
            } => RawPricePolicy::Varied {
                base: Some(base.into()),
                low: low_percent.into(),
                high: high_percent.into(),
            },
        }
    }

    /// Resolve a concrete unit price
    pub fn resolve(&self, rng: &mut dyn RngCore) -> u32 {
        match *self {
            PricePolicy::Fixed(amount) => amount,
            PricePolicy::Range { min, max } => rng.gen_range(min..=max),
            PricePolicy::Scaled { base, divisor } => base / divisor,
            PricePolicy::Varied {
                base,
                low_percent,
                high_percent,
            } => {
                let total: u64 = (0..VARIED_DRAWS)
                    .map(|_| u64::from(rng.gen_range(low_percent..=high_percent)))
                    .sum();
                let percent = (total / VARIED_DRAWS).max(VARIED_MIN_PERCENT);
                let price = u64::from(base) * percent / 100;
                u32::try_from(price).unwrap_or(u32::MAX)
            }
        }
    }
}

impl QuantityPolicy {
    pub fn from_raw(raw: &RawQuantityPolicy) -> Result<Self, PolicyError> {
        Ok(match *raw {
            RawQuantityPolicy::Fixed(n) => QuantityPolicy::Fixed(non_negative("quantity", n)?),
            RawQuantityPolicy::Range(min, max) => {
                let (min, max) = ordered("quantity", min, max)?;
                QuantityPolicy::Range { min, max }
            }
            RawQuantityPolicy::Unlimited => QuantityPolicy::Unlimited,
        })
    }

    pub fn to_raw(&self) -> RawQuantityPolicy {
        match *self {
            QuantityPolicy::Fixed(n) => RawQuantityPolicy::Fixed(n.into()),
            QuantityPolicy::Range { min, max } => RawQuantityPolicy::Range(min.into(), max.into()),
            QuantityPolicy::Unlimited => RawQuantityPolicy::Unlimited,
        }
    }

    /// Resolve a concrete stock count; `unlimited` is what `Unlimited` replenishes to
    pub fn resolve(&self, rng: &mut dyn RngCore, unlimited: u32) -> u32 {
        match *self {
            QuantityPolicy::Fixed(n) => n,
            QuantityPolicy::Range { min, max } => rng.gen_range(min..=max),
            QuantityPolicy::Unlimited => unlimited,
        }
    }
}
