use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bounds (inclusive) of the first three price buckets. Anything above
/// the last bound, including prices past the nominal 5000 ceiling, lands in
/// [`PriceBucket::Luxury`].
pub const BUCKET_BREAKPOINTS: [u64; 3] = [50, 150, 300];

/// Discrete price category. The numeric label (0..=3) is what the trained
/// classifier emits and what the artifact files carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PriceBucket {
    Budget,
    Standard,
    Premium,
    Luxury,
}

impl PriceBucket {
    pub const ALL: [PriceBucket; 4] =
        [PriceBucket::Budget, PriceBucket::Standard, PriceBucket::Premium, PriceBucket::Luxury];

    pub fn from_price(price: u64) -> Self {
        if price <= BUCKET_BREAKPOINTS[0] {
            PriceBucket::Budget
        } else if price <= BUCKET_BREAKPOINTS[1] {
            PriceBucket::Standard
        } else if price <= BUCKET_BREAKPOINTS[2] {
            PriceBucket::Premium
        } else {
            PriceBucket::Luxury
        }
    }

    pub fn label(self) -> u8 {
        match self {
            PriceBucket::Budget => 0,
            PriceBucket::Standard => 1,
            PriceBucket::Premium => 2,
            PriceBucket::Luxury => 3,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        Self::ALL.get(usize::from(label)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceBucket::Budget => "budget",
            PriceBucket::Standard => "standard",
            PriceBucket::Premium => "premium",
            PriceBucket::Luxury => "luxury",
        }
    }
}

impl TryFrom<u8> for PriceBucket {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_label(value).ok_or_else(|| format!("bucket label {value} is outside 0..=3"))
    }
}

impl From<PriceBucket> for u8 {
    fn from(value: PriceBucket) -> Self {
        value.label()
    }
}

impl fmt::Display for PriceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: u64,
    pub image: String,
    pub bucket: PriceBucket,
}

impl Product {
    /// Builds a product and derives its bucket from the price.
    pub fn new(name: impl Into<String>, price: u64, image: impl Into<String>) -> Self {
        Self { name: name.into(), price, image: image.into(), bucket: PriceBucket::from_price(price) }
    }
}

/// Normalizes a raw price field: finite decimals are truncated toward zero,
/// everything else (blank, non-numeric, NaN, infinite, negative) becomes 0.
pub fn normalize_price(raw: &str) -> u64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}
