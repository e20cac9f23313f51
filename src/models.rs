use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub campaign: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    pub revenue: Decimal,
    pub orders: u64,
    pub leads: u64,
}

impl Transaction {
    pub fn dimension_value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Channel => self.channel.as_deref(),
            Dimension::Campaign => self.campaign.as_deref(),
            Dimension::Product => self.product.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Channel,
    Campaign,
    Product,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Channel, Dimension::Campaign, Dimension::Product];
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Channel => write!(f, "channel"),
            Self::Campaign => write!(f, "campaign"),
            Self::Product => write!(f, "product"),
        }
    }
}

impl std::str::FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "channel" => Ok(Self::Channel),
            "campaign" => Ok(Self::Campaign),
            "product" => Ok(Self::Product),
            _ => Err(format!("unknown dimension: {s}")),
        }
    }
}

/// Active per-dimension value selections. An empty selection for a
/// dimension leaves that dimension unconstrained.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    selections: HashMap<Dimension, HashSet<String>>,
}

impl FilterState {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Dimension, String)>,
    {
        let mut state = Self::default();
        for (dimension, value) in pairs {
            state.select(dimension, value);
        }
        state
    }

    pub fn select(&mut self, dimension: Dimension, value: impl Into<String>) {
        self.selections.entry(dimension).or_default().insert(value.into());
    }

    pub fn selected(&self, dimension: Dimension) -> Option<&HashSet<String>> {
        self.selections.get(&dimension)
    }

    pub fn allows(&self, transaction: &Transaction) -> bool {
        self.selections.iter().all(|(dimension, values)| {
            values.is_empty()
                || transaction
                    .dimension_value(*dimension)
                    .is_some_and(|value| values.contains(value))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub revenue: Decimal,
    pub orders: u64,
    pub leads: u64,
    pub conversion_rate: Decimal,
    pub average_order_value: Decimal,
    pub revenue_per_lead: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub dimension_value: String,
    pub summary: KpiSummary,
}
