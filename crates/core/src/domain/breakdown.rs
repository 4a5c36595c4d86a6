use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::options::{FeatureCategory, Region};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLineItem {
    pub category: FeatureCategory,
    pub option: String,
    pub label: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMultiplier {
    pub category: FeatureCategory,
    pub option: String,
    pub label: String,
    pub factor: Decimal,
    /// Running subtotal right after this factor, before rounding.
    pub subtotal_after: Decimal,
}

/// Itemized result of pricing one estimator state. Amounts are whole currency units
/// except `AppliedMultiplier::subtotal_after`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub region: Region,
    pub region_multiplier: Decimal,
    pub base_cost: Decimal,
    pub included_pages: u32,
    pub pages: u32,
    pub extra_pages: u32,
    pub extra_pages_cost: Decimal,
    pub feature_costs: Vec<FeatureLineItem>,
    pub integrations: u32,
    pub integrations_cost: Decimal,
    pub pre_multiplier_subtotal: Decimal,
    pub multipliers: Vec<AppliedMultiplier>,
    pub one_time_subtotal: Decimal,
    pub discount_rate: Decimal,
    pub discount_amount: Decimal,
    pub one_time_total: Decimal,
    pub monthly_maintenance: Decimal,
    pub upfront_installment: Decimal,
    pub delivery_installment: Decimal,
}

impl QuoteBreakdown {
    pub fn feature_cost(&self, category: FeatureCategory) -> Decimal {
        self.feature_costs
            .iter()
            .find(|item| item.category == category)
            .map(|item| item.amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn discount_applied(&self) -> bool {
        self.discount_amount > Decimal::ZERO
    }
}
