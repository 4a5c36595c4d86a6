use serde::{Deserialize, Serialize};

use crate::domain::options::{
    AnimationTier, CmsTier, CommerceTier, CopyTier, DesignTier, MaintenanceTier, ProjectType,
    Region, SeoTier, UrgencyTier,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeSelection {
    pub region: Region,
    pub project_type: ProjectType,
    pub pages: u32,
    pub integrations: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureSelection {
    pub design: DesignTier,
    pub cms: CmsTier,
    pub commerce: CommerceTier,
    pub seo: SeoTier,
    pub copy: CopyTier,
    pub animation: AnimationTier,
    pub urgency: UrgencyTier,
    pub maintenance: MaintenanceTier,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscountState {
    pub first_project: bool,
    pub coupon: String,
}

impl DiscountState {
    pub fn normalized_coupon(&self) -> String {
        self.coupon.trim().to_ascii_uppercase()
    }

    pub fn is_active(&self, recognized_codes: &[String]) -> bool {
        if self.first_project {
            return true;
        }

        let coupon = self.normalized_coupon();
        !coupon.is_empty() && recognized_codes.iter().any(|code| code.eq_ignore_ascii_case(&coupon))
    }
}

/// Everything a user can select; the breakdown is a pure function of this.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EstimatorState {
    pub scope: ScopeSelection,
    pub features: FeatureSelection,
    pub discount: DiscountState,
}

/// One discrete user edit. Numeric inputs are signed so out-of-range values can be clamped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SelectionChange {
    Region(Region),
    ProjectType(ProjectType),
    Pages(i64),
    Integrations(i64),
    Design(DesignTier),
    Cms(CmsTier),
    Commerce(CommerceTier),
    Seo(SeoTier),
    Copy(CopyTier),
    Animation(AnimationTier),
    Urgency(UrgencyTier),
    Maintenance(MaintenanceTier),
    FirstProject(bool),
    Coupon(String),
}

#[cfg(test)]
mod tests {
    use super::DiscountState;

    fn codes() -> Vec<String> {
        vec!["FIRST20".to_string()]
    }

    #[test]
    fn coupon_matches_trimmed_and_case_insensitive() {
        let discount = DiscountState { first_project: false, coupon: "  first20 ".to_string() };
        assert!(discount.is_active(&codes()));
    }

    #[test]
    fn unknown_or_empty_coupon_is_inactive() {
        assert!(!DiscountState { first_project: false, coupon: "SAVE50".to_string() }
            .is_active(&codes()));
        assert!(!DiscountState::default().is_active(&codes()));
    }

    #[test]
    fn first_project_flag_activates_without_coupon() {
        let discount = DiscountState { first_project: true, coupon: String::new() };
        assert!(discount.is_active(&[]));
    }
}
