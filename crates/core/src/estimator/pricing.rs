use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::breakdown::{AppliedMultiplier, FeatureLineItem, QuoteBreakdown};
use crate::domain::options::{FeatureCategory, MaintenanceTier};
use crate::domain::state::{EstimatorState, FeatureSelection};
use crate::estimator::catalog::{round_currency, Catalog, PricedItem};

/// Additive categories in the order their line items appear.
pub const ADDITIVE_CATEGORIES: [FeatureCategory; 5] = [
    FeatureCategory::Cms,
    FeatureCategory::Commerce,
    FeatureCategory::Seo,
    FeatureCategory::Copy,
    FeatureCategory::Animation,
];

pub trait PricingEngine: Send + Sync {
    fn price(&self, state: &EstimatorState) -> QuoteBreakdown;
}

#[derive(Clone, Debug)]
pub struct DeterministicPricingEngine {
    catalog: Arc<Catalog>,
}

impl DeterministicPricingEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Default for DeterministicPricingEngine {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::builtin()))
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, state: &EstimatorState) -> QuoteBreakdown {
        compute_quote(&self.catalog, state)
    }
}

/// Prices a state. Out-of-range page and integration counts are clamped first; the
/// function has no other failure mode.
pub fn compute_quote(catalog: &Catalog, state: &EstimatorState) -> QuoteBreakdown {
    let scope = &state.scope;
    let region = scope.region;

    let base_cost = catalog.resolve_value(PricedItem::ProjectBase(scope.project_type), region);

    let included_pages = catalog.base_pages(scope.project_type);
    let pages = catalog.clamp_pages(scope.project_type, i64::from(scope.pages));
    let extra_pages = pages.saturating_sub(included_pages);
    let extra_pages_cost = round_currency(
        Decimal::from(extra_pages) * catalog.unit_price(PricedItem::ExtraPage, region),
    );

    let feature_costs: Vec<FeatureLineItem> = ADDITIVE_CATEGORIES
        .into_iter()
        .filter_map(|category| {
            additive_item(&state.features, category).map(|item| {
                let choice = catalog.feature_choice(&state.features, category);
                FeatureLineItem {
                    category,
                    option: choice.option.to_string(),
                    label: choice.label,
                    amount: catalog.resolve_value(item, region),
                }
            })
        })
        .collect();

    let integrations = catalog.clamp_integrations(i64::from(scope.integrations));
    let integrations_cost = round_currency(
        Decimal::from(integrations) * catalog.unit_price(PricedItem::Integration, region),
    );

    let pre_multiplier_subtotal = base_cost
        + extra_pages_cost
        + feature_costs.iter().map(|item| item.amount).sum::<Decimal>()
        + integrations_cost;

    let factors = [
        (FeatureCategory::Design, catalog.design_factor(state.features.design)),
        (FeatureCategory::Urgency, catalog.urgency_factor(state.features.urgency)),
    ];
    let mut running = pre_multiplier_subtotal;
    let mut multipliers = Vec::with_capacity(factors.len());
    for (category, factor) in factors {
        running *= factor;
        let choice = catalog.feature_choice(&state.features, category);
        multipliers.push(AppliedMultiplier {
            category,
            option: choice.option.to_string(),
            label: choice.label,
            factor: factor.normalize(),
            subtotal_after: running.normalize(),
        });
    }
    let one_time_subtotal = round_currency(running);

    let (discount_rate, discount_amount) = if state.discount.is_active(&catalog.discount.codes) {
        let rate = catalog.discount.rate;
        (rate.normalize(), round_currency(one_time_subtotal * rate))
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };
    let one_time_total = one_time_subtotal - discount_amount;

    let monthly_maintenance = match state.features.maintenance {
        MaintenanceTier::None => Decimal::ZERO,
        tier => catalog.resolve_value(PricedItem::Maintenance(tier), region),
    };

    let upfront_installment = round_currency(one_time_total * Decimal::new(5, 1));
    let delivery_installment = one_time_total - upfront_installment;

    QuoteBreakdown {
        region,
        region_multiplier: catalog.region_multiplier(region).normalize(),
        base_cost,
        included_pages,
        pages,
        extra_pages,
        extra_pages_cost,
        feature_costs,
        integrations,
        integrations_cost,
        pre_multiplier_subtotal,
        multipliers,
        one_time_subtotal,
        discount_rate,
        discount_amount,
        one_time_total,
        monthly_maintenance,
        upfront_installment,
        delivery_installment,
    }
}

fn additive_item(features: &FeatureSelection, category: FeatureCategory) -> Option<PricedItem> {
    match category {
        FeatureCategory::Cms => Some(PricedItem::Cms(features.cms)),
        FeatureCategory::Commerce => Some(PricedItem::Commerce(features.commerce)),
        FeatureCategory::Seo => Some(PricedItem::Seo(features.seo)),
        FeatureCategory::Copy => Some(PricedItem::Copy(features.copy)),
        FeatureCategory::Animation => Some(PricedItem::Animation(features.animation)),
        FeatureCategory::Design | FeatureCategory::Urgency | FeatureCategory::Maintenance => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use proptest::sample::select;
    use rust_decimal::Decimal;

    use super::{compute_quote, DeterministicPricingEngine, PricingEngine};
    use crate::domain::options::{
        AnimationTier, CmsTier, CommerceTier, CopyTier, DesignTier, FeatureCategory,
        MaintenanceTier, OptionKey, ProjectType, Region, SeoTier, UrgencyTier,
    };
    use crate::domain::state::{DiscountState, EstimatorState, FeatureSelection, ScopeSelection};
    use crate::estimator::catalog::Catalog;

    fn landing_state() -> EstimatorState {
        Catalog::builtin().initial_state(Region::Global)
    }

    #[test]
    fn plain_landing_page_costs_base_price() {
        let breakdown = compute_quote(&Catalog::builtin(), &landing_state());

        assert_eq!(breakdown.base_cost, Decimal::from(150));
        assert_eq!(breakdown.extra_pages, 0);
        assert_eq!(breakdown.one_time_subtotal, Decimal::from(150));
        assert_eq!(breakdown.discount_amount, Decimal::ZERO);
        assert_eq!(breakdown.one_time_total, Decimal::from(150));
        assert_eq!(breakdown.upfront_installment, Decimal::from(75));
        assert_eq!(breakdown.delivery_installment, Decimal::from(75));
        assert_eq!(breakdown.monthly_maintenance, Decimal::ZERO);
    }

    #[test]
    fn first20_coupon_takes_twenty_percent_off() {
        let mut state = landing_state();
        state.discount.coupon = "FIRST20".to_string();

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        assert_eq!(breakdown.discount_rate, Decimal::new(2, 1));
        assert_eq!(breakdown.discount_amount, Decimal::from(30));
        assert_eq!(breakdown.one_time_total, Decimal::from(120));
        assert_eq!(breakdown.upfront_installment, Decimal::from(60));
        assert_eq!(breakdown.delivery_installment, Decimal::from(60));
    }

    #[test]
    fn extra_pages_are_added_before_multipliers() {
        let mut state = landing_state();
        state.scope.pages = 5;
        state.features.design = DesignTier::Premium;

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        assert_eq!(breakdown.extra_pages, 4);
        assert_eq!(breakdown.extra_pages_cost, Decimal::from(200));
        assert_eq!(breakdown.pre_multiplier_subtotal, Decimal::from(350));
        // 350 * 1.3
        assert_eq!(breakdown.one_time_subtotal, Decimal::from(455));
    }

    #[test]
    fn full_configuration_applies_every_step_in_order() {
        let state = EstimatorState {
            scope: ScopeSelection {
                region: Region::Global,
                project_type: ProjectType::Corporate,
                pages: 7,
                integrations: 2,
            },
            features: FeatureSelection {
                design: DesignTier::Pro,
                cms: CmsTier::Headless,
                commerce: CommerceTier::None,
                seo: SeoTier::Basic,
                copy: CopyTier::Basic,
                animation: AnimationTier::Subtle,
                urgency: UrgencyTier::Fast,
                maintenance: MaintenanceTier::Basic,
            },
            discount: DiscountState { first_project: true, coupon: String::new() },
        };

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        // 400 + 2*50 + (150 + 0 + 80 + 60 + 60) + 2*40
        assert_eq!(breakdown.pre_multiplier_subtotal, Decimal::from(930));
        assert_eq!(breakdown.multipliers.len(), 2);
        assert_eq!(breakdown.multipliers[0].category, FeatureCategory::Design);
        assert_eq!(breakdown.multipliers[0].subtotal_after, Decimal::new(10695, 1));
        assert_eq!(breakdown.multipliers[1].category, FeatureCategory::Urgency);
        // 1069.5 * 1.2 = 1283.4
        assert_eq!(breakdown.one_time_subtotal, Decimal::from(1283));
        // 1283 * 0.2 = 256.6
        assert_eq!(breakdown.discount_amount, Decimal::from(257));
        assert_eq!(breakdown.one_time_total, Decimal::from(1026));
        assert_eq!(breakdown.upfront_installment, Decimal::from(513));
        assert_eq!(breakdown.delivery_installment, Decimal::from(513));
        assert_eq!(breakdown.monthly_maintenance, Decimal::from(25));
        assert_eq!(breakdown.feature_cost(FeatureCategory::Cms), Decimal::from(150));
        assert_eq!(breakdown.feature_costs[0].label, "Headless CMS");
    }

    #[test]
    fn odd_totals_split_with_upfront_rounded_up() {
        let mut state = landing_state();
        state.scope.integrations = 1;
        state.features.design = DesignTier::Pro;

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        // (150 + 40) * 1.15 = 218.5
        assert_eq!(breakdown.one_time_subtotal, Decimal::from(219));
        assert_eq!(breakdown.upfront_installment, Decimal::from(110));
        assert_eq!(breakdown.delivery_installment, Decimal::from(109));
    }

    #[test]
    fn regional_overrides_and_multipliers_apply() {
        let mut state = Catalog::builtin().initial_state(Region::Es);
        state.features.maintenance = MaintenanceTier::Pro;
        state.features.seo = SeoTier::Basic;

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        assert_eq!(breakdown.region_multiplier, Decimal::new(11, 1));
        assert_eq!(breakdown.base_cost, Decimal::from(180));
        assert_eq!(breakdown.feature_cost(FeatureCategory::Seo), Decimal::from(88));
        assert_eq!(breakdown.monthly_maintenance, Decimal::from(55));
    }

    #[test]
    fn fractional_regional_unit_prices_round_after_multiplying_quantity() {
        let mut state = Catalog::builtin().initial_state(Region::Ar);
        state.scope.pages = 4;

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        // 3 * 37.5 = 112.5
        assert_eq!(breakdown.extra_pages_cost, Decimal::from(113));
    }

    #[test]
    fn integrations_above_cap_are_clamped() {
        let mut state = landing_state();
        state.scope.integrations = 500;

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        assert_eq!(breakdown.integrations, 20);
        assert_eq!(breakdown.integrations_cost, Decimal::from(800));
    }

    #[test]
    fn unknown_coupon_means_no_discount() {
        let mut state = landing_state();
        state.discount.coupon = "SAVE50".to_string();

        let breakdown = compute_quote(&Catalog::builtin(), &state);

        assert!(!breakdown.discount_applied());
        assert_eq!(breakdown.discount_rate, Decimal::ZERO);
        assert_eq!(breakdown.one_time_total, breakdown.one_time_subtotal);
    }

    #[test]
    fn engine_prices_with_its_shared_catalog() {
        let engine = DeterministicPricingEngine::new(Arc::new(Catalog::builtin()));
        let breakdown = engine.price(&landing_state());
        assert_eq!(breakdown, compute_quote(engine.catalog(), &landing_state()));
    }

    prop_compose! {
        fn arb_features()(
            design in select(DesignTier::ALL),
            cms in select(CmsTier::ALL),
            commerce in select(CommerceTier::ALL),
            seo in select(SeoTier::ALL),
            copy in select(CopyTier::ALL),
            animation in select(AnimationTier::ALL),
            urgency in select(UrgencyTier::ALL),
            maintenance in select(MaintenanceTier::ALL),
        ) -> FeatureSelection {
            FeatureSelection { design, cms, commerce, seo, copy, animation, urgency, maintenance }
        }
    }

    prop_compose! {
        fn arb_state()(
            region in select(Region::ALL),
            project_type in select(ProjectType::ALL),
            pages in 0u32..40,
            integrations in 0u32..30,
            features in arb_features(),
            first_project in any::<bool>(),
            coupon in select(&["", "FIRST20", " first20 ", "SAVE50"][..]),
        ) -> EstimatorState {
            EstimatorState {
                scope: ScopeSelection { region, project_type, pages, integrations },
                features,
                discount: DiscountState { first_project, coupon: coupon.to_string() },
            }
        }
    }

    fn total(state: &EstimatorState) -> Decimal {
        compute_quote(&Catalog::builtin(), state).one_time_total
    }

    proptest! {
        #[test]
        fn computation_is_deterministic(state in arb_state()) {
            let catalog = Catalog::builtin();
            prop_assert_eq!(compute_quote(&catalog, &state), compute_quote(&catalog, &state));
        }

        #[test]
        fn installments_sum_to_total(state in arb_state()) {
            let breakdown = compute_quote(&Catalog::builtin(), &state);
            prop_assert_eq!(
                breakdown.upfront_installment + breakdown.delivery_installment,
                breakdown.one_time_total
            );
        }

        #[test]
        fn total_is_subtotal_minus_discount(state in arb_state()) {
            let catalog = Catalog::builtin();
            let breakdown = compute_quote(&catalog, &state);
            prop_assert_eq!(
                breakdown.one_time_total,
                breakdown.one_time_subtotal - breakdown.discount_amount
            );
            if !state.discount.is_active(&catalog.discount.codes) {
                prop_assert_eq!(breakdown.discount_amount, Decimal::ZERO);
            }
        }

        #[test]
        fn more_pages_never_cost_less(state in arb_state()) {
            let mut more = state.clone();
            more.scope.pages = state.scope.pages + 1;
            prop_assert!(total(&more) >= total(&state));
        }

        #[test]
        fn more_integrations_never_cost_less(state in arb_state()) {
            let mut more = state.clone();
            more.scope.integrations = state.scope.integrations + 1;
            prop_assert!(total(&more) >= total(&state));
        }

        #[test]
        fn higher_multiplier_tiers_never_cost_less(state in arb_state()) {
            for pair in DesignTier::ALL.windows(2) {
                let mut lower = state.clone();
                lower.features.design = pair[0];
                let mut higher = state.clone();
                higher.features.design = pair[1];
                prop_assert!(total(&higher) >= total(&lower));
            }
            for pair in UrgencyTier::ALL.windows(2) {
                let mut lower = state.clone();
                lower.features.urgency = pair[0];
                let mut higher = state.clone();
                higher.features.urgency = pair[1];
                prop_assert!(total(&higher) >= total(&lower));
            }
        }

        #[test]
        fn pages_below_included_price_like_included(state in arb_state(), shortfall in 1u32..10) {
            let catalog = Catalog::builtin();
            let included = catalog.base_pages(state.scope.project_type);

            let mut at_base = state.clone();
            at_base.scope.pages = included;
            let mut below = state;
            below.scope.pages = included.saturating_sub(shortfall);

            prop_assert_eq!(compute_quote(&catalog, &below), compute_quote(&catalog, &at_base));
        }
    }
}
