use std::sync::Arc;

use crate::domain::breakdown::QuoteBreakdown;
use crate::domain::options::Region;
use crate::domain::state::{EstimatorState, SelectionChange};
use crate::estimator::catalog::Catalog;
use crate::estimator::persistence::{encode_state, restore_state, RestoreReport};
use crate::estimator::pricing::compute_quote;

/// One user's estimator: the current selections and the breakdown derived from them.
/// Every change recomputes the breakdown in full.
#[derive(Clone, Debug)]
pub struct EstimatorSession {
    catalog: Arc<Catalog>,
    state: EstimatorState,
    breakdown: QuoteBreakdown,
}

impl EstimatorSession {
    pub fn new(catalog: Arc<Catalog>, region: Region) -> Self {
        let state = catalog.initial_state(region);
        Self::from_state(catalog, state)
    }

    pub fn restore(
        catalog: Arc<Catalog>,
        default_region: Region,
        payload: Option<&str>,
    ) -> (Self, RestoreReport) {
        let (state, report) = restore_state(&catalog, default_region, payload);
        (Self::from_state(catalog, state), report)
    }

    /// Adopts an externally supplied state, clamping its counts into range.
    pub fn from_state(catalog: Arc<Catalog>, mut state: EstimatorState) -> Self {
        state.scope.pages = catalog.clamp_pages(state.scope.project_type, i64::from(state.scope.pages));
        state.scope.integrations = catalog.clamp_integrations(i64::from(state.scope.integrations));
        let breakdown = compute_quote(&catalog, &state);
        Self { catalog, state, breakdown }
    }

    pub fn apply(&mut self, change: SelectionChange) -> &QuoteBreakdown {
        let catalog = &self.catalog;
        let state = &mut self.state;
        match change {
            SelectionChange::Region(region) => state.scope.region = region,
            SelectionChange::ProjectType(project_type) => {
                if project_type != state.scope.project_type {
                    state.scope.project_type = project_type;
                    state.scope.pages = catalog.base_pages(project_type);
                }
            }
            SelectionChange::Pages(pages) => {
                state.scope.pages = catalog.clamp_pages(state.scope.project_type, pages);
            }
            SelectionChange::Integrations(integrations) => {
                state.scope.integrations = catalog.clamp_integrations(integrations);
            }
            SelectionChange::Design(tier) => state.features.design = tier,
            SelectionChange::Cms(tier) => state.features.cms = tier,
            SelectionChange::Commerce(tier) => state.features.commerce = tier,
            SelectionChange::Seo(tier) => state.features.seo = tier,
            SelectionChange::Copy(tier) => state.features.copy = tier,
            SelectionChange::Animation(tier) => state.features.animation = tier,
            SelectionChange::Urgency(tier) => state.features.urgency = tier,
            SelectionChange::Maintenance(tier) => state.features.maintenance = tier,
            SelectionChange::FirstProject(flag) => state.discount.first_project = flag,
            SelectionChange::Coupon(coupon) => state.discount.coupon = coupon,
        }

        self.breakdown = compute_quote(&self.catalog, &self.state);
        &self.breakdown
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &EstimatorState {
        &self.state
    }

    pub fn breakdown(&self) -> &QuoteBreakdown {
        &self.breakdown
    }

    pub fn encoded_state(&self) -> String {
        encode_state(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::EstimatorSession;
    use crate::domain::options::{CmsTier, ProjectType, Region};
    use crate::domain::state::SelectionChange;
    use crate::estimator::catalog::Catalog;
    use crate::estimator::pricing::compute_quote;

    fn session() -> EstimatorSession {
        EstimatorSession::new(Arc::new(Catalog::builtin()), Region::Global)
    }

    #[test]
    fn new_session_prices_default_state() {
        let session = session();
        assert_eq!(session.state().scope.pages, 1);
        assert_eq!(session.breakdown().one_time_total, Decimal::from(150));
    }

    #[test]
    fn project_type_change_resets_pages_to_included() {
        let mut session = session();
        session.apply(SelectionChange::Pages(9));
        session.apply(SelectionChange::ProjectType(ProjectType::Ecommerce));

        assert_eq!(session.state().scope.pages, 8);
        assert_eq!(session.breakdown().extra_pages, 0);
    }

    #[test]
    fn reselecting_current_project_type_keeps_pages() {
        let mut session = session();
        session.apply(SelectionChange::ProjectType(ProjectType::Corporate));
        session.apply(SelectionChange::Pages(9));

        let breakdown = session.apply(SelectionChange::ProjectType(ProjectType::Corporate));

        assert_eq!(breakdown.pages, 9);
        assert_eq!(breakdown.extra_pages, 4);
        assert_eq!(session.state().scope.pages, 9);
    }

    #[test]
    fn numeric_changes_are_clamped() {
        let mut session = session();

        let breakdown = session.apply(SelectionChange::Pages(-3));
        assert_eq!(breakdown.pages, 1);

        session.apply(SelectionChange::Integrations(1_000));
        assert_eq!(session.state().scope.integrations, 20);
    }

    #[test]
    fn every_change_recomputes_breakdown() {
        let mut session = session();
        session.apply(SelectionChange::Cms(CmsTier::Full));
        session.apply(SelectionChange::Coupon(" first20".to_string()));

        assert_eq!(session.breakdown(), &compute_quote(session.catalog(), session.state()));
        // (150 + 250) * 0.8
        assert_eq!(session.breakdown().one_time_total, Decimal::from(320));
    }

    #[test]
    fn restore_round_trips_encoded_state() {
        let catalog = Arc::new(Catalog::builtin());
        let mut original = EstimatorSession::new(Arc::clone(&catalog), Region::Co);
        original.apply(SelectionChange::ProjectType(ProjectType::Corporate));
        original.apply(SelectionChange::FirstProject(true));

        let (restored, report) =
            EstimatorSession::restore(catalog, Region::Global, Some(&original.encoded_state()));

        assert!(report.is_clean());
        assert_eq!(restored.state(), original.state());
        assert_eq!(restored.breakdown(), original.breakdown());
    }

    #[test]
    fn from_state_clamps_out_of_range_counts() {
        let catalog = Arc::new(Catalog::builtin());
        let mut state = catalog.initial_state(Region::Global);
        state.scope.project_type = ProjectType::Corporate;
        state.scope.pages = 0;
        state.scope.integrations = 90;

        let session = EstimatorSession::from_state(catalog, state);

        assert_eq!(session.state().scope.pages, 5);
        assert_eq!(session.state().scope.integrations, 20);
    }
}
