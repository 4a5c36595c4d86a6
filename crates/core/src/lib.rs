pub mod config;
pub mod domain;
pub mod errors;
pub mod estimator;

pub use domain::breakdown::QuoteBreakdown;
pub use domain::options::{
    AnimationTier, CmsTier, CommerceTier, CopyTier, DesignTier, FeatureCategory, MaintenanceTier,
    OptionKey, ProjectType, Region, SeoTier, UrgencyTier,
};
pub use domain::state::{
    DiscountState, EstimatorState, FeatureSelection, ScopeSelection, SelectionChange,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use estimator::{
    compute_quote, Catalog, CatalogError, CatalogView, EstimatorSession, ExportError,
    QuoteDocument, RestoreReport, StateStore, StoreError,
};
