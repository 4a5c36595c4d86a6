pub mod catalog;
pub mod catalog_file;
pub mod catalog_view;
pub mod export;
pub mod persistence;
pub mod pricing;
pub mod session;

pub use catalog::{Catalog, CatalogError, PricedItem};
pub use catalog_view::CatalogView;
pub use export::{ExportError, QuoteDocument};
pub use persistence::{restore_state, RestoreReport, StateStore, StoreError};
pub use pricing::{compute_quote, DeterministicPricingEngine, PricingEngine};
pub use session::EstimatorSession;
