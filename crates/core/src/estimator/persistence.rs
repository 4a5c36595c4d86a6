use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::options::{parse_option_key, OptionKey, Region};
use crate::domain::state::{EstimatorState, ScopeSelection};
use crate::errors::ApplicationError;
use crate::estimator::catalog::Catalog;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
    #[error("state store operation failed: {0}")]
    Operation(String),
}

impl From<StoreError> for ApplicationError {
    fn from(error: StoreError) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Opaque key/value storage for the serialized estimator state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn save(&self, key: &str, payload: &str) -> Result<(), StoreError>;
}

/// What restoration had to repair. Field paths use dotted notation (`scope.pages`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub payload_found: bool,
    pub malformed: bool,
    pub discarded: Vec<String>,
    pub clamped: Vec<String>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        !self.malformed && self.discarded.is_empty() && self.clamped.is_empty()
    }
}

pub fn encode_state(state: &EstimatorState) -> String {
    serde_json::to_string(state).unwrap_or_else(|_| String::from("{}"))
}

/// Rebuilds a state from a stored payload field by field. Anything missing or outside its
/// domain falls back to the default; restoration never fails.
pub fn restore_state(
    catalog: &Catalog,
    default_region: Region,
    payload: Option<&str>,
) -> (EstimatorState, RestoreReport) {
    let mut state = catalog.initial_state(default_region);
    let mut report = RestoreReport::default();

    let Some(payload) = payload else {
        return (state, report);
    };
    report.payload_found = true;

    let root = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(root)) => root,
        _ => {
            report.malformed = true;
            return (state, report);
        }
    };

    let empty = Map::new();
    let scope = section(&root, "scope", &mut report).unwrap_or(&empty);
    let features = section(&root, "features", &mut report).unwrap_or(&empty);
    let discount = section(&root, "discount", &mut report).unwrap_or(&empty);

    restore_key(scope, "scope.region", &mut state.scope.region, &mut report);
    restore_key(scope, "scope.project_type", &mut state.scope.project_type, &mut report);
    restore_counts(catalog, scope, &mut state.scope, &mut report);

    let selected = &mut state.features;
    restore_key(features, "features.design", &mut selected.design, &mut report);
    restore_key(features, "features.cms", &mut selected.cms, &mut report);
    restore_key(features, "features.commerce", &mut selected.commerce, &mut report);
    restore_key(features, "features.seo", &mut selected.seo, &mut report);
    restore_key(features, "features.copy", &mut selected.copy, &mut report);
    restore_key(features, "features.animation", &mut selected.animation, &mut report);
    restore_key(features, "features.urgency", &mut selected.urgency, &mut report);
    restore_key(features, "features.maintenance", &mut selected.maintenance, &mut report);

    match discount.get("first_project") {
        None => {}
        Some(Value::Bool(flag)) => state.discount.first_project = *flag,
        Some(_) => report.discarded.push("discount.first_project".to_string()),
    }
    match discount.get("coupon") {
        None => {}
        Some(Value::String(coupon)) => state.discount.coupon = coupon.clone(),
        Some(_) => report.discarded.push("discount.coupon".to_string()),
    }

    (state, report)
}

fn section<'a>(
    root: &'a Map<String, Value>,
    name: &str,
    report: &mut RestoreReport,
) -> Option<&'a Map<String, Value>> {
    match root.get(name) {
        None => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            report.discarded.push(name.to_string());
            None
        }
    }
}

fn restore_key<T: OptionKey>(
    object: &Map<String, Value>,
    path: &str,
    target: &mut T,
    report: &mut RestoreReport,
) {
    let field = path.rsplit('.').next().unwrap_or(path);
    match object.get(field) {
        None => {}
        Some(value) => match value.as_str().map(parse_option_key::<T>) {
            Some(Ok(parsed)) => *target = parsed,
            _ => report.discarded.push(path.to_string()),
        },
    }
}

fn restore_counts(
    catalog: &Catalog,
    scope: &Map<String, Value>,
    target: &mut ScopeSelection,
    report: &mut RestoreReport,
) {
    let included = catalog.base_pages(target.project_type);
    target.pages = match scope.get("pages") {
        None => included,
        Some(value) => match value.as_i64() {
            Some(raw) => {
                let pages = catalog.clamp_pages(target.project_type, raw);
                if i64::from(pages) != raw {
                    report.clamped.push("scope.pages".to_string());
                }
                pages
            }
            None => {
                report.discarded.push("scope.pages".to_string());
                included
            }
        },
    };

    target.integrations = match scope.get("integrations") {
        None => 0,
        Some(value) => match value.as_i64() {
            Some(raw) => {
                let integrations = catalog.clamp_integrations(raw);
                if i64::from(integrations) != raw {
                    report.clamped.push("scope.integrations".to_string());
                }
                integrations
            }
            None => {
                report.discarded.push("scope.integrations".to_string());
                0
            }
        },
    };
}
