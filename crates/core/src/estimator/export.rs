use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::domain::breakdown::QuoteBreakdown;
use crate::domain::options::{FeatureCategory, OptionKey};
use crate::domain::state::EstimatorState;
use crate::errors::ApplicationError;
use crate::estimator::catalog::{round_currency, Catalog};

pub const WHATSAPP_BASE_URL: &str = "https://wa.me/";
const REFERENCE_HEX_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("phone number `{0}` must contain 8 to 15 digits")]
    InvalidPhone(String),
    #[error("invalid link base `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("could not serialize quote: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ExportError> for ApplicationError {
    fn from(error: ExportError) -> Self {
        Self::Export(error.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledKey {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSummary {
    pub pages: u32,
    pub included_pages: u32,
    pub extra_pages: u32,
    pub integrations: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFeature {
    pub category: FeatureCategory,
    pub category_label: String,
    pub option: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountSummary {
    pub first_project: bool,
    pub coupon: String,
    pub active: bool,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Self-describing export of one quote: readable without access to the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDocument {
    pub reference: String,
    pub generated_at: DateTime<Utc>,
    pub currency: String,
    pub region: LabeledKey,
    pub project_type: LabeledKey,
    pub scope: ScopeSummary,
    pub features: Vec<SelectedFeature>,
    pub discount: DiscountSummary,
    pub breakdown: QuoteBreakdown,
}

impl QuoteDocument {
    pub fn build(
        catalog: &Catalog,
        state: &EstimatorState,
        breakdown: &QuoteBreakdown,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let features = FeatureCategory::ALL
            .into_iter()
            .map(|category| {
                let choice = catalog.feature_choice(&state.features, category);
                SelectedFeature {
                    category,
                    category_label: category.label().to_string(),
                    option: choice.option.to_string(),
                    label: choice.label,
                }
            })
            .collect();

        Self {
            reference: quote_reference(catalog, state),
            generated_at,
            currency: catalog.currency.clone(),
            region: LabeledKey {
                key: state.scope.region.key().to_string(),
                label: catalog.region_label(state.scope.region),
            },
            project_type: LabeledKey {
                key: state.scope.project_type.key().to_string(),
                label: catalog.project_type_label(state.scope.project_type),
            },
            scope: ScopeSummary {
                pages: breakdown.pages,
                included_pages: breakdown.included_pages,
                extra_pages: breakdown.extra_pages,
                integrations: breakdown.integrations,
            },
            features,
            discount: DiscountSummary {
                first_project: state.discount.first_project,
                coupon: state.discount.normalized_coupon(),
                active: state.discount.is_active(&catalog.discount.codes),
                rate: breakdown.discount_rate,
                amount: breakdown.discount_amount,
            },
            breakdown: breakdown.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_json_compact(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    fn feature(&self, category: FeatureCategory) -> Option<&SelectedFeature> {
        self.features.iter().find(|feature| feature.category == category)
    }
}

/// `Q-` plus a digest prefix of the canonical state, so equal configurations share a
/// reference.
pub fn quote_reference(catalog: &Catalog, state: &EstimatorState) -> String {
    let mut canonical = state.clone();
    canonical.scope.pages =
        catalog.clamp_pages(canonical.scope.project_type, i64::from(canonical.scope.pages));
    canonical.scope.integrations =
        catalog.clamp_integrations(i64::from(canonical.scope.integrations));
    canonical.discount.coupon = canonical.discount.normalized_coupon();

    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    let digest = blake3::hash(&bytes);
    let hex = digest.to_hex();
    format!("Q-{}", &hex.as_str()[..REFERENCE_HEX_LEN])
}

/// Plaintext summary carrying every label, the discount selection and every breakdown figure.
pub fn render_message(document: &QuoteDocument, greeting: &str) -> String {
    let currency = document.currency.as_str();
    let breakdown = &document.breakdown;
    let money = |amount: Decimal| format_money(currency, amount);
    let mut lines = Vec::new();

    if !greeting.trim().is_empty() {
        lines.push(greeting.trim().to_string());
        lines.push(String::new());
    }

    lines.push(format!("Reference: {}", document.reference));
    lines.push(format!(
        "Region: {} (x{})",
        document.region.label,
        breakdown.region_multiplier.normalize()
    ));
    lines.push(format!("Project: {}", document.project_type.label));
    lines.push(format!(
        "Pages: {} ({} included, {} extra)",
        document.scope.pages, document.scope.included_pages, document.scope.extra_pages
    ));
    lines.push(format!("Integrations: {}", document.scope.integrations));
    lines.push(format!(
        "First project: {}",
        if document.discount.first_project { "yes" } else { "no" }
    ));
    lines.push(format!(
        "Coupon: {}",
        if document.discount.coupon.is_empty() { "none" } else { document.discount.coupon.as_str() }
    ));

    lines.push(String::new());
    lines.push(format!("Base price: {}", money(breakdown.base_cost)));
    lines.push(format!("Extra pages: {}", money(breakdown.extra_pages_cost)));
    for item in &breakdown.feature_costs {
        lines.push(format!("{}: {} ({})", item.category.label(), item.label, money(item.amount)));
    }
    lines.push(format!("Integrations: {}", money(breakdown.integrations_cost)));
    lines.push(format!(
        "Subtotal before multipliers: {}",
        money(breakdown.pre_multiplier_subtotal)
    ));
    for multiplier in &breakdown.multipliers {
        lines.push(format!(
            "{}: {} (x{}), subtotal {}",
            multiplier.category.label(),
            multiplier.label,
            multiplier.factor.normalize(),
            money(multiplier.subtotal_after)
        ));
    }
    lines.push(format!("One-time subtotal: {}", money(breakdown.one_time_subtotal)));

    if breakdown.discount_applied() {
        lines.push(format!(
            "Discount ({}%): -{}",
            (breakdown.discount_rate * Decimal::ONE_HUNDRED).normalize(),
            money(breakdown.discount_amount)
        ));
    } else {
        lines.push("Discount: none".to_string());
    }
    lines.push(format!("One-time total: {}", money(breakdown.one_time_total)));
    lines.push(format!("Upfront (50%): {}", money(breakdown.upfront_installment)));
    lines.push(format!("On delivery (50%): {}", money(breakdown.delivery_installment)));

    let maintenance = document
        .feature(FeatureCategory::Maintenance)
        .map(|feature| feature.label.as_str())
        .unwrap_or("none");
    lines.push(format!(
        "Maintenance: {} ({}/month)",
        maintenance,
        money(breakdown.monthly_maintenance)
    ));

    lines.join("\n")
}

/// Whole-unit amount with thousands separators: `$1,234` for USD, `1,234 EUR` otherwise.
pub fn format_money(currency: &str, amount: Decimal) -> String {
    let rounded = round_currency(amount);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    if currency.eq_ignore_ascii_case("USD") {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}{grouped} {currency}")
    }
}

pub fn whatsapp_link(phone: &str, message: &str) -> Result<Url, ExportError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if !(8..=15).contains(&digits.len()) {
        return Err(ExportError::InvalidPhone(phone.to_string()));
    }

    let mut url = parse_base(&format!("{WHATSAPP_BASE_URL}{digits}"))?;
    url.query_pairs_mut().append_pair("text", message);
    Ok(url)
}

/// Contact-form link carrying the compact JSON document in the `quote` parameter.
pub fn contact_link(base_url: &str, document: &QuoteDocument) -> Result<Url, ExportError> {
    let mut url = parse_base(base_url)?;
    let payload = document.to_json_compact()?;
    url.query_pairs_mut().append_pair("quote", &payload);
    Ok(url)
}

pub fn export_file_name(document: &QuoteDocument) -> String {
    format!("quote-{}-{}.json", slugify(&document.project_type.label), document.region.key)
}

fn parse_base(raw: &str) -> Result<Url, ExportError> {
    let url = Url::parse(raw).map_err(|error| ExportError::InvalidUrl {
        url: raw.to_string(),
        reason: error.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ExportError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(url)
}

fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("project");
    }
    slug
}
