use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::domain::options::{
    parse_option_key, AnimationTier, CmsTier, CommerceTier, CopyTier, DesignTier,
    FeatureCategory, MaintenanceTier, OptionKey, ProjectType, Region, SeoTier, UrgencyTier,
};
use crate::domain::state::{EstimatorState, FeatureSelection, ScopeSelection};
use crate::errors::DomainError;

/// Rounds half away from zero to whole currency units.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is missing the {category} entry `{key}`")]
    MissingEntry { category: &'static str, key: &'static str },
    #[error("catalog entry `{category}.{key}` is invalid: {reason}")]
    InvalidEntry { category: String, key: String, reason: String },
    #[error(transparent)]
    UnknownKey(#[from] DomainError),
    #[error("could not parse catalog: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
}

pub trait CatalogEntry {
    fn label(&self) -> &str;
    fn description(&self) -> &str;
}

macro_rules! catalog_entry {
    ($($entry:ident),+) => {
        $(impl CatalogEntry for $entry {
            fn label(&self) -> &str {
                &self.label
            }

            fn description(&self) -> &str {
                &self.description
            }
        })+
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionOption {
    pub label: String,
    pub description: String,
    pub multiplier: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectTypeOption {
    pub label: String,
    pub description: String,
    pub base_price: Decimal,
    pub base_pages: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdditiveOption {
    pub label: String,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiplierOption {
    pub label: String,
    pub description: String,
    pub factor: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurringOption {
    pub label: String,
    pub description: String,
    pub monthly: Decimal,
}

catalog_entry!(RegionOption, ProjectTypeOption, AdditiveOption, MultiplierOption, RecurringOption);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeLimits {
    pub max_pages: u32,
    pub integration_cap: u32,
    pub extra_page_price: Decimal,
    pub integration_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscountPolicy {
    pub rate: Decimal,
    pub codes: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceCategory {
    Base,
    ExtraPage,
    Integration,
    Cms,
    Commerce,
    Seo,
    Copy,
    Animation,
    Maintenance,
}

impl PriceCategory {
    pub const ALL: [PriceCategory; 9] = [
        Self::Base,
        Self::ExtraPage,
        Self::Integration,
        Self::Cms,
        Self::Commerce,
        Self::Seo,
        Self::Copy,
        Self::Animation,
        Self::Maintenance,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::ExtraPage => "extra_page",
            Self::Integration => "integration",
            Self::Cms => "cms",
            Self::Commerce => "commerce",
            Self::Seo => "seo",
            Self::Copy => "copy",
            Self::Animation => "animation",
            Self::Maintenance => "maintenance",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|category| category.key() == normalized).ok_or_else(|| {
            DomainError::UnknownOption {
                category: "price_category",
                key: raw.trim().to_string(),
                expected: Self::ALL.map(|category| category.key()).join("|"),
            }
        })
    }
}

/// A flat amount in the catalog that a region may override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PricedItem {
    ProjectBase(ProjectType),
    ExtraPage,
    Integration,
    Cms(CmsTier),
    Commerce(CommerceTier),
    Seo(SeoTier),
    Copy(CopyTier),
    Animation(AnimationTier),
    Maintenance(MaintenanceTier),
}

const UNIT_KEY: &str = "unit";

/// Upper bounds for operator catalogs; they keep every priced product far from `Decimal` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000;
pub const MAX_FACTOR: i64 = 10;
pub const MAX_COUNT: u32 = 1_000;

impl PricedItem {
    pub fn category(self) -> PriceCategory {
        match self {
            Self::ProjectBase(_) => PriceCategory::Base,
            Self::ExtraPage => PriceCategory::ExtraPage,
            Self::Integration => PriceCategory::Integration,
            Self::Cms(_) => PriceCategory::Cms,
            Self::Commerce(_) => PriceCategory::Commerce,
            Self::Seo(_) => PriceCategory::Seo,
            Self::Copy(_) => PriceCategory::Copy,
            Self::Animation(_) => PriceCategory::Animation,
            Self::Maintenance(_) => PriceCategory::Maintenance,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::ProjectBase(project_type) => project_type.key(),
            Self::ExtraPage | Self::Integration => UNIT_KEY,
            Self::Cms(tier) => tier.key(),
            Self::Commerce(tier) => tier.key(),
            Self::Seo(tier) => tier.key(),
            Self::Copy(tier) => tier.key(),
            Self::Animation(tier) => tier.key(),
            Self::Maintenance(tier) => tier.key(),
        }
    }

    pub fn parse(category: PriceCategory, key: &str) -> Result<Self, DomainError> {
        let item = match category {
            PriceCategory::Base => Self::ProjectBase(parse_option_key(key)?),
            PriceCategory::ExtraPage | PriceCategory::Integration => {
                if !key.trim().eq_ignore_ascii_case(UNIT_KEY) {
                    return Err(DomainError::UnknownOption {
                        category: category.key(),
                        key: key.trim().to_string(),
                        expected: UNIT_KEY.to_string(),
                    });
                }
                if category == PriceCategory::ExtraPage {
                    Self::ExtraPage
                } else {
                    Self::Integration
                }
            }
            PriceCategory::Cms => Self::Cms(parse_option_key(key)?),
            PriceCategory::Commerce => Self::Commerce(parse_option_key(key)?),
            PriceCategory::Seo => Self::Seo(parse_option_key(key)?),
            PriceCategory::Copy => Self::Copy(parse_option_key(key)?),
            PriceCategory::Animation => Self::Animation(parse_option_key(key)?),
            PriceCategory::Maintenance => Self::Maintenance(parse_option_key(key)?),
        };
        Ok(item)
    }
}

/// The option selected in one feature category, resolved to its catalog label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureChoice {
    pub category: FeatureCategory,
    pub option: &'static str,
    pub label: String,
}

/// Immutable option tables plus the sparse per-region overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    pub currency: String,
    pub regions: BTreeMap<Region, RegionOption>,
    pub project_types: BTreeMap<ProjectType, ProjectTypeOption>,
    pub design: BTreeMap<DesignTier, MultiplierOption>,
    pub cms: BTreeMap<CmsTier, AdditiveOption>,
    pub commerce: BTreeMap<CommerceTier, AdditiveOption>,
    pub seo: BTreeMap<SeoTier, AdditiveOption>,
    pub copy: BTreeMap<CopyTier, AdditiveOption>,
    pub animation: BTreeMap<AnimationTier, AdditiveOption>,
    pub urgency: BTreeMap<UrgencyTier, MultiplierOption>,
    pub maintenance: BTreeMap<MaintenanceTier, RecurringOption>,
    pub limits: ScopeLimits,
    pub discount: DiscountPolicy,
    pub overrides: BTreeMap<Region, BTreeMap<PricedItem, Decimal>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The canonical USD price list.
    pub fn builtin() -> Self {
        let regions = BTreeMap::from([
            (
                Region::Global,
                region("International", "Competitive global reference pricing.", 100),
            ),
            (Region::Co, region("Colombia", "Adjusted to the local market, billed in USD.", 80)),
            (Region::Ar, region("Argentina", "Adjusted to the local market, billed in USD.", 75)),
            (Region::Es, region("Spain", "EU market, compliance and taxation included.", 110)),
        ]);

        let project_types = BTreeMap::from([
            (
                ProjectType::Landing,
                project(
                    "Landing Page",
                    "Single conversion-focused page with one call to action.",
                    150,
                    1,
                ),
            ),
            (
                ProjectType::Corporate,
                project("Corporate Website", "Institutional site with core company pages.", 400, 5),
            ),
            (
                ProjectType::Ecommerce,
                project("E-commerce", "Online store with catalog and checkout pages.", 800, 8),
            ),
            (
                ProjectType::SaasMvp,
                project("SaaS MVP", "Web application MVP with authentication and dashboard.", 1200, 10),
            ),
        ]);

        let design = BTreeMap::from([
            (DesignTier::Basic, multiplier("Basic", "Simple UI without complex micro-interactions.", 100)),
            (DesignTier::Pro, multiplier("Pro", "Micro-interactions and solid component states.", 115)),
            (
                DesignTier::Premium,
                multiplier("Premium (high detail)", "Advanced animation and fine-tuned performance.", 130),
            ),
        ]);

        let cms = BTreeMap::from([
            (CmsTier::None, additive("No CMS", "Static content.", 0)),
            (CmsTier::Headless, additive("Headless CMS", "Hosted headless CMS with API access.", 150)),
            (CmsTier::Full, additive("Full CMS", "Roles, workflows and complex collections.", 250)),
        ]);

        let commerce = BTreeMap::from([
            (CommerceTier::None, additive("No e-commerce", "No cart or checkout.", 0)),
            (CommerceTier::Lite, additive("E-commerce lite", "Catalog and basic checkout.", 300)),
            (CommerceTier::Pro, additive("E-commerce pro", "Variants, coupons and reports.", 550)),
        ]);

        let seo = BTreeMap::from([
            (SeoTier::None, additive("No SEO", "No technical SEO setup.", 0)),
            (SeoTier::Basic, additive("Basic SEO", "Meta tags, Open Graph, sitemap and structure.", 80)),
            (
                SeoTier::Advanced,
                additive("Advanced SEO", "Core Web Vitals, structured data and technical fixes.", 160),
            ),
        ]);

        let copy = BTreeMap::from([
            (CopyTier::None, additive("No copywriting", "Copy supplied by the client.", 0)),
            (CopyTier::Basic, additive("Basic copy", "Two or three sections.", 60)),
            (CopyTier::Full, additive("Full copy", "Home, about, services and calls to action.", 150)),
        ]);

        let animation = BTreeMap::from([
            (AnimationTier::None, additive("No animations", "Minimal transitions.", 0)),
            (AnimationTier::Subtle, additive("Subtle animations", "Soft hover and reveal effects.", 60)),
            (
                AnimationTier::Advanced,
                additive("Advanced animations", "Sequences, parallax or vector animation.", 130),
            ),
        ]);

        let urgency = BTreeMap::from([
            (UrgencyTier::Normal, multiplier("Normal (2-4 weeks)", "Standard schedule.", 100)),
            (UrgencyTier::Fast, multiplier("Fast (1-2 weeks)", "Priority on the calendar.", 120)),
            (UrgencyTier::Express, multiplier("Express (under 1 week)", "Reserved slots.", 140)),
        ]);

        let maintenance = BTreeMap::from([
            (MaintenanceTier::None, recurring("No maintenance", "No post-launch support.", 0)),
            (MaintenanceTier::Basic, recurring("Basic maintenance", "Support and small tweaks.", 25)),
            (
                MaintenanceTier::Pro,
                recurring("Pro maintenance", "Priority support and continuous improvements.", 50),
            ),
        ]);

        let overrides = BTreeMap::from([
            (
                Region::Co,
                BTreeMap::from([
                    (PricedItem::ProjectBase(ProjectType::Landing), Decimal::from(130)),
                    (PricedItem::Maintenance(MaintenanceTier::Basic), Decimal::from(20)),
                    (PricedItem::Maintenance(MaintenanceTier::Pro), Decimal::from(40)),
                ]),
            ),
            (
                Region::Ar,
                BTreeMap::from([
                    (PricedItem::ProjectBase(ProjectType::Landing), Decimal::from(120)),
                    (PricedItem::Maintenance(MaintenanceTier::Basic), Decimal::from(20)),
                    (PricedItem::Maintenance(MaintenanceTier::Pro), Decimal::from(40)),
                ]),
            ),
            (
                Region::Es,
                BTreeMap::from([
                    (PricedItem::ProjectBase(ProjectType::Landing), Decimal::from(180)),
                    (PricedItem::Maintenance(MaintenanceTier::Basic), Decimal::from(30)),
                    (PricedItem::Maintenance(MaintenanceTier::Pro), Decimal::from(55)),
                ]),
            ),
        ]);

        Self {
            currency: "USD".to_string(),
            regions,
            project_types,
            design,
            cms,
            commerce,
            seo,
            copy,
            animation,
            urgency,
            maintenance,
            limits: ScopeLimits {
                max_pages: 30,
                integration_cap: 20,
                extra_page_price: Decimal::from(50),
                integration_price: Decimal::from(40),
            },
            discount: DiscountPolicy {
                rate: Decimal::new(20, 2),
                codes: vec!["FIRST20".to_string()],
            },
            overrides,
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.currency.trim().is_empty() {
            return Err(invalid("catalog", "currency", "currency must not be empty"));
        }

        ensure_complete(&self.regions)?;
        ensure_complete(&self.project_types)?;
        ensure_complete(&self.design)?;
        ensure_complete(&self.cms)?;
        ensure_complete(&self.commerce)?;
        ensure_complete(&self.seo)?;
        ensure_complete(&self.copy)?;
        ensure_complete(&self.animation)?;
        ensure_complete(&self.urgency)?;
        ensure_complete(&self.maintenance)?;

        for (region, option) in &self.regions {
            if option.multiplier <= Decimal::ZERO || option.multiplier > Decimal::from(MAX_FACTOR) {
                return Err(invalid(
                    "region",
                    region.key(),
                    &format!("multiplier must be within (0, {MAX_FACTOR}]"),
                ));
            }
        }

        for (project_type, option) in &self.project_types {
            ensure_amount("project_type", project_type.key(), option.base_price)?;
            if option.base_pages > self.limits.max_pages {
                return Err(invalid(
                    "project_type",
                    project_type.key(),
                    &format!(
                        "base_pages ({}) exceeds limits.max_pages ({})",
                        option.base_pages, self.limits.max_pages
                    ),
                ));
            }
        }

        validate_factors(&self.design)?;
        validate_factors(&self.urgency)?;
        validate_amounts(&self.cms)?;
        validate_amounts(&self.commerce)?;
        validate_amounts(&self.seo)?;
        validate_amounts(&self.copy)?;
        validate_amounts(&self.animation)?;

        for (tier, option) in &self.maintenance {
            ensure_amount(MaintenanceTier::CATEGORY, tier.key(), option.monthly)?;
        }

        for (key, count) in
            [("max_pages", self.limits.max_pages), ("integration_cap", self.limits.integration_cap)]
        {
            if count > MAX_COUNT {
                return Err(invalid("limits", key, &format!("must not exceed {MAX_COUNT}")));
            }
        }
        ensure_amount("limits", "extra_page_price", self.limits.extra_page_price)?;
        ensure_amount("limits", "integration_price", self.limits.integration_price)?;

        if self.discount.rate < Decimal::ZERO || self.discount.rate > Decimal::ONE {
            return Err(invalid("discount", "rate", "rate must be within 0..=1"));
        }
        if self.discount.codes.iter().any(|code| code.trim().is_empty()) {
            return Err(invalid("discount", "codes", "coupon codes must not be blank"));
        }

        for (region, items) in &self.overrides {
            for (item, value) in items {
                let category = format!("overrides.{}.{}", region.key(), item.category().key());
                ensure_amount(&category, item.key(), *value)?;
            }
        }

        Ok(())
    }

    pub fn region_multiplier(&self, region: Region) -> Decimal {
        self.regions.get(&region).map(|option| option.multiplier).unwrap_or(Decimal::ONE)
    }

    /// Global table value before any regional adjustment.
    pub fn global_value(&self, item: PricedItem) -> Decimal {
        match item {
            PricedItem::ProjectBase(project_type) => self
                .project_types
                .get(&project_type)
                .map(|option| option.base_price)
                .unwrap_or(Decimal::ZERO),
            PricedItem::ExtraPage => self.limits.extra_page_price,
            PricedItem::Integration => self.limits.integration_price,
            PricedItem::Cms(tier) => amount_of(&self.cms, tier),
            PricedItem::Commerce(tier) => amount_of(&self.commerce, tier),
            PricedItem::Seo(tier) => amount_of(&self.seo, tier),
            PricedItem::Copy(tier) => amount_of(&self.copy, tier),
            PricedItem::Animation(tier) => amount_of(&self.animation, tier),
            PricedItem::Maintenance(tier) => self
                .maintenance
                .get(&tier)
                .map(|option| option.monthly)
                .unwrap_or(Decimal::ZERO),
        }
    }

    pub fn override_value(&self, item: PricedItem, region: Region) -> Option<Decimal> {
        self.overrides.get(&region).and_then(|items| items.get(&item)).copied()
    }

    /// Unrounded regional figure: the override when present, else global value times
    /// the region multiplier.
    pub fn unit_price(&self, item: PricedItem, region: Region) -> Decimal {
        self.override_value(item, region)
            .unwrap_or_else(|| self.global_value(item) * self.region_multiplier(region))
    }

    pub fn resolve_value(&self, item: PricedItem, region: Region) -> Decimal {
        round_currency(self.unit_price(item, region))
    }

    pub fn base_pages(&self, project_type: ProjectType) -> u32 {
        self.project_types.get(&project_type).map(|option| option.base_pages).unwrap_or(0)
    }

    pub fn clamp_pages(&self, project_type: ProjectType, pages: i64) -> u32 {
        let min = self.base_pages(project_type);
        let max = self.limits.max_pages.max(min);
        clamp_to(pages, min, max)
    }

    pub fn clamp_integrations(&self, integrations: i64) -> u32 {
        clamp_to(integrations, 0, self.limits.integration_cap)
    }

    pub fn design_factor(&self, tier: DesignTier) -> Decimal {
        self.design.get(&tier).map(|option| option.factor).unwrap_or(Decimal::ONE)
    }

    pub fn urgency_factor(&self, tier: UrgencyTier) -> Decimal {
        self.urgency.get(&tier).map(|option| option.factor).unwrap_or(Decimal::ONE)
    }

    pub fn region_label(&self, region: Region) -> String {
        label_of(&self.regions, region)
    }

    pub fn project_type_label(&self, project_type: ProjectType) -> String {
        label_of(&self.project_types, project_type)
    }

    pub fn feature_choice(
        &self,
        features: &FeatureSelection,
        category: FeatureCategory,
    ) -> FeatureChoice {
        let (option, label) = match category {
            FeatureCategory::Design => (features.design.key(), label_of(&self.design, features.design)),
            FeatureCategory::Cms => (features.cms.key(), label_of(&self.cms, features.cms)),
            FeatureCategory::Commerce => {
                (features.commerce.key(), label_of(&self.commerce, features.commerce))
            }
            FeatureCategory::Seo => (features.seo.key(), label_of(&self.seo, features.seo)),
            FeatureCategory::Copy => (features.copy.key(), label_of(&self.copy, features.copy)),
            FeatureCategory::Animation => {
                (features.animation.key(), label_of(&self.animation, features.animation))
            }
            FeatureCategory::Urgency => {
                (features.urgency.key(), label_of(&self.urgency, features.urgency))
            }
            FeatureCategory::Maintenance => {
                (features.maintenance.key(), label_of(&self.maintenance, features.maintenance))
            }
        };

        FeatureChoice { category, option, label }
    }

    pub fn is_recognized_coupon(&self, coupon: &str) -> bool {
        let coupon = coupon.trim();
        !coupon.is_empty() && self.discount.codes.iter().any(|code| code.eq_ignore_ascii_case(coupon))
    }

    /// Default state for a fresh session: every category at its default option and the
    /// page count at the default project type's included pages.
    pub fn initial_state(&self, region: Region) -> EstimatorState {
        let project_type = ProjectType::default();
        EstimatorState {
            scope: ScopeSelection {
                region,
                project_type,
                pages: self.base_pages(project_type),
                integrations: 0,
            },
            ..EstimatorState::default()
        }
    }
}

fn region(label: &str, description: &str, multiplier_hundredths: i64) -> RegionOption {
    RegionOption {
        label: label.to_string(),
        description: description.to_string(),
        multiplier: Decimal::new(multiplier_hundredths, 2),
    }
}

fn project(label: &str, description: &str, base_price: i64, base_pages: u32) -> ProjectTypeOption {
    ProjectTypeOption {
        label: label.to_string(),
        description: description.to_string(),
        base_price: Decimal::from(base_price),
        base_pages,
    }
}

fn multiplier(label: &str, description: &str, factor_hundredths: i64) -> MultiplierOption {
    MultiplierOption {
        label: label.to_string(),
        description: description.to_string(),
        factor: Decimal::new(factor_hundredths, 2),
    }
}

fn additive(label: &str, description: &str, amount: i64) -> AdditiveOption {
    AdditiveOption {
        label: label.to_string(),
        description: description.to_string(),
        amount: Decimal::from(amount),
    }
}

fn recurring(label: &str, description: &str, monthly: i64) -> RecurringOption {
    RecurringOption {
        label: label.to_string(),
        description: description.to_string(),
        monthly: Decimal::from(monthly),
    }
}

fn amount_of<T: OptionKey>(table: &BTreeMap<T, AdditiveOption>, key: T) -> Decimal {
    table.get(&key).map(|option| option.amount).unwrap_or(Decimal::ZERO)
}

fn label_of<T: OptionKey, E: CatalogEntry>(table: &BTreeMap<T, E>, key: T) -> String {
    table.get(&key).map(|entry| entry.label().to_string()).unwrap_or_else(|| key.key().to_string())
}

fn clamp_to(value: i64, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(i64::from(min), i64::from(max));
    u32::try_from(clamped).unwrap_or(min)
}

fn ensure_complete<T: OptionKey, E>(table: &BTreeMap<T, E>) -> Result<(), CatalogError> {
    match T::ALL.iter().find(|key| !table.contains_key(key)) {
        Some(missing) => Err(CatalogError::MissingEntry { category: T::CATEGORY, key: missing.key() }),
        None => Ok(()),
    }
}

/// Factors must be positive, bounded, and non-decreasing in tier order.
fn validate_factors<T: OptionKey>(table: &BTreeMap<T, MultiplierOption>) -> Result<(), CatalogError> {
    let mut previous: Option<Decimal> = None;
    for key in T::ALL {
        let Some(option) = table.get(key) else {
            continue;
        };
        if option.factor <= Decimal::ZERO || option.factor > Decimal::from(MAX_FACTOR) {
            return Err(invalid(
                T::CATEGORY,
                key.key(),
                &format!("factor must be within (0, {MAX_FACTOR}]"),
            ));
        }
        if previous.is_some_and(|lower| option.factor < lower) {
            return Err(invalid(
                T::CATEGORY,
                key.key(),
                "factor must not be lower than the previous tier",
            ));
        }
        previous = Some(option.factor);
    }
    Ok(())
}

fn validate_amounts<T: OptionKey>(table: &BTreeMap<T, AdditiveOption>) -> Result<(), CatalogError> {
    for (key, option) in table {
        ensure_amount(T::CATEGORY, key.key(), option.amount)?;
    }
    Ok(())
}

fn ensure_amount(category: &str, key: &str, value: Decimal) -> Result<(), CatalogError> {
    if value < Decimal::ZERO {
        return Err(invalid(category, key, "amount must not be negative"));
    }
    if value > Decimal::from(MAX_AMOUNT) {
        return Err(invalid(category, key, &format!("amount must not exceed {MAX_AMOUNT}")));
    }
    Ok(())
}

fn invalid(category: &str, key: &str, reason: &str) -> CatalogError {
    CatalogError::InvalidEntry {
        category: category.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
