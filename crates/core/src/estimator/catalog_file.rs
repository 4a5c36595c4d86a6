use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::options::Region;
use crate::errors::DomainError;
use crate::estimator::catalog::{
    AdditiveOption, Catalog, CatalogError, DiscountPolicy, MultiplierOption, PriceCategory,
    PricedItem, ProjectTypeOption, RecurringOption, RegionOption, ScopeLimits,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default = "default_currency")]
    currency: String,
    limits: LimitsEntry,
    discount: DiscountEntry,
    regions: BTreeMap<String, RegionEntry>,
    project_types: BTreeMap<String, ProjectTypeEntry>,
    design: BTreeMap<String, FactorEntry>,
    cms: BTreeMap<String, AmountEntry>,
    commerce: BTreeMap<String, AmountEntry>,
    seo: BTreeMap<String, AmountEntry>,
    copy: BTreeMap<String, AmountEntry>,
    animation: BTreeMap<String, AmountEntry>,
    urgency: BTreeMap<String, FactorEntry>,
    maintenance: BTreeMap<String, MonthlyEntry>,
    #[serde(default)]
    overrides: BTreeMap<String, BTreeMap<String, BTreeMap<String, Decimal>>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LimitsEntry {
    max_pages: u32,
    integration_cap: u32,
    extra_page_price: Decimal,
    integration_price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiscountEntry {
    rate: Decimal,
    #[serde(default)]
    codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionEntry {
    label: String,
    #[serde(default)]
    description: String,
    multiplier: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectTypeEntry {
    label: String,
    #[serde(default)]
    description: String,
    base_price: Decimal,
    base_pages: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FactorEntry {
    label: String,
    #[serde(default)]
    description: String,
    factor: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AmountEntry {
    label: String,
    #[serde(default)]
    description: String,
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MonthlyEntry {
    label: String,
    #[serde(default)]
    description: String,
    monthly: Decimal,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Catalog {
    /// Parses an operator-authored catalog. The result is validated before it is returned.
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw).map_err(CatalogError::Parse)?;
        let catalog = file.into_catalog()?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        match Self::from_toml_str(&raw) {
            Err(CatalogError::Parse(source)) => {
                Err(CatalogError::ParseFile { path: path.to_path_buf(), source })
            }
            other => other,
        }
    }
}

impl CatalogFile {
    fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let regions = keyed(self.regions, |entry| RegionOption {
            label: entry.label,
            description: entry.description,
            multiplier: entry.multiplier,
        })?;
        let project_types = keyed(self.project_types, |entry| ProjectTypeOption {
            label: entry.label,
            description: entry.description,
            base_price: entry.base_price,
            base_pages: entry.base_pages,
        })?;

        let mut overrides = BTreeMap::new();
        for (region_key, categories) in self.overrides {
            let region = Region::from_str(&region_key)?;
            let mut items = BTreeMap::new();
            for (category_key, values) in categories {
                let category = PriceCategory::parse(&category_key)?;
                for (item_key, value) in values {
                    items.insert(PricedItem::parse(category, &item_key)?, value);
                }
            }
            overrides.insert(region, items);
        }

        Ok(Catalog {
            currency: self.currency,
            regions,
            project_types,
            design: keyed(self.design, factor_option)?,
            cms: keyed(self.cms, amount_option)?,
            commerce: keyed(self.commerce, amount_option)?,
            seo: keyed(self.seo, amount_option)?,
            copy: keyed(self.copy, amount_option)?,
            animation: keyed(self.animation, amount_option)?,
            urgency: keyed(self.urgency, factor_option)?,
            maintenance: keyed(self.maintenance, |entry| RecurringOption {
                label: entry.label,
                description: entry.description,
                monthly: entry.monthly,
            })?,
            limits: ScopeLimits {
                max_pages: self.limits.max_pages,
                integration_cap: self.limits.integration_cap,
                extra_page_price: self.limits.extra_page_price,
                integration_price: self.limits.integration_price,
            },
            discount: DiscountPolicy {
                rate: self.discount.rate,
                codes: self.discount.codes.into_iter().map(|code| code.trim().to_string()).collect(),
            },
            overrides,
        })
    }
}

fn keyed<K, E, O>(
    entries: BTreeMap<String, E>,
    convert: impl Fn(E) -> O,
) -> Result<BTreeMap<K, O>, CatalogError>
where
    K: FromStr<Err = DomainError> + Ord,
{
    entries
        .into_iter()
        .map(|(key, entry)| -> Result<(K, O), CatalogError> {
            Ok((K::from_str(&key)?, convert(entry)))
        })
        .collect()
}

fn factor_option(entry: FactorEntry) -> MultiplierOption {
    MultiplierOption { label: entry.label, description: entry.description, factor: entry.factor }
}

fn amount_option(entry: AmountEntry) -> AdditiveOption {
    AdditiveOption { label: entry.label, description: entry.description, amount: entry.amount }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use crate::domain::options::{ProjectType, Region};
    use crate::estimator::catalog::{Catalog, CatalogError, PricedItem};

    const SAMPLE: &str = r#"
currency = "USD"

[limits]
max_pages = 12
integration_cap = 4
extra_page_price = 70
integration_price = "35.5"

[discount]
rate = "0.1"
codes = ["WELCOME10"]

[regions.global]
label = "International"
multiplier = "1.0"
[regions.co]
label = "Colombia"
multiplier = "0.8"
[regions.ar]
label = "Argentina"
multiplier = "0.7"
[regions.es]
label = "Spain"
multiplier = "1.2"

[project_types.landing]
label = "Landing"
base_price = 200
base_pages = 1
[project_types.corporate]
label = "Corporate"
base_price = 500
base_pages = 4
[project_types.ecommerce]
label = "Store"
base_price = 900
base_pages = 6
[project_types.saas-mvp]
label = "MVP"
base_price = 1500
base_pages = 8

[design.basic]
label = "Basic"
factor = "1"
[design.pro]
label = "Pro"
factor = "1.2"
[design.premium]
label = "Premium"
factor = "1.5"

[cms.none]
label = "None"
amount = 0
[cms.headless]
label = "Headless"
amount = 120
[cms.full]
label = "Full"
amount = 260

[commerce.none]
label = "None"
amount = 0
[commerce.lite]
label = "Lite"
amount = 250
[commerce.pro]
label = "Pro"
amount = 500

[seo.none]
label = "None"
amount = 0
[seo.basic]
label = "Basic"
amount = 90
[seo.advanced]
label = "Advanced"
amount = 180

[copy.none]
label = "None"
amount = 0
[copy.basic]
label = "Basic"
amount = 50
[copy.full]
label = "Full"
amount = 140

[animation.none]
label = "None"
amount = 0
[animation.subtle]
label = "Subtle"
amount = 40
[animation.advanced]
label = "Advanced"
amount = 110

[urgency.normal]
label = "Normal"
factor = "1"
[urgency.fast]
label = "Fast"
factor = "1.25"
[urgency.express]
label = "Express"
factor = "1.5"

[maintenance.none]
label = "None"
monthly = 0
[maintenance.basic]
label = "Basic"
monthly = 30
[maintenance.pro]
label = "Pro"
monthly = 60

[overrides.co.base]
landing = 150
[overrides.es.extra_page]
unit = 90
"#;

    #[test]
    fn parses_complete_catalog_with_overrides() {
        let catalog = Catalog::from_toml_str(SAMPLE).expect("sample catalog parses");

        assert_eq!(catalog.limits.max_pages, 12);
        assert_eq!(catalog.limits.integration_price, Decimal::new(355, 1));
        assert_eq!(catalog.discount.codes, vec!["WELCOME10".to_string()]);
        assert_eq!(
            catalog.resolve_value(PricedItem::ProjectBase(ProjectType::Landing), Region::Co),
            Decimal::from(150)
        );
        assert_eq!(catalog.resolve_value(PricedItem::ExtraPage, Region::Es), Decimal::from(90));
        assert_eq!(catalog.project_type_label(ProjectType::SaasMvp), "MVP");
    }

    #[test]
    fn unknown_option_key_is_named_in_error() {
        let raw = SAMPLE.replace("[cms.headless]", "[cms.wordpress]");
        let error = Catalog::from_toml_str(&raw).expect_err("unknown cms key");

        assert!(matches!(error, CatalogError::UnknownKey(_)));
        assert!(error.to_string().contains("wordpress"));
    }

    #[test]
    fn missing_option_is_rejected_by_validation() {
        let raw = SAMPLE.replace("[maintenance.pro]\nlabel = \"Pro\"\nmonthly = 60\n", "");
        let error = Catalog::from_toml_str(&raw).expect_err("missing maintenance pro");

        assert!(matches!(
            error,
            CatalogError::MissingEntry { category: "maintenance", key: "pro" }
        ));
    }

    #[test]
    fn unknown_override_category_is_rejected() {
        let raw = SAMPLE.replace("[overrides.es.extra_page]", "[overrides.es.hosting]");
        let error = Catalog::from_toml_str(&raw).expect_err("unknown override category");
        assert!(error.to_string().contains("hosting"));
    }

    #[test]
    fn load_from_path_reports_parse_errors_with_path() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("catalog.toml");
        fs::write(&path, "currency = ").expect("write catalog");

        let error = Catalog::from_toml_path(&path).expect_err("broken toml");
        assert!(matches!(error, CatalogError::ParseFile { .. }));
        assert!(error.to_string().contains("catalog.toml"));
    }

    #[test]
    fn load_from_path_reads_valid_file() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("catalog.toml");
        fs::write(&path, SAMPLE).expect("write catalog");

        let catalog = Catalog::from_toml_path(&path).expect("catalog loads");
        assert_eq!(catalog.region_multiplier(Region::Es), Decimal::new(12, 1));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let temp_dir = TempDir::new().expect("temp dir");
        let error = Catalog::from_toml_path(&temp_dir.path().join("absent.toml"))
            .expect_err("missing file");
        assert!(matches!(error, CatalogError::ReadFile { .. }));
    }

    #[test]
    fn urgency_factors_that_drop_with_tier_are_rejected_on_load() {
        let express = "[urgency.express]\nlabel = \"Express\"\nfactor = \"1.5\"";
        assert!(SAMPLE.contains(express), "sample should contain the express urgency entry");
        let inverted =
            SAMPLE.replace(express, "[urgency.express]\nlabel = \"Express\"\nfactor = \"1.1\"");

        let error = Catalog::from_toml_str(&inverted).expect_err("express cheaper than fast");
        assert!(error.to_string().contains("urgency.express"));
    }
}
