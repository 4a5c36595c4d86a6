use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::options::{
    FeatureCategory, MaintenanceTier, OptionKey, ProjectType, Region,
};
use crate::estimator::catalog::{
    AdditiveOption, Catalog, CatalogEntry, MultiplierOption, PricedItem,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionView {
    pub key: String,
    pub label: String,
    pub note: String,
    pub multiplier: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTypeView {
    pub key: String,
    pub label: String,
    pub description: String,
    pub base_price: Decimal,
    pub base_pages: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptionEffect {
    Additive { amount: Decimal },
    Multiplier { factor: Decimal },
    Monthly { amount: Decimal },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub key: String,
    pub label: String,
    pub description: String,
    pub effect: OptionEffect,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCategoryView {
    pub category: FeatureCategory,
    pub label: String,
    pub options: Vec<OptionView>,
}

/// Every option priced for one region, ready for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogView {
    pub currency: String,
    pub region: RegionView,
    pub regions: Vec<RegionView>,
    pub project_types: Vec<ProjectTypeView>,
    pub extra_page_price: Decimal,
    pub integration_price: Decimal,
    pub max_pages: u32,
    pub integration_cap: u32,
    pub features: Vec<FeatureCategoryView>,
    pub discount_rate: Decimal,
    pub discount_codes: Vec<String>,
}

impl Catalog {
    pub fn view(&self, region: Region) -> CatalogView {
        let regions: Vec<RegionView> = self
            .regions
            .iter()
            .map(|(key, option)| RegionView {
                key: key.key().to_string(),
                label: option.label.clone(),
                note: option.description.clone(),
                multiplier: option.multiplier.normalize(),
            })
            .collect();
        let selected = regions
            .iter()
            .find(|view| view.key == region.key())
            .cloned()
            .unwrap_or_else(|| RegionView {
                key: region.key().to_string(),
                label: region.key().to_string(),
                note: String::new(),
                multiplier: Decimal::ONE,
            });

        let project_types = ProjectType::ALL
            .iter()
            .filter_map(|project_type| {
                self.project_types.get(project_type).map(|option| ProjectTypeView {
                    key: project_type.key().to_string(),
                    label: option.label.clone(),
                    description: option.description.clone(),
                    base_price: self.resolve_value(PricedItem::ProjectBase(*project_type), region),
                    base_pages: option.base_pages,
                })
            })
            .collect();

        let features = FeatureCategory::ALL
            .into_iter()
            .map(|category| FeatureCategoryView {
                category,
                label: category.label().to_string(),
                options: self.category_options(category, region),
            })
            .collect();

        CatalogView {
            currency: self.currency.clone(),
            region: selected,
            regions,
            project_types,
            extra_page_price: self.resolve_value(PricedItem::ExtraPage, region),
            integration_price: self.resolve_value(PricedItem::Integration, region),
            max_pages: self.limits.max_pages,
            integration_cap: self.limits.integration_cap,
            features,
            discount_rate: self.discount.rate.normalize(),
            discount_codes: self.discount.codes.clone(),
        }
    }

    fn category_options(&self, category: FeatureCategory, region: Region) -> Vec<OptionView> {
        match category {
            FeatureCategory::Design => factor_views(&self.design),
            FeatureCategory::Urgency => factor_views(&self.urgency),
            FeatureCategory::Cms => self.additive_views(&self.cms, region, PricedItem::Cms),
            FeatureCategory::Commerce => {
                self.additive_views(&self.commerce, region, PricedItem::Commerce)
            }
            FeatureCategory::Seo => self.additive_views(&self.seo, region, PricedItem::Seo),
            FeatureCategory::Copy => self.additive_views(&self.copy, region, PricedItem::Copy),
            FeatureCategory::Animation => {
                self.additive_views(&self.animation, region, PricedItem::Animation)
            }
            FeatureCategory::Maintenance => MaintenanceTier::ALL
                .iter()
                .filter_map(|tier| {
                    self.maintenance.get(tier).map(|option| {
                        let amount = if *tier == MaintenanceTier::None {
                            Decimal::ZERO
                        } else {
                            self.resolve_value(PricedItem::Maintenance(*tier), region)
                        };
                        option_view(*tier, option, OptionEffect::Monthly { amount })
                    })
                })
                .collect(),
        }
    }

    fn additive_views<T: OptionKey>(
        &self,
        table: &BTreeMap<T, AdditiveOption>,
        region: Region,
        item: fn(T) -> PricedItem,
    ) -> Vec<OptionView> {
        T::ALL
            .iter()
            .filter_map(|key| {
                table.get(key).map(|option| {
                    let amount = self.resolve_value(item(*key), region);
                    option_view(*key, option, OptionEffect::Additive { amount })
                })
            })
            .collect()
    }
}

fn factor_views<T: OptionKey>(table: &BTreeMap<T, MultiplierOption>) -> Vec<OptionView> {
    T::ALL
        .iter()
        .filter_map(|key| {
            table.get(key).map(|option| {
                option_view(*key, option, OptionEffect::Multiplier { factor: option.factor.normalize() })
            })
        })
        .collect()
}

fn option_view<T: OptionKey>(key: T, entry: &impl CatalogEntry, effect: OptionEffect) -> OptionView {
    OptionView {
        key: key.key().to_string(),
        label: entry.label().to_string(),
        description: entry.description().to_string(),
        effect,
    }
}
