use rust_decimal::Decimal;

use estimo_core::estimator::catalog_view::{CatalogView, OptionEffect};
use estimo_core::estimator::export::format_money;
use estimo_core::Region;

use crate::commands::{load_config, CommandResult, EXIT_CATALOG, EXIT_EXPORT};

pub fn run(region: Option<Region>, json_output: bool) -> CommandResult {
    let config = match load_config("catalog") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let catalog = match config.estimator.load_catalog() {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure("catalog", "catalog", error.to_string(), EXIT_CATALOG);
        }
    };

    let view = catalog.view(region.unwrap_or(config.estimator.default_region));

    if json_output {
        return match serde_json::to_string_pretty(&view) {
            Ok(rendered) => CommandResult::rendered(rendered),
            Err(error) => {
                CommandResult::failure("catalog", "serialization", error.to_string(), EXIT_EXPORT)
            }
        };
    }

    CommandResult::rendered(render_human(&view))
}

fn render_human(view: &CatalogView) -> String {
    let money = |amount: Decimal| format_money(&view.currency, amount);
    let mut lines = Vec::new();

    let note = if view.region.note.is_empty() {
        String::new()
    } else {
        format!(": {}", view.region.note)
    };
    lines.push(format!("Prices for {} (x{}){note}", view.region.label, view.region.multiplier));

    lines.push(String::new());
    lines.push("Regions".to_string());
    for region in &view.regions {
        lines.push(format!("  {:<8} {} (x{})", region.key, region.label, region.multiplier));
    }

    lines.push(String::new());
    lines.push("Project types".to_string());
    for project_type in &view.project_types {
        lines.push(format!(
            "  {:<10} {:<22} {} incl. {} page(s)",
            project_type.key,
            project_type.label,
            money(project_type.base_price),
            project_type.base_pages
        ));
    }

    lines.push(String::new());
    lines.push("Scope".to_string());
    lines.push(format!(
        "  extra page {} (max {} pages)",
        money(view.extra_page_price),
        view.max_pages
    ));
    lines.push(format!(
        "  integration {} (max {})",
        money(view.integration_price),
        view.integration_cap
    ));

    for category in &view.features {
        lines.push(String::new());
        lines.push(category.label.clone());
        for option in &category.options {
            let effect = match &option.effect {
                OptionEffect::Additive { amount } => format!("+{}", money(*amount)),
                OptionEffect::Multiplier { factor } => format!("x{factor}"),
                OptionEffect::Monthly { amount } => format!("{}/month", money(*amount)),
            };
            lines.push(format!("  {:<10} {:<22} {effect}", option.key, option.label));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Discount {}% (first project or codes: {})",
        (view.discount_rate * Decimal::ONE_HUNDRED).normalize(),
        view.discount_codes.join(", ")
    ));

    lines.join("\n")
}
