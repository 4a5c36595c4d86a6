use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use tracing::{info, warn};

use estimo_core::config::AppConfig;
use estimo_core::estimator::export::{
    contact_link, format_money, render_message, whatsapp_link, QuoteDocument,
};
use estimo_core::estimator::persistence::StateStore;
use estimo_core::{
    AnimationTier, CmsTier, CommerceTier, CopyTier, DesignTier, EstimatorSession,
    MaintenanceTier, ProjectType, Region, RestoreReport, SelectionChange, SeoTier, UrgencyTier,
};
use estimo_db::{connect_with_settings, migrations, SqlStateStore, StateWriter};

use crate::commands::{
    current_thread_runtime, load_config, CommandResult, EXIT_CATALOG, EXIT_EXPORT, EXIT_OUTPUT,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Message,
    Whatsapp,
    Contact,
}

impl OutputFormat {
    fn name(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Message => "message",
            Self::Whatsapp => "whatsapp",
            Self::Contact => "contact",
        }
    }
}

/// Selections applied on top of the saved state, in the order listed here.
#[derive(Clone, Debug, Default, Args)]
pub struct QuoteArgs {
    #[arg(long, help = "Pricing region (global|co|ar|es)")]
    pub region: Option<Region>,
    #[arg(long, help = "Project type (landing|corporate|ecommerce|saas-mvp)")]
    pub project_type: Option<ProjectType>,
    #[arg(long, allow_hyphen_values = true, help = "Total page count; clamped to the allowed range")]
    pub pages: Option<i64>,
    #[arg(long, allow_hyphen_values = true, help = "Third-party integrations; clamped to the cap")]
    pub integrations: Option<i64>,
    #[arg(long)]
    pub design: Option<DesignTier>,
    #[arg(long)]
    pub cms: Option<CmsTier>,
    #[arg(long)]
    pub commerce: Option<CommerceTier>,
    #[arg(long)]
    pub seo: Option<SeoTier>,
    #[arg(long)]
    pub copy: Option<CopyTier>,
    #[arg(long)]
    pub animation: Option<AnimationTier>,
    #[arg(long)]
    pub urgency: Option<UrgencyTier>,
    #[arg(long)]
    pub maintenance: Option<MaintenanceTier>,
    #[arg(long, help = "Coupon code; matched case-insensitively after trimming")]
    pub coupon: Option<String>,
    #[arg(long, help = "Mark the quote as the customer's first project (true|false)")]
    pub first_project: Option<bool>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    #[arg(long, help = "Write the rendering to this file instead of stdout")]
    pub output: Option<PathBuf>,
    #[arg(long, help = "Ignore the saved state and start from defaults")]
    pub fresh: bool,
    #[arg(long, help = "Do not persist the resulting state")]
    pub no_save: bool,
}

impl QuoteArgs {
    fn changes(&self) -> Vec<SelectionChange> {
        let mut changes = Vec::new();
        if let Some(region) = self.region {
            changes.push(SelectionChange::Region(region));
        }
        if let Some(project_type) = self.project_type {
            changes.push(SelectionChange::ProjectType(project_type));
        }
        if let Some(pages) = self.pages {
            changes.push(SelectionChange::Pages(pages));
        }
        if let Some(integrations) = self.integrations {
            changes.push(SelectionChange::Integrations(integrations));
        }
        if let Some(tier) = self.design {
            changes.push(SelectionChange::Design(tier));
        }
        if let Some(tier) = self.cms {
            changes.push(SelectionChange::Cms(tier));
        }
        if let Some(tier) = self.commerce {
            changes.push(SelectionChange::Commerce(tier));
        }
        if let Some(tier) = self.seo {
            changes.push(SelectionChange::Seo(tier));
        }
        if let Some(tier) = self.copy {
            changes.push(SelectionChange::Copy(tier));
        }
        if let Some(tier) = self.animation {
            changes.push(SelectionChange::Animation(tier));
        }
        if let Some(tier) = self.urgency {
            changes.push(SelectionChange::Urgency(tier));
        }
        if let Some(tier) = self.maintenance {
            changes.push(SelectionChange::Maintenance(tier));
        }
        if let Some(first_project) = self.first_project {
            changes.push(SelectionChange::FirstProject(first_project));
        }
        if let Some(coupon) = &self.coupon {
            changes.push(SelectionChange::Coupon(coupon.clone()));
        }
        changes
    }
}

pub fn run(args: QuoteArgs) -> CommandResult {
    let config = match load_config("quote") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let catalog = match config.estimator.load_catalog() {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => {
            return CommandResult::failure("quote", "catalog", error.to_string(), EXIT_CATALOG);
        }
    };

    let runtime = match current_thread_runtime("quote") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    runtime.block_on(async move {
        let store = open_store(&config).await;

        let payload = match (&store, args.fresh) {
            (Some(store), false) => match store.load(&config.estimator.state_key).await {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(
                        event_name = "estimator.state.load_failed",
                        state_key = %config.estimator.state_key,
                        error = %error,
                        "could not load saved estimator state; starting from defaults"
                    );
                    None
                }
            },
            _ => None,
        };

        let (mut session, report) = EstimatorSession::restore(
            Arc::clone(&catalog),
            config.estimator.default_region,
            payload.as_deref(),
        );
        log_restore(&config.estimator.state_key, &report);

        for change in args.changes() {
            session.apply(change);
        }

        let rendered = match render(&config, &session, args.format) {
            Ok(rendered) => rendered,
            Err(message) => return CommandResult::failure("quote", "export", message, EXIT_EXPORT),
        };

        if let Some(store) = store.filter(|_| !args.no_save) {
            let writer = StateWriter::spawn(store, config.estimator.state_key.clone());
            writer.submit(session.state());
            let stats = writer.close().await;
            if stats.failed > 0 {
                warn!(
                    event_name = "estimator.state.not_persisted",
                    failed = stats.failed,
                    "estimator state was not persisted"
                );
            }
        }

        match &args.output {
            Some(path) => match fs::write(path, &rendered) {
                Ok(()) => CommandResult::success(
                    "quote",
                    format!("wrote {} quote to `{}`", args.format.name(), path.display()),
                ),
                Err(error) => CommandResult::failure(
                    "quote",
                    "output",
                    format!("failed to write `{}`: {error}", path.display()),
                    EXIT_OUTPUT,
                ),
            },
            None => CommandResult::rendered(rendered),
        }
    })
}

/// Persistence is optional: an unreachable database degrades to an unsaved quote.
async fn open_store(config: &AppConfig) -> Option<Arc<dyn StateStore>> {
    let pool = match connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    {
        Ok(pool) => pool,
        Err(error) => {
            warn!(
                event_name = "estimator.state.store_unavailable",
                error = %error,
                "database unavailable; quote will not be persisted"
            );
            return None;
        }
    };

    if let Err(error) = migrations::run_pending(&pool).await {
        warn!(
            event_name = "estimator.state.store_unavailable",
            error = %error,
            "database migrations failed; quote will not be persisted"
        );
        return None;
    }

    Some(Arc::new(SqlStateStore::new(pool)))
}

fn log_restore(state_key: &str, report: &RestoreReport) {
    if !report.payload_found {
        return;
    }
    info!(
        event_name = "estimator.state.restored",
        state_key = %state_key,
        malformed = report.malformed,
        discarded = report.discarded.len(),
        clamped = report.clamped.len(),
        "estimator state restored"
    );
    for field in &report.discarded {
        warn!(
            event_name = "estimator.state.field_discarded",
            state_key = %state_key,
            field = %field,
            "saved field was invalid and reset to its default"
        );
    }
}

fn render(
    config: &AppConfig,
    session: &EstimatorSession,
    format: OutputFormat,
) -> Result<String, String> {
    let document =
        QuoteDocument::build(session.catalog(), session.state(), session.breakdown(), Utc::now());

    match format {
        OutputFormat::Table => Ok(render_table(&document)),
        OutputFormat::Json => document.to_json_pretty().map_err(|error| error.to_string()),
        OutputFormat::Message => Ok(render_message(&document, &config.contact.greeting)),
        OutputFormat::Whatsapp => {
            let message = render_message(&document, &config.contact.greeting);
            whatsapp_link(&config.contact.whatsapp_phone, &message)
                .map(|url| url.to_string())
                .map_err(|error| error.to_string())
        }
        OutputFormat::Contact => contact_link(&config.contact.contact_url, &document)
            .map(|url| url.to_string())
            .map_err(|error| error.to_string()),
    }
}

fn render_table(document: &QuoteDocument) -> String {
    let breakdown = &document.breakdown;
    let money = |amount: Decimal| format_money(&document.currency, amount);
    let mut rows: Vec<(String, String)> = vec![
        ("Reference".to_string(), document.reference.clone()),
        (
            "Region".to_string(),
            format!("{} (x{})", document.region.label, breakdown.region_multiplier.normalize()),
        ),
        ("Project".to_string(), document.project_type.label.clone()),
        (
            "Pages".to_string(),
            format!(
                "{} ({} included, {} extra)",
                document.scope.pages, document.scope.included_pages, document.scope.extra_pages
            ),
        ),
        ("Base price".to_string(), money(breakdown.base_cost)),
        ("Extra pages".to_string(), money(breakdown.extra_pages_cost)),
    ];
    for item in &breakdown.feature_costs {
        rows.push((
            item.category.label().to_string(),
            format!("{} {}", money(item.amount), item.label),
        ));
    }
    rows.push((
        format!("Integrations ({})", breakdown.integrations),
        money(breakdown.integrations_cost),
    ));
    for multiplier in &breakdown.multipliers {
        rows.push((
            multiplier.category.label().to_string(),
            format!("x{} {}", multiplier.factor.normalize(), multiplier.label),
        ));
    }
    rows.push(("Subtotal".to_string(), money(breakdown.one_time_subtotal)));
    if breakdown.discount_applied() {
        rows.push((
            format!("Discount ({}%)", (breakdown.discount_rate * Decimal::ONE_HUNDRED).normalize()),
            format!("-{}", money(breakdown.discount_amount)),
        ));
    }
    rows.push(("Total".to_string(), money(breakdown.one_time_total)));
    rows.push(("Upfront".to_string(), money(breakdown.upfront_installment)));
    rows.push(("On delivery".to_string(), money(breakdown.delivery_installment)));
    rows.push((
        "Maintenance".to_string(),
        format!("{}/month", money(breakdown.monthly_maintenance)),
    ));

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.into_iter()
        .map(|(label, value)| format!("{label:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
