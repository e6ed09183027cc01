use anyhow::{Context as AnyhowContext, Result, bail};
use catalog::Catalog;
use colored::Colorize;
use declarative::ConfirmCallback;

use crate::Context;
use crate::cli::SyncArgs;
use crate::config::Config;
use crate::document::Document;
use crate::engine::{Executor, PlanOptions, Status, SyncOptions, SyncPlan, SyncReport};
use crate::paths;
use crate::progress::SyncProgress;
use crate::ui;

pub fn run(ctx: &Context, args: SyncArgs) -> Result<()> {
    let config = effective_config(Config::load()?, ctx, &args);
    let catalog = Catalog::http(config.catalog.http_config()?);

    let Some(report) = run_with(ctx, &catalog, &config, &args, &mut PromptConfirm)? else {
        return Ok(());
    };

    if !report.is_success() {
        for outcome in report.failures() {
            ui::error(&format!("{}: {}", outcome.identity, outcome.status));
            if let Some(category) = outcome.category {
                ui::dim(&format!("  {}", category.advice()));
            }
        }
        bail!(
            "{} of {} resources failed",
            report.summary.failed,
            report.summary.total()
        );
    }
    Ok(())
}

/// File config with environment and CLI overrides applied
fn effective_config(mut config: Config, ctx: &Context, args: &SyncArgs) -> Config {
    if let Some(base_url) = &ctx.base_url {
        config.catalog.base_url = Some(base_url.clone());
    }
    if let Some(token) = &ctx.token {
        config.catalog.token = Some(token.clone());
    }
    if let Some(domain) = &args.domain {
        config.sync.domain = Some(domain.clone());
    }
    if let Some(bump) = args.bump {
        config.sync.bump_strategy = bump.into();
    }
    if let Some(state) = args.state {
        config.sync.target_state = state.into();
    }
    if let Some(retries) = args.retries {
        config.sync.retries = retries;
    }
    config
}

/// Plan, confirm and execute a sync against `catalog`
///
/// Returns `None` when the user declined.
fn run_with(
    ctx: &Context,
    catalog: &Catalog,
    config: &Config,
    args: &SyncArgs,
    confirm: &mut dyn ConfirmCallback,
) -> Result<Option<SyncReport>> {
    let path = paths::expand(&args.document.to_string_lossy());
    let document = Document::load(&path)?;

    let options = PlanOptions {
        domain: config.sync.domain.clone(),
        bump: config.sync.bump_strategy,
        target_state: config.sync.target_state,
        shared_events: config.sync.shared_events,
        broker_type: config.sync.broker_type.clone(),
    };
    let plan = SyncPlan::from_document(&document, options)
        .with_context(|| format!("Could not plan {}", path.display()))?;

    if !ctx.quiet {
        print_plan(&plan, args.dry_run);
    }

    if !args.dry_run && !args.yes {
        let prompt = format!("Sync {} resources?", plan.resource_count());
        if !confirm.confirm(&prompt)? {
            println!();
            ui::warn("Aborted, no changes made");
            return Ok(None);
        }
    }

    let sync_options = SyncOptions {
        dry_run: args.dry_run,
        retry: config.sync.retry(),
    };

    let mut progress = SyncProgress::new(ctx.quiet);
    let report = Executor::new(catalog, sync_options, &mut progress).execute(&plan);
    progress.finish();
    log::debug!("{} resources reconciled", progress.completed());

    if !ctx.quiet {
        print_report(&report, args.show_diff || ctx.verbose > 0);
    }
    Ok(Some(report))
}

struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(std::io::Error::other)
    }
}

fn print_plan(plan: &SyncPlan, dry_run: bool) {
    ui::header(if dry_run {
        "Catalog Sync (dry run)"
    } else {
        "Catalog Sync"
    });
    ui::kv("Domain", &plan.domain.name);
    ui::kv("Version", &plan.version);
    ui::kv(
        "Resources",
        &format!(
            "{} enums, {} schemas, {} events",
            plan.enums.len(),
            plan.schemas.len(),
            plan.events.len()
        ),
    );
    ui::kv("Target state", plan.options.target_state.name());
    ui::kv("Bump", &plan.options.bump.to_string());
    println!();
}

fn print_report(report: &SyncReport, show_diff: bool) {
    for outcome in &report.outcomes {
        let symbol = match outcome.status {
            Status::Created | Status::Updated => "✓".green(),
            Status::Unchanged => "○".dimmed(),
            Status::WouldCreate => "+".green(),
            Status::WouldUpdate => "~".yellow(),
            Status::Skipped(_) => "⊘".yellow(),
            Status::Failed(_) => "✗".red(),
        };
        let status = match &outcome.status {
            Status::Failed(_) => outcome.status.to_string().red(),
            other => other.to_string().dimmed(),
        };
        println!("  {} {:<50} {}", symbol, outcome.identity.to_string(), status);

        if show_diff && let Some(difference) = &outcome.difference {
            ui::diff_lines(&difference.render());
        }
    }

    let summary = &report.summary;
    println!();
    if report.dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.is_success() && summary.total_changes() == 0 {
        println!("  {} Catalog already in sync", "✓".green().bold());
    } else if summary.is_success() {
        println!("  {} Catalog is in sync!", "✓".green().bold());
    } else {
        println!("  {} Sync finished with errors", "⚠".yellow().bold());
    }

    let (created, updated) = if report.dry_run {
        ("would be created", "would be updated")
    } else {
        ("created", "updated")
    };
    if summary.created > 0 {
        println!("    • {} resources {created}", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} resources {updated}", summary.updated);
    }
    if summary.unchanged > 0 {
        println!("    • {} resources unchanged", summary.unchanged);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed or skipped", summary.failed, "resources".red());
    }
}
