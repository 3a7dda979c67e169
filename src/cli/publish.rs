//! Resolution and publication commands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Local;
use console::style;

use dealwire::config::Settings;
use dealwire::links::LinkClassifier;
use dealwire::models::ResolvedDeal;
use dealwire::pipeline::{DealResolver, DealSelector, Selection};
use dealwire::publish::{PublishOutcome, SectionPublisher};
use dealwire::scrapers::{parse_listing, HttpClient, PageFetcher};
use dealwire::storage::{latest_records, load_records, save_records};
use dealwire::translate::GlossaryTranslator;

fn publisher(settings: &Settings) -> anyhow::Result<SectionPublisher> {
    Ok(SectionPublisher::new(
        &settings.section_id,
        &settings.anchor_id,
        settings.labels.clone(),
    )?)
}

fn selector(settings: &Settings) -> DealSelector {
    let classifier = LinkClassifier::for_base_url(&settings.base_url)
        .with_trusted_domains(&settings.trusted_domains);
    DealSelector::new(classifier, settings.required_deals)
}

fn backup_dir(settings: &Settings) -> Option<PathBuf> {
    settings.backup.then(|| settings.backups_dir())
}

fn records_or_latest(settings: &Settings, records: Option<&Path>) -> anyhow::Result<PathBuf> {
    match records {
        Some(path) => Ok(path.to_path_buf()),
        None => latest_records(&settings.data_dir).with_context(|| {
            format!(
                "No deal records in {}; run `dealwire run` first",
                settings.data_dir.display()
            )
        }),
    }
}

fn print_selection(selection: &Selection) {
    println!(
        "{} {} real deals found, {} required, {} selected",
        style("→").cyan(),
        selection.total_real,
        selection.required,
        selection.chosen.len()
    );
    for deal in &selection.chosen {
        println!("  {} {}", style("•").dim(), deal.title);
        println!("    {}", style(&deal.url).dim());
    }
}

fn print_outcome(outcome: &PublishOutcome) {
    println!(
        "{} {} {} ({} deals)",
        style("✓").green(),
        outcome.action,
        outcome.document.display(),
        outcome.section.deal_count
    );
    if let Some(ref backup) = outcome.backup {
        println!("  Backup: {}", backup.display());
    }
}

/// Full pipeline: listing, resolution, records, selection, publication.
pub async fn cmd_run(settings: &Settings, listing: Option<&str>, dry_run: bool) -> anyhow::Result<()> {
    let client = HttpClient::with_user_agent(
        settings.request_timeout(),
        Some(settings.base_url.as_str()),
        settings.user_agent.as_deref(),
    )?;

    let listing_url = listing.unwrap_or(&settings.base_url);
    println!("{} Fetching {}", style("→").cyan(), listing_url);
    let body = client
        .fetch(listing_url)
        .await
        .with_context(|| format!("Failed to fetch listing {}", listing_url))?;

    let candidates = parse_listing(&body, &settings.base_url);
    if candidates.is_empty() {
        bail!("No deals found on {}", listing_url);
    }
    println!(
        "{} {} candidates, resolving up to {}",
        style("→").cyan(),
        candidates.len(),
        settings.max_candidates
    );

    let resolver = DealResolver::new(client, settings.resolver_config());
    let report = resolver.resolve_all(&candidates).await;
    for rejection in &report.rejected {
        println!(
            "  {} {} ({}: {})",
            style("✗").red(),
            rejection.title,
            rejection.stage(),
            rejection.error
        );
    }

    let deals: Vec<ResolvedDeal> = if settings.translate {
        let mut translator = GlossaryTranslator::new();
        report
            .deals
            .iter()
            .map(|deal| translator.translate_deal(deal))
            .collect()
    } else {
        report.deals
    };

    let records = save_records(&settings.data_dir, &deals, Local::now())?;
    println!(
        "{} Saved {} deals to {}",
        style("✓").green(),
        deals.len(),
        records.display()
    );

    let selection = selector(settings).select(&deals);
    print_selection(&selection);

    if dry_run {
        println!("{} Dry run, document not modified", style("!").yellow());
        return Ok(());
    }

    let outcome = publisher(settings)?.publish(
        &selection,
        &settings.document,
        backup_dir(settings).as_deref(),
    )?;
    print_outcome(&outcome);
    Ok(())
}

/// Re-publish saved records.
pub fn cmd_publish(settings: &Settings, records: Option<&Path>) -> anyhow::Result<()> {
    let path = records_or_latest(settings, records)?;
    let deals = load_records(&path)?;
    println!(
        "{} Loaded {} deals from {}",
        style("→").cyan(),
        deals.len(),
        path.display()
    );

    let selection = selector(settings).select(&deals);
    print_selection(&selection);

    let outcome = publisher(settings)?.publish(
        &selection,
        &settings.document,
        backup_dir(settings).as_deref(),
    )?;
    print_outcome(&outcome);
    Ok(())
}

/// Print the fragment for saved records without touching the document.
pub fn cmd_render(settings: &Settings, records: Option<&Path>) -> anyhow::Result<()> {
    let path = records_or_latest(settings, records)?;
    let deals = load_records(&path)?;
    let selection = selector(settings).select(&deals);
    let section = publisher(settings)?.render(&selection.chosen);
    println!("{}", section.html);
    Ok(())
}
