//! One-off inspection commands.

use console::style;

use dealwire::config::Settings;
use dealwire::links::{LinkClassifier, LinkVerdict};
use dealwire::models::CandidateDeal;
use dealwire::pipeline::DealResolver;
use dealwire::scrapers::HttpClient;

/// Resolve one detail URL end to end.
pub async fn cmd_resolve(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let client = HttpClient::with_user_agent(
        settings.request_timeout(),
        Some(settings.base_url.as_str()),
        settings.user_agent.as_deref(),
    )?;
    let resolver = DealResolver::new(client, settings.resolver_config());

    match resolver.resolve_one(&CandidateDeal::new(url, url)).await {
        Ok(deal) => {
            println!("{} {}", style("✓").green(), style(&deal.url).bold());
            println!("  {:<12} {}", "Merchant:", deal.merchant);
            println!("  {:<12} {}", "Source:", deal.source_url);
            if let Some(confidence) = deal.confidence {
                println!("  {:<12} {}", "Confidence:", confidence.as_str());
            }
        }
        Err(e) => {
            println!(
                "{} {} ({})",
                style("✗").red(),
                e,
                style(format!("stage: {}", e.stage())).dim()
            );
        }
    }
    Ok(())
}

/// Print the classifier verdict for each URL.
pub fn cmd_classify(settings: &Settings, urls: &[String]) -> anyhow::Result<()> {
    let classifier = LinkClassifier::for_base_url(&settings.base_url)
        .with_trusted_domains(&settings.trusted_domains);

    for url in urls {
        let verdict = classifier.classify(url);
        let label = match verdict {
            LinkVerdict::Denied(reason) => style(format!("denied: {}", reason)).red(),
            LinkVerdict::AllowedByDomain => style("allowed (domain)".to_string()).green(),
            LinkVerdict::AllowedByKeyword => style("allowed (keyword)".to_string()).green(),
            LinkVerdict::AllowedByFallback => style("allowed (fallback)".to_string()).yellow(),
        };
        println!("{}  {}", label, url);
    }
    Ok(())
}
