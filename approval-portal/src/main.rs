use anyhow::{anyhow, Context, Result};
use approval_portal::models::{Approver, DocumentType};
use approval_portal::services::{get_metrics, init_metrics};
use approval_portal::Portal;
use portal_core::config::PortalSettings;
use portal_core::observability::init_tracing;

const USAGE: &str = "usage: approval-portal <AR|CA|RE> <staging-id> <user-id> [--metrics]";

/// Open one document as a user and print what they would see.
#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [doc_type, staging_id, user_id, rest @ ..] = args.as_slice() else {
        return Err(anyhow!(USAGE));
    };
    let document_type = DocumentType::from_code(doc_type)
        .ok_or_else(|| anyhow!("unknown document type '{}'\n{}", doc_type, USAGE))?;
    let print_metrics = rest.iter().any(|a| a == "--metrics");

    let settings = PortalSettings::load().context("Failed to load configuration")?;
    init_tracing("approval-portal", &settings.logging);
    init_metrics();

    let portal = Portal::build(settings, None).context("Failed to configure portal")?;
    let viewer = Approver::new(user_id.as_str(), user_id.as_str());
    let session = portal
        .open(document_type, staging_id, viewer)
        .await
        .with_context(|| format!("Failed to open {} {}", document_type.code(), staging_id))?;

    let document = session.document();
    println!("{} {}", document.document_type.code(), document.document_number);
    println!("  status:   {}", document.status());
    match document.pending_level() {
        Some(level) => println!("  awaiting: {}", level.as_str()),
        None => println!("  awaiting: nothing (final)"),
    }
    println!("  total:    {} {}", document.currency_code, session.formatted_total());
    println!("  actions:  {:?}", session.available_actions());

    for line in session.lines() {
        let item = line.item();
        let marker = if line.is_account_historical() { " (Historical)" } else { "" };
        println!(
            "  line {}: {} / {}{} [{}] {}",
            line.index() + 1,
            item.category,
            item.account_name,
            marker,
            item.gl_account_code,
            approval_portal::services::currency::format(item.amount)
        );
    }

    if let Some(e) = session.approvers_error() {
        println!("  approvers unavailable: {}", e);
    }
    if let Some(candidates) = session.approvers() {
        for level in document.route() {
            let names: Vec<&str> = candidates
                .for_level(level)
                .iter()
                .map(|a| a.display_name())
                .collect();
            println!("  {:<12} {}", level.as_str(), names.join(", "));
        }
    }

    if print_metrics {
        println!("{}", get_metrics());
    }
    Ok(())
}
