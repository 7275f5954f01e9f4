use crate::infra::{demo_applications, InMemoryDocumentStore, InMemoryExportService};
use admission_review::config::ReviewConfig;
use admission_review::error::AppError;
use admission_review::workflows::review::{
    is_export_eligible, ApplicationId, CommitOutcome, CommitSummary, DocumentReviewService,
    DocumentType, ExportKind, PresetConfirmation, ReviewDecision, ReviewServiceError,
    ReviewSession,
};
use clap::Args;
use std::sync::Arc;

type DemoService = DocumentReviewService<InMemoryDocumentStore, InMemoryExportService>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the export portion of the walkthrough.
    #[arg(long)]
    pub(crate) skip_export: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = DocumentReviewService::new(
        Arc::new(InMemoryDocumentStore::seeded(demo_applications())),
        Arc::new(InMemoryExportService::new("https://files.admissions.local")),
        ReviewConfig::default(),
    );

    println!("Admission document review demo");
    render_queue_counts(&service).await?;

    let mut session = service.open_session(&application("APP-1002")).await?;
    render_session("Fresh submission", &session);

    let partial = service.open_session(&application("APP-1003")).await?;
    render_session("Partially reviewed", &partial);

    println!("\nRejecting the photo without remarks");
    session
        .stage(DocumentType::new("photo"), ReviewDecision::Reject, Some(""))
        .map_err(ReviewServiceError::from)?;
    match service.commit(&mut session, &PresetConfirmation(true)).await {
        Ok(_) => println!("- unexpected: commit accepted"),
        Err(err) => println!("- blocked: {err}"),
    }

    println!("\nCommitting a mixed batch");
    session
        .stage(
            DocumentType::new("photo"),
            ReviewDecision::Reject,
            Some("Photo is too dark"),
        )
        .map_err(ReviewServiceError::from)?;
    session
        .stage(DocumentType::new("passport"), ReviewDecision::Approve, None)
        .map_err(ReviewServiceError::from)?;
    let confirm = |summary: &CommitSummary| {
        println!("- confirmation: {summary}");
        true
    };
    match service.commit(&mut session, &confirm).await? {
        CommitOutcome::Committed(receipt) => {
            println!(
                "- committed; {} is now {}",
                receipt.application.application_id,
                receipt.review_class.label()
            );
            for document in &receipt.application.documents {
                println!(
                    "  - {}: {} ({})",
                    document.document_type,
                    document.status.label(),
                    document.remarks.as_deref().unwrap_or("no remarks")
                );
            }
        }
        CommitOutcome::Declined { summary } => println!("- declined: {summary}"),
        CommitOutcome::RefreshFailed {
            application_id,
            reason,
            ..
        } => println!("- committed; {application_id} could not be re-read: {reason}"),
    }

    if !args.skip_export {
        println!("\nExports");
        let mut empty = service.open_session(&application("APP-1001")).await?;
        empty.open_export();
        match service.request_export(&empty, ExportKind::Pdf).await {
            Ok(handle) => println!("- unexpected export: {}", handle.url),
            Err(err) => println!("- {}: {err}", empty.application_id()),
        }

        let mut approved = service.open_session(&application("APP-1004")).await?;
        let selected = approved.open_export().selected().len();
        let handle = service.request_export(&approved, ExportKind::Zip).await?;
        println!(
            "- {}: {selected} documents bundled at {}",
            handle.application_id, handle.url
        );
    }

    render_queue_counts(&service).await?;
    Ok(())
}

fn application(id: &str) -> ApplicationId {
    ApplicationId(id.to_string())
}

fn render_session(heading: &str, session: &ReviewSession) {
    let application = session.application();
    println!(
        "\n{heading}: {} ({} documents)",
        application.application_id,
        application.documents.len()
    );
    println!(
        "- class {} | export eligible: {}",
        session.review_class().label(),
        is_export_eligible(application)
    );
}

async fn render_queue_counts(service: &DemoService) -> Result<(), AppError> {
    let reconciled = service.queue_counts().await?;
    println!("\nReview queues ({:?} figures)", reconciled.source);
    for (class, count) in reconciled.counts.entries() {
        println!("  - {}: {count}", class.label());
    }
    Ok(())
}
