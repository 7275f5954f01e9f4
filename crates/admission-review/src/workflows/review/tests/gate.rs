use super::common::*;
use crate::workflows::review::classification::ReviewClass;
use crate::workflows::review::commit::ValidationError;
use crate::workflows::review::domain::DocumentStatus::{Approved, Pending, Rejected};
use crate::workflows::review::domain::{DocumentId, DocumentStatus, ExportKind};
use crate::workflows::review::gate::{
    is_export_eligible, prepare_export, selectable_documents, ExportError, ExportSelection,
};

#[test]
fn only_fully_approved_applications_are_eligible() {
    assert!(is_export_eligible(&approved_application("ok")));
    assert!(!is_export_eligible(&pending_application("pending")));
    assert!(!is_export_eligible(&application("empty", &[])));
    assert!(!is_export_eligible(&application(
        "rejected",
        &[("passport", Approved), ("photo", Rejected)]
    )));
}

#[test]
fn selectable_documents_are_exactly_the_approved_ones() {
    let app = application(
        "mixed",
        &[("passport", Approved), ("photo", Rejected), ("visa", Pending)],
    );
    let selectable = selectable_documents(&app);
    assert_eq!(selectable.len(), 1);
    assert_eq!(selectable[0].id, DocumentId("doc-passport".to_string()));
}

#[test]
fn selection_defaults_to_all_approved_documents() {
    let app = approved_application("ok");
    let selection = ExportSelection::open(&app);
    assert_eq!(selection.selected().len(), 4);
    assert!(selection.validate().is_ok());
}

#[test]
fn clear_all_then_validate_reports_empty_selection() {
    let app = approved_application("ok");
    let mut selection = ExportSelection::open(&app);
    selection.clear_all();
    assert_eq!(selection.validate(), Err(ValidationError::EmptySelection));

    selection.select_all();
    assert_eq!(selection.selected().len(), 4);
}

#[test]
fn cannot_select_unapproved_or_foreign_documents() {
    let app = application("mixed", &[("passport", Approved), ("photo", Rejected)]);
    let mut selection = ExportSelection::open(&app);

    assert_eq!(
        selection.select(&app, &DocumentId("doc-photo".to_string())),
        Err(ExportError::NotSelectable {
            document_id: DocumentId("doc-photo".to_string()),
            status: DocumentStatus::Rejected,
        })
    );
    assert_eq!(
        selection.select(&app, &DocumentId("doc-unknown".to_string())),
        Err(ExportError::UnknownDocument(DocumentId("doc-unknown".to_string())))
    );

    let passport = DocumentId("doc-passport".to_string());
    assert!(selection.deselect(&passport));
    assert!(!selection.is_selected(&passport));
    selection.select(&app, &passport).expect("approved document");
    assert!(selection.is_selected(&passport));
}

#[test]
fn prepare_export_checks_eligibility_before_selection() {
    let empty = application("empty", &[]);
    assert_eq!(
        prepare_export(&empty, ExportKind::Pdf, &[]),
        Err(ExportError::Ineligible {
            application_id: empty.application_id.clone(),
            class: ReviewClass::NoDocuments,
        })
    );

    let approved = approved_application("ok");
    assert_eq!(
        prepare_export(&approved, ExportKind::Zip, &[]),
        Err(ExportError::Validation(ValidationError::EmptySelection))
    );
}

#[test]
fn prepare_export_deduplicates_selected_documents() {
    let approved = approved_application("ok");
    let passport = DocumentId("doc-passport".to_string());
    let request = prepare_export(
        &approved,
        ExportKind::Pdf,
        &[passport.clone(), passport.clone()],
    )
    .expect("eligible");
    assert_eq!(request.document_ids, vec![passport]);
    assert_eq!(request.kind, ExportKind::Pdf);
}
