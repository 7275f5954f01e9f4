use serde_json::json;

use crate::workflows::review::classification::{classify, ReviewClass};
use crate::workflows::review::domain::{ApplicationStatus, DocumentStatus, DocumentType};
use crate::workflows::review::wire::{parse_document_status, WireApplication, WireError};

fn parse(value: serde_json::Value) -> WireApplication {
    serde_json::from_value(value).expect("wire payload parses")
}

#[test]
fn array_shaped_documents_normalize() {
    let application = parse(json!({
        "applicationId": "APP-1042",
        "status": "UNDER_REVIEW",
        "documents": [
            {
                "documentType": "passport",
                "_id": "66a1",
                "fileName": "passport.pdf",
                "size": 120044,
                "mimeType": "application/pdf",
                "url": "uploads/66a1.pdf",
                "status": "approved",
                "remarks": "Document approved",
                "uploadedAt": "2025-06-01T08:00:00Z",
                "reviewedAt": "2025-06-02T10:15:00Z"
            },
            {
                "documentType": "transcript",
                "uploadedAt": "2025-06-01T08:05:00Z"
            }
        ]
    }))
    .into_application()
    .expect("normalizes");

    assert_eq!(application.status, ApplicationStatus::UnderReview);
    assert_eq!(application.documents.len(), 2);
    let passport = &application.documents[0];
    assert_eq!(passport.id.0, "66a1");
    assert_eq!(passport.status, DocumentStatus::Approved);
    assert_eq!(passport.file.size_bytes, 120_044);
    assert_eq!(passport.file.mime_type.as_deref(), Some("application/pdf"));
    assert!(passport.reviewed_at.is_some());

    let transcript = &application.documents[1];
    assert_eq!(transcript.status, DocumentStatus::Pending);
    assert_eq!(transcript.id.0, "transcript");
    assert_eq!(transcript.file.name, "transcript");
    assert_eq!(classify(&application.documents), ReviewClass::PartiallyReviewed);
}

#[test]
fn keyed_documents_normalize_to_same_shape() {
    let application = parse(json!({
        "application_id": "APP-2001",
        "documents": {
            "photo": { "status": "VERIFIED", "uploaded_at": "2025-06-01T08:00:00Z" },
            "passport": {
                "status": "Rejected",
                "remarks": "  expired  ",
                "uploaded_at": "2025-06-01T08:00:00Z",
                "reviewed_at": "2025-06-03T08:00:00Z"
            }
        }
    }))
    .into_application()
    .expect("normalizes");

    assert_eq!(application.status, ApplicationStatus::Submitted);
    let passport = application
        .document(&DocumentType::new("passport"))
        .expect("passport present");
    assert_eq!(passport.status, DocumentStatus::Rejected);
    assert_eq!(passport.remarks.as_deref(), Some("expired"));
    assert_eq!(classify(&application.documents), ReviewClass::HasRejected);
}

#[test]
fn missing_or_null_documents_mean_no_documents() {
    let missing = parse(json!({ "applicationId": "APP-1" }))
        .into_application()
        .expect("normalizes");
    assert_eq!(classify(&missing.documents), ReviewClass::NoDocuments);

    let null = parse(json!({ "applicationId": "APP-2", "documents": null }))
        .into_application()
        .expect("normalizes");
    assert!(null.documents.is_empty());
}

#[test]
fn pending_documents_drop_review_timestamps() {
    let application = parse(json!({
        "applicationId": "APP-3",
        "documents": [{
            "type": "photo",
            "status": "pending",
            "uploadedAt": "2025-06-01T08:00:00Z",
            "reviewedAt": "2025-06-02T08:00:00Z"
        }]
    }))
    .into_application()
    .expect("normalizes");
    assert!(application.documents[0].reviewed_at.is_none());
}

#[test]
fn duplicate_document_types_are_refused() {
    let result = parse(json!({
        "applicationId": "APP-4",
        "documents": [
            { "documentType": "photo", "uploadedAt": "2025-06-01T08:00:00Z" },
            { "documentType": " photo ", "uploadedAt": "2025-06-01T08:00:00Z" }
        ]
    }))
    .into_application();
    assert_eq!(result, Err(WireError::DuplicateDocumentType("photo".to_string())));
}

#[test]
fn unknown_statuses_are_reported() {
    assert_eq!(
        parse_document_status(Some("archived")),
        Err(WireError::UnknownStatus("archived".to_string()))
    );
    assert_eq!(parse_document_status(None), Ok(DocumentStatus::Pending));
    assert_eq!(parse_document_status(Some("  ")), Ok(DocumentStatus::Pending));

    let result = parse(json!({ "applicationId": "APP-5", "status": "on hold" })).into_application();
    assert_eq!(
        result,
        Err(WireError::UnknownApplicationStatus("on hold".to_string()))
    );
}

#[test]
fn mime_types_lose_parameters_and_malformed_ones_are_dropped() {
    let application = parse(json!({
        "applicationId": "APP-3003",
        "documents": [
            {
                "documentType": "passport",
                "mimeType": "application/pdf; name=passport.pdf",
                "uploadedAt": "2025-06-01T08:00:00Z"
            },
            {
                "documentType": "photo",
                "mimeType": "jpeg please",
                "uploadedAt": "2025-06-01T08:00:00Z"
            }
        ]
    }))
    .into_application()
    .expect("normalizes");

    assert_eq!(
        application.documents[0].file.mime_type.as_deref(),
        Some("application/pdf")
    );
    assert_eq!(application.documents[1].file.mime_type, None);
}
