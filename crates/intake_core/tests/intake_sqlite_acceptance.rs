use std::sync::Arc;

use anyhow::Result;
use intake_core::{
    CaptureEvent, CaptureEventSender, CaptureRequest, CaptureTicket, FormDependencies, FormState,
    GrievanceForm, TextCaptureProvider,
};
use shared::domain::{Attachment, OrganizationType};
use storage::{RecordStore, Storage};

/// Answers every capture immediately with one final transcript.
struct CannedDictation(&'static str);

impl TextCaptureProvider for CannedDictation {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&self, request: CaptureRequest, events: CaptureEventSender) -> Result<()> {
        events.send(CaptureEvent::transcript(request.ticket, self.0))?;
        events.send(CaptureEvent::end(request.ticket))?;
        Ok(())
    }

    fn cancel(&self, _ticket: CaptureTicket) {}
}

#[tokio::test]
async fn dictated_grievance_with_evidence_lands_in_sqlite() {
    let storage = Arc::new(Storage::new("sqlite::memory:").await.expect("db"));
    let mut form = GrievanceForm::new_with_dependencies(
        FormDependencies::new(storage.clone())
            .with_capture(Arc::new(CannedDictation("the fire exit is chained shut")))
            .with_dictation_locale("en-US"),
    );
    form.open();

    form.set_organization_type(Some(OrganizationType::InternalCommittee))
        .expect("type");
    form.set_organization_name("Acme Garments ICC").expect("name");
    form.set_issue_description("Night shift:").expect("description");
    form.start_dictation().expect("editing").expect("started");
    form.poll_capture_events();

    let outcome = form
        .add_files(vec![
            Attachment::new("exit.jpg", "image/jpeg", 1_250_000),
            Attachment::new("script.sh", "application/x-sh", 300),
            Attachment::new("statement.m4a", "audio/mp4", 3_400_000),
        ])
        .expect("files");
    assert_eq!(outcome.rejected.len(), 1);

    let reference_id = form.submit().await.expect("submitted");
    assert_eq!(form.state(), FormState::Acknowledged);

    let record = storage
        .get(&reference_id)
        .await
        .expect("lookup")
        .expect("persisted");
    assert_eq!(
        record.issue_description,
        "Night shift: the fire exit is chained shut"
    );
    assert_eq!(record.organization, OrganizationType::InternalCommittee);
    let files: Vec<_> = record.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(files, vec!["exit.jpg", "statement.m4a"]);
    assert_eq!(storage.count_records().await.expect("count"), 1);

    form.close();
    assert!(form.draft().is_empty());
    assert!(storage.get(&reference_id).await.expect("lookup").is_some());
}
