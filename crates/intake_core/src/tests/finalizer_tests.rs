use super::*;
use anyhow::anyhow;
use async_trait::async_trait;
use shared::domain::{Attachment, OrganizationType};
use storage::MemoryRecordStore;

struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn put(&self, _record: &SubmittedRecord) -> anyhow::Result<()> {
        Err(anyhow!("quota exceeded"))
    }

    async fn get(&self, _reference_id: &ReferenceId) -> anyhow::Result<Option<SubmittedRecord>> {
        Ok(None)
    }
}

struct FixedReferenceIds(&'static str);

impl ReferenceIdSource for FixedReferenceIds {
    fn next_reference_id(&self) -> ReferenceId {
        ReferenceId::parse(self.0).expect("fixed reference id")
    }
}

fn draft() -> GrievanceDraft {
    GrievanceDraft {
        organization_type: Some(OrganizationType::LaborOfficer),
        organization_name: "Ward 12 Labour Office".into(),
        issue_description: "Wages withheld for two months".into(),
        attachments: vec![Attachment::new("payslip.pdf", "application/pdf", 48_000)],
        reference_id: None,
    }
}

#[tokio::test]
async fn persists_snapshot_under_generated_reference() {
    let store = Arc::new(MemoryRecordStore::new());
    let finalizer = SubmissionFinalizer::new(store.clone());

    let before = Utc::now();
    let record = finalizer.finalize(&draft()).await.expect("finalized");

    assert_eq!(record.reference_id.as_str().len(), 8);
    assert_eq!(record.organization, OrganizationType::LaborOfficer);
    assert_eq!(record.files, draft().attachments);
    assert!(record.submitted_at >= before.trunc_subsecs(3));

    let stored = store
        .get(&record.reference_id)
        .await
        .expect("get")
        .expect("stored");
    assert_eq!(stored, record);
}

#[tokio::test]
async fn store_failure_is_reported_not_acknowledged() {
    let finalizer = SubmissionFinalizer::new(Arc::new(FailingStore));
    let err = finalizer.finalize(&draft()).await.expect_err("must fail");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn reused_reference_id_fails_instead_of_overwriting() {
    let store = Arc::new(MemoryRecordStore::new());
    let finalizer =
        SubmissionFinalizer::with_reference_ids(store.clone(), Arc::new(FixedReferenceIds("AAAA1111")));

    finalizer.finalize(&draft()).await.expect("first");
    let err = finalizer.finalize(&draft()).await.expect_err("collision");
    match err {
        SubmitError::Persistence { reference_id, .. } => {
            assert_eq!(reference_id.as_str(), "AAAA1111")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn draft_without_organization_type_is_refused() {
    let store = Arc::new(MemoryRecordStore::new());
    let finalizer = SubmissionFinalizer::new(store.clone());
    let mut incomplete = draft();
    incomplete.organization_type = None;

    let err = finalizer.finalize(&incomplete).await.expect_err("invalid");
    assert!(matches!(err, SubmitError::Validation(_)));
    assert!(store.is_empty().await);
}
