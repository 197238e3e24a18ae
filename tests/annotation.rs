mod common;

use assert_matches::assert_matches;

use gene_displayer::annotation::{
    AnnotationClient, AnnotationHit, AnnotationRecord, Annotator, StaticAnnotationClient,
};
use gene_displayer::domain::ProbeId;
use gene_displayer::error::DisplayerError;

use common::{RecordingClient, probe, record, static_client};

struct FailingClient;

impl AnnotationClient for FailingClient {
    fn query_batch(&self, ids: &[ProbeId]) -> Result<Vec<AnnotationHit>, DisplayerError> {
        if ids.iter().any(|id| id.as_str() == "broken_at") {
            return Err(DisplayerError::AnnotationStatus {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(ids.iter().cloned().map(AnnotationHit::NotFound).collect())
    }
}

#[test]
fn splits_into_bounded_batches() {
    let ids = (0..7).map(|i| probe(&format!("{i}_at"))).collect::<Vec<_>>();
    let client = RecordingClient::new(static_client(&[("0_at", "Actb"), ("6_at", "Gapdh")]));
    let annotator = Annotator::new(client, 3, 2);

    let annotations = annotator.annotate(&ids).unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[&probe("6_at")].gene_name, "Gapdh");

    let mut batches = annotator.client().batches.lock().unwrap().clone();
    batches.sort_unstable();
    assert_eq!(batches, [1, 3, 3]);
}

#[test]
fn failed_batch_fails_the_call() {
    let ids = vec![probe("a_at"), probe("b_at"), probe("broken_at")];
    let annotator = Annotator::new(FailingClient, 1, 3);
    let err = annotator.annotate(&ids).unwrap_err();
    assert_matches!(err, DisplayerError::AnnotationStatus { status: 502, .. });
}

#[test]
fn first_complete_hit_wins_and_partial_records_are_discarded() {
    let partial = AnnotationRecord {
        refseq: None,
        ..record("Partial")
    };
    let client = StaticAnnotationClient::new()
        .with_record(probe("1_at"), record("Ddr1"))
        .with_record(probe("1_at"), record("Rfc2"))
        .with_record(probe("2_at"), partial)
        .with_record(probe("3_at"), record("Hspa6"));
    let annotator = Annotator::new(client, 1000, 1);

    let annotations = annotator
        .annotate(&[probe("1_at"), probe("2_at"), probe("3_at")])
        .unwrap();
    assert_eq!(annotations[&probe("1_at")].gene_name, "Ddr1");
    assert!(!annotations.contains_key(&probe("2_at")));
    assert_eq!(annotations.len(), 2);
}
