#![allow(dead_code)]

use std::sync::Mutex;

use gene_displayer::annotation::{
    AnnotationClient, AnnotationHit, AnnotationRecord, StaticAnnotationClient,
};
use gene_displayer::domain::ProbeId;
use gene_displayer::error::DisplayerError;

pub fn record(gene: &str) -> AnnotationRecord {
    AnnotationRecord {
        gene_name: Some(gene.to_string()),
        gene_description: Some(format!("{gene} protein")),
        homologene_id: Some("1234".to_string()),
        refseq: Some("NC_000067.7".to_string()),
    }
}

pub fn probe(id: &str) -> ProbeId {
    id.parse().unwrap()
}

pub fn static_client(entries: &[(&str, &str)]) -> StaticAnnotationClient {
    entries
        .iter()
        .fold(StaticAnnotationClient::new(), |client, (id, gene)| {
            client.with_record(probe(id), record(gene))
        })
}

/// Records every batch it receives and answers from a static map.
pub struct RecordingClient {
    pub inner: StaticAnnotationClient,
    pub batches: Mutex<Vec<usize>>,
}

impl RecordingClient {
    pub fn new(inner: StaticAnnotationClient) -> Self {
        Self {
            inner,
            batches: Mutex::new(Vec::new()),
        }
    }
}

impl AnnotationClient for RecordingClient {
    fn query_batch(&self, ids: &[ProbeId]) -> Result<Vec<AnnotationHit>, DisplayerError> {
        self.batches.lock().unwrap().push(ids.len());
        self.inner.query_batch(ids)
    }
}

pub const SKIN_MATRIX: &str = "!Series_title\t\"Wound healing in skin\"\n\
!Series_geo_accession\t\"GSE460\"\n\
\n\
!Sample_title\t\"0hrs_replicate1\"\t\"0hrs_replicate2\"\t\"24hrs_replicate1\"\t\"24hrs_replicate2\"\n\
!Sample_geo_accession\t\"GSM1\"\t\"GSM2\"\t\"GSM3\"\t\"GSM4\"\n\
!series_matrix_table_begin\n\
\"ID_REF\"\t\"GSM1\"\t\"GSM2\"\t\"GSM3\"\t\"GSM4\"\n\
\"100_at\"\t1\t3\t10\t20\n\
\"101_at\"\t2\t4\t30\t50\n\
\"102_at\"\t5\t5\t5\t5\n\
\"103_at\"\t7\t\t8\t9\n\
!series_matrix_table_end\n";
