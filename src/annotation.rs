use std::collections::{HashMap, HashSet};
use std::time::Duration;

use rayon::prelude::*;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::ProbeId;
use crate::error::DisplayerError;

pub const MYGENE_QUERY_URL: &str = "https://mygene.info/v3/query";
/// mygene.info rejects batch queries with more than this many terms.
pub const MAX_BATCH_SIZE: usize = 1000;
const QUERY_SCOPE: &str = "reporter";
const QUERY_FIELDS: &str = "symbol,name,refseq.genomic,homologene.id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub gene_name: Option<String>,
    pub gene_description: Option<String>,
    pub homologene_id: Option<String>,
    pub refseq: Option<String>,
}

impl AnnotationRecord {
    pub fn into_complete(self) -> Option<GeneAnnotation> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Some(GeneAnnotation {
            gene_name: non_empty(self.gene_name)?,
            gene_description: non_empty(self.gene_description)?,
            homologene_id: non_empty(self.homologene_id)?,
            refseq: non_empty(self.refseq)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneAnnotation {
    pub gene_name: String,
    pub gene_description: String,
    pub homologene_id: String,
    pub refseq: String,
}

pub type AnnotationMap = HashMap<ProbeId, GeneAnnotation>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationHit {
    Found {
        query: ProbeId,
        record: AnnotationRecord,
    },
    NotFound(ProbeId),
}

pub trait AnnotationClient: Send + Sync {
    fn query_batch(&self, ids: &[ProbeId]) -> Result<Vec<AnnotationHit>, DisplayerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSettings {
    pub endpoint: String,
    pub batch_size: usize,
    pub workers: usize,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub species: Option<String>,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            endpoint: MYGENE_QUERY_URL.to_string(),
            batch_size: MAX_BATCH_SIZE,
            workers: 4,
            timeout_secs: 60,
            max_retries: 0,
            species: None,
        }
    }
}

#[derive(Clone)]
pub struct MyGeneHttpClient {
    client: Client,
    endpoint: String,
    species: Option<String>,
    max_retries: usize,
}

impl MyGeneHttpClient {
    pub fn new(settings: &AnnotationSettings) -> Result<Self, DisplayerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gene-displayer/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DisplayerError::AnnotationHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| DisplayerError::AnnotationHttp(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            species: settings.species.clone(),
            max_retries: settings.max_retries,
        })
    }

    fn form(&self, ids: &[ProbeId]) -> Vec<(&'static str, String)> {
        let terms = ids.iter().map(ProbeId::as_str).collect::<Vec<_>>().join(",");
        let mut form = vec![
            ("q", terms),
            ("scopes", QUERY_SCOPE.to_string()),
            ("fields", QUERY_FIELDS.to_string()),
        ];
        if let Some(species) = &self.species {
            form.push(("species", species.clone()));
        }
        form
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, DisplayerError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match make_req().send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        attempt += 1;
                        std::thread::sleep(Duration::from_millis(BASE_DELAY_MS * attempt as u64));
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < self.max_retries && is_retryable_error(&err) {
                        attempt += 1;
                        std::thread::sleep(Duration::from_millis(BASE_DELAY_MS * attempt as u64));
                        continue;
                    }
                    return Err(DisplayerError::AnnotationHttp(err.to_string()));
                }
            }
        }
    }
}

impl AnnotationClient for MyGeneHttpClient {
    fn query_batch(&self, ids: &[ProbeId]) -> Result<Vec<AnnotationHit>, DisplayerError> {
        let form = self.form(ids);
        let response = self.send_with_retries(|| self.client.post(&self.endpoint).form(&form))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "annotation request failed".to_string());
            return Err(DisplayerError::AnnotationStatus { status, message });
        }
        let payload: Value = response
            .json()
            .map_err(|err| DisplayerError::AnnotationDecode(err.to_string()))?;
        parse_hits(&payload)
    }
}

pub fn parse_hits(payload: &Value) -> Result<Vec<AnnotationHit>, DisplayerError> {
    let items = payload.as_array().ok_or_else(|| {
        DisplayerError::AnnotationDecode("expected a JSON array of query results".to_string())
    })?;

    let mut hits = Vec::with_capacity(items.len());
    for item in items {
        let Some(query) = item
            .get("query")
            .and_then(scalar_text)
            .and_then(|q| q.parse::<ProbeId>().ok())
        else {
            continue;
        };
        if item.get("notfound").and_then(Value::as_bool).unwrap_or(false) {
            hits.push(AnnotationHit::NotFound(query));
            continue;
        }
        let record = AnnotationRecord {
            gene_name: item.get("symbol").and_then(scalar_text),
            gene_description: item.get("name").and_then(scalar_text),
            homologene_id: item
                .get("homologene")
                .and_then(|v| v.get("id"))
                .and_then(scalar_text),
            refseq: item
                .get("refseq")
                .and_then(|v| v.get("genomic"))
                .and_then(joined_text),
        };
        hits.push(AnnotationHit::Found { query, record });
    }
    Ok(hits)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn joined_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts = items.iter().filter_map(scalar_text).collect::<Vec<_>>();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(","))
            }
        }
        other => scalar_text(other),
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

pub struct Annotator<C: AnnotationClient> {
    client: C,
    batch_size: usize,
    workers: usize,
}

impl<C: AnnotationClient> Annotator<C> {
    pub fn new(client: C, batch_size: usize, workers: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
            workers: workers.max(1),
        }
    }

    pub fn from_settings(client: C, settings: &AnnotationSettings) -> Self {
        Self::new(client, settings.batch_size, settings.workers)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn annotate(&self, ids: &[ProbeId]) -> Result<AnnotationMap, DisplayerError> {
        let batches = ids.chunks(self.batch_size).collect::<Vec<_>>();
        info!(
            probes = ids.len(),
            batches = batches.len(),
            workers = self.workers,
            "querying annotation service"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|err| DisplayerError::AnnotationHttp(format!("worker pool: {err}")))?;
        let responses = pool.install(|| {
            batches
                .par_iter()
                .enumerate()
                .map(|(index, batch)| {
                    debug!(batch = index, size = batch.len(), "annotation batch");
                    self.client.query_batch(batch)
                })
                .collect::<Result<Vec<_>, DisplayerError>>()
        })?;

        let requested = ids.iter().collect::<HashSet<_>>();
        let mut annotations = AnnotationMap::new();
        let mut not_found = 0usize;
        let mut incomplete = 0usize;
        for hit in responses.into_iter().flatten() {
            match hit {
                AnnotationHit::NotFound(_) => not_found += 1,
                AnnotationHit::Found { query, record } => {
                    if !requested.contains(&query) || annotations.contains_key(&query) {
                        continue;
                    }
                    match record.into_complete() {
                        Some(annotation) => {
                            annotations.insert(query, annotation);
                        }
                        None => incomplete += 1,
                    }
                }
            }
        }
        info!(
            resolved = annotations.len(),
            not_found, incomplete, "annotation finished"
        );

        if annotations.is_empty() {
            return Err(DisplayerError::AnnotationEmpty {
                queried: ids.len(),
            });
        }
        Ok(annotations)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticAnnotationClient {
    records: HashMap<ProbeId, Vec<AnnotationRecord>>,
}

impl StaticAnnotationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, probe: ProbeId, record: AnnotationRecord) -> Self {
        self.records.entry(probe).or_default().push(record);
        self
    }
}

impl AnnotationClient for StaticAnnotationClient {
    fn query_batch(&self, ids: &[ProbeId]) -> Result<Vec<AnnotationHit>, DisplayerError> {
        let mut hits = Vec::new();
        for id in ids {
            match self.records.get(id) {
                Some(records) => hits.extend(records.iter().map(|record| AnnotationHit::Found {
                    query: id.clone(),
                    record: record.clone(),
                })),
                None => hits.push(AnnotationHit::NotFound(id.clone())),
            }
        }
        Ok(hits)
    }
}
