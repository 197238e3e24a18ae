mod common;

use std::fs;
use std::path::PathBuf;

use assert_approx_eq::assert_approx_eq;
use assert_matches::assert_matches;
use camino::Utf8PathBuf;
use tempfile::TempDir;

use gene_displayer::annotation::{Annotator, StaticAnnotationClient};
use gene_displayer::app::{AnnotateRequest, App, Catalog, ProgressEvent, ProgressSink, ViewRequest};
use gene_displayer::compare::Assembled;
use gene_displayer::domain::{DatasetName, ReplicateMode, SampleType};
use gene_displayer::error::DisplayerError;
use gene_displayer::parser::SeriesParser;
use gene_displayer::store::Store;

use common::{SKIN_MATRIX, static_client};

struct Silent;

impl ProgressSink for Silent {
    fn event(&self, _event: ProgressEvent) {}
}

fn app(dir: &TempDir) -> App<StaticAnnotationClient> {
    let root = Utf8PathBuf::from_path_buf(dir.path().join("data")).unwrap();
    App::new(
        Store::new(root),
        SeriesParser::default(),
        Annotator::new(
            static_client(&[("100_at", "ABC1"), ("101_at", "Actb"), ("102_at", "Gapdh")]),
            2,
            2,
        ),
    )
}

fn catalog(app: &App<StaticAnnotationClient>) -> Catalog {
    Catalog::new(app.store().clone())
}

fn write_input(dir: &TempDir, file_name: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    fs::write(&path, SKIN_MATRIX).unwrap();
    path
}

fn request(input: PathBuf) -> AnnotateRequest {
    AnnotateRequest {
        input,
        name: None,
        sample_types: Vec::new(),
        csv: false,
        force: false,
    }
}

fn name(value: &str) -> DatasetName {
    value.parse().unwrap()
}

#[test]
fn annotate_stores_and_view_reads_back() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let input = write_input(&dir, "skinData.txt");

    let result = app.annotate(&request(input), &Silent).unwrap();
    assert_eq!(result.datasets.len(), 1);
    assert_eq!(result.datasets[0].name.as_str(), "skinData");
    assert_eq!(result.datasets[0].genes, 3);
    assert!(result.datasets[0].path.as_std_path().exists());
    assert_eq!(result.report.kept, 3);

    let listed = catalog(&app).list().unwrap();
    assert_eq!(listed.datasets.len(), 1);
    assert_eq!(listed.datasets[0].genes, 3);

    let view = catalog(&app)
        .view(ViewRequest {
            datasets: vec![name("skinData")],
            genes: "ABC1".parse().unwrap(),
            replicate: ReplicateMode::Average,
        })
        .unwrap();
    let single = assert_matches!(view.assembled, Assembled::Single(single) => single);
    assert_eq!(single.series[0].label, "ABC1_skinData");
    assert_approx_eq!(single.series[0].value_at(24).unwrap(), 15.0);
}

#[test]
fn second_annotate_requires_force() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let input = write_input(&dir, "skinData.txt");

    app.annotate(&request(input.clone()), &Silent).unwrap();
    let err = app.annotate(&request(input.clone()), &Silent).unwrap_err();
    assert_matches!(err, DisplayerError::DatasetExists(existing) if existing == "skinData");

    let forced = AnnotateRequest {
        force: true,
        ..request(input)
    };
    assert!(app.annotate(&forced, &Silent).is_ok());
}

#[test]
fn csv_export_has_metadata_then_measurements() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let input = write_input(&dir, "GSE460_series_matrix.txt");

    let result = app
        .annotate(
            &AnnotateRequest {
                csv: true,
                ..request(input)
            },
            &Silent,
        )
        .unwrap();
    let csv_path = result.datasets[0].csv_path.clone().unwrap();
    let content = fs::read_to_string(csv_path.as_std_path()).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Gene Name,HG ID,Gene Description,RefSeq,0hrs_replicate1,0hrs_replicate2,24hrs_replicate1,24hrs_replicate2"
    );
    assert_eq!(lines.count(), 3);
}

#[test]
fn several_sample_types_produce_one_dataset_each() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let input = write_input(&dir, "skinData.txt");

    let result = app
        .annotate(
            &AnnotateRequest {
                sample_types: vec![
                    "replicate1".parse::<SampleType>().unwrap(),
                    "replicate2".parse::<SampleType>().unwrap(),
                ],
                ..request(input)
            },
            &Silent,
        )
        .unwrap();
    let names = result
        .datasets
        .iter()
        .map(|dataset| dataset.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["skinData_replicate1", "skinData_replicate2"]);
    assert!(result.datasets.iter().all(|dataset| dataset.columns == 2));
}

#[test]
fn view_fails_fast_on_missing_dataset_or_gene() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    app.annotate(&request(write_input(&dir, "skinData.txt")), &Silent)
        .unwrap();

    let err = catalog(&app)
        .view(ViewRequest {
            datasets: vec![name("skinData"), name("mucosaData")],
            genes: "ABC1".parse().unwrap(),
            replicate: ReplicateMode::Average,
        })
        .unwrap_err();
    assert_matches!(err, DisplayerError::DatasetNotFound(missing) if missing == "mucosaData");

    let err = catalog(&app)
        .view(ViewRequest {
            datasets: vec![name("skinData")],
            genes: "ABC1,Tp53".parse().unwrap(),
            replicate: ReplicateMode::Replicate1,
        })
        .unwrap_err();
    assert_matches!(err, DisplayerError::GeneNotFound { gene, .. } if gene == "Tp53");
}

#[test]
fn malformed_input_stores_nothing() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let input = dir.path().join("broken.txt");
    fs::write(&input, "100_at\t1\t2\n").unwrap();

    let err = app.annotate(&request(input), &Silent).unwrap_err();
    assert_matches!(err, DisplayerError::FileFormat { .. });
    assert!(catalog(&app).list().unwrap().datasets.is_empty());
}

#[test]
fn catalog_reads_artifacts_without_an_annotator() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    app.annotate(&request(write_input(&dir, "skinData.txt")), &Silent)
        .unwrap();

    let root = Utf8PathBuf::from_path_buf(dir.path().join("data")).unwrap();
    let catalog = Catalog::new(Store::new(root));
    assert_eq!(catalog.list().unwrap().datasets.len(), 1);
    let view = catalog
        .view(ViewRequest {
            datasets: vec![name("skinData")],
            genes: "Actb,ABC1".parse().unwrap(),
            replicate: ReplicateMode::Replicate2,
        })
        .unwrap();
    assert_eq!(view.reshaped[0].columns, ["0hrs_replicate2", "24hrs_replicate2"]);
    assert_approx_eq!(view.reshaped[0].value("Actb", "24hrs_replicate2").unwrap(), 50.0);
}
