use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use gene_displayer::annotation::{Annotator, MyGeneHttpClient};
use gene_displayer::app::{AnnotateRequest, App, Catalog, ProgressSink, ViewRequest};
use gene_displayer::compare::{Assembled, ComparisonAssembler};
use gene_displayer::config::{ConfigLoader, ResolvedConfig};
use gene_displayer::domain::{DatasetName, GeneSelection, ReplicateMode, SampleType};
use gene_displayer::error::DisplayerError;
use gene_displayer::output::{JsonOutput, OutputMode, StderrProgress};
use gene_displayer::parser::SeriesParser;
use gene_displayer::store::Store;

#[derive(Parser)]
#[command(name = "gene-displayer")]
#[command(
    about = "Annotate microarray series files with gene names, descriptions, HomoloGene and RefSeq ids, and reshape them for time-course plots"
)]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Annotate a series matrix file and store the merged table")]
    Annotate(AnnotateArgs),
    #[command(about = "List stored datasets")]
    List,
    #[command(about = "Reshape stored datasets for the given genes")]
    Show(ShowArgs),
}

#[derive(Args)]
struct AnnotateArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long)]
    name: Option<String>,

    #[arg(short = 't', long = "types")]
    types: Vec<String>,

    #[arg(short, long)]
    csv: bool,

    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct ShowArgs {
    #[arg(short, long, value_delimiter = ',', required = true)]
    datasets: Vec<String>,

    #[arg(short, long)]
    genes: String,

    #[arg(short, long, value_enum, default_value_t = ReplicateMode::Average)]
    replicate: ReplicateMode,

    #[arg(long, value_enum, default_value_t = View::Comparison)]
    view: View,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    Table,
    Individual,
    Comparison,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<DisplayerError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DisplayerError) -> u8 {
    match error {
        DisplayerError::DatasetNotFound(_)
        | DisplayerError::GeneNotFound { .. }
        | DisplayerError::DatasetExists(_)
        | DisplayerError::InvalidReplicateMode(_)
        | DisplayerError::InvalidGeneSelection(_)
        | DisplayerError::InvalidDatasetName(_)
        | DisplayerError::InvalidSampleType(_) => 2,
        DisplayerError::AnnotationHttp(_)
        | DisplayerError::AnnotationStatus { .. }
        | DisplayerError::AnnotationDecode(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = Store::new(config.data_dir.clone());

    match cli.command {
        Commands::Annotate(args) => run_annotate(args, &config, store, output_mode),
        Commands::List => JsonOutput::print_list(&Catalog::new(store).list()?).into_diagnostic(),
        Commands::Show(args) => run_show(args, store),
    }
}

fn run_annotate(
    args: AnnotateArgs,
    config: &ResolvedConfig,
    store: Store,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let request = AnnotateRequest {
        input: args.input,
        name: args
            .name
            .as_deref()
            .map(str::parse::<DatasetName>)
            .transpose()?,
        sample_types: args
            .types
            .iter()
            .map(|value| value.parse::<SampleType>())
            .collect::<Result<Vec<_>, _>>()?,
        csv: args.csv,
        force: args.force,
    };
    let client = MyGeneHttpClient::new(&config.annotation)?;
    let app = App::new(
        store,
        SeriesParser::new(config.format.clone()),
        Annotator::from_settings(client, &config.annotation),
    );
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &StderrProgress,
        OutputMode::NonInteractive => &JsonOutput,
    };
    let result = app.annotate(&request, sink)?;
    JsonOutput::print_annotate(&result).into_diagnostic()
}

fn run_show(args: ShowArgs, store: Store) -> miette::Result<()> {
    let request = ViewRequest {
        datasets: args
            .datasets
            .iter()
            .map(|value| value.parse::<DatasetName>())
            .collect::<Result<Vec<_>, _>>()?,
        genes: args.genes.parse::<GeneSelection>()?,
        replicate: args.replicate,
    };
    let result = Catalog::new(store).view(request)?;
    match args.view {
        View::Table => JsonOutput::print_tables(&result.reshaped).into_diagnostic(),
        View::Individual => {
            // One plot per dataset even when several were requested.
            for table in &result.reshaped {
                let aligned = ComparisonAssembler::align(table)?;
                JsonOutput::print_assembled(&Assembled::Single(aligned)).into_diagnostic()?;
            }
            Ok(())
        }
        View::Comparison => JsonOutput::print_view(&result).into_diagnostic(),
    }
}
