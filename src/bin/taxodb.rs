use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use taxodb::config::{ConfigLoader, ResolvedConfig};
use taxodb::domain::{DbType, FileLabel};
use taxodb::error::TaxoError;
use taxodb::layout::list_input_files;
use taxodb::output::{JsonOutput, NameEntry, OutputMode};
use taxodb::pipeline::{Pipeline, PipelineOptions, StageAction, StageReport};
use taxodb::retry::RetryPolicy;
use taxodb::taxonomy::NcbiTaxonomyClient;
use taxodb::tools::{SystemToolRunner, ToolInfo, ToolStatus};

#[derive(Parser)]
#[command(name = "taxodb")]
#[command(about = "Build per-species BLAST databases, suffix indexes and LTRharvest outputs")]
#[command(version, author)]
struct Cli {
    /// Config file (default: ./taxodb.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Rerun even when marker files exist
    #[arg(long, global = true)]
    force: bool,

    #[arg(long, global = true)]
    max_attempts: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve taxids or file names to species names")]
    Names(NamesArgs),
    #[command(about = "Build BLAST databases with makeblastdb")]
    Db(DbArgs),
    #[command(about = "Build suffixerator indexes for LTRharvest")]
    Index(IndexArgs),
    #[command(about = "Run LTRharvest on existing indexes")]
    Harvest(HarvestArgs),
    #[command(about = "Show external tool availability")]
    Tools,
}

#[derive(Args)]
struct NamesArgs {
    #[arg(required = true)]
    labels: Vec<String>,
}

#[derive(Args)]
struct DbArgs {
    #[arg(long)]
    input: Option<Utf8PathBuf>,

    #[arg(long)]
    output: Option<Utf8PathBuf>,

    #[arg(long)]
    db_type: Option<DbType>,

    /// Input files are named by species label; read `<input>/<species>.fasta`
    #[arg(long)]
    label_input: bool,
}

#[derive(Args)]
struct IndexArgs {
    #[arg(long)]
    input: Option<Utf8PathBuf>,

    /// Where indexes are written (default: the input directory)
    #[arg(long)]
    index: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct HarvestArgs {
    /// Directory with the taxid-named input files (default: configured input_dir, then the index directory)
    #[arg(long)]
    input: Option<Utf8PathBuf>,

    #[arg(long)]
    index: Option<Utf8PathBuf>,

    #[arg(long)]
    output: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TaxoError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TaxoError) -> u8 {
    match error {
        TaxoError::MissingConfig(_)
        | TaxoError::ConfigRead(_)
        | TaxoError::ConfigParse(_)
        | TaxoError::MissingPath(_)
        | TaxoError::InvalidPath(_) => 2,
        TaxoError::TaxonomyHttp(_)
        | TaxoError::TaxonomyStatus { .. }
        | TaxoError::TaxonomyService(_)
        | TaxoError::ResolutionExhausted { .. }
        | TaxoError::MissingTool(_)
        | TaxoError::ToolSpawn { .. }
        | TaxoError::ToolFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if let Some(max_attempts) = cli.max_attempts {
        config.retry = RetryPolicy::new(max_attempts, config.retry.display_warning());
    }

    if let Commands::Tools = cli.command {
        let info = SystemToolRunner::new().tool_info(&config.tools);
        return match output_mode {
            OutputMode::Json => JsonOutput::print_tools(&info).into_diagnostic(),
            OutputMode::Human => {
                print_tools(&info);
                Ok(())
            }
        };
    }

    let pipeline = build_pipeline(&config, cli.force)?;

    match cli.command {
        Commands::Names(args) => {
            let labels = args
                .labels
                .into_iter()
                .map(FileLabel::new)
                .collect::<Vec<_>>();
            let names = pipeline.resolve_names(&labels)?;
            let entries = labels
                .into_iter()
                .zip(names)
                .map(|(label, species)| NameEntry {
                    label: label.as_str().to_string(),
                    species,
                })
                .collect::<Vec<_>>();
            match output_mode {
                OutputMode::Json => JsonOutput::print_names(&entries).into_diagnostic(),
                OutputMode::Human => {
                    for entry in &entries {
                        println!("{}\t{}", entry.label, entry.species);
                    }
                    Ok(())
                }
            }
        }
        Commands::Db(args) => {
            let input = required(args.input, config.paths.input_dir.clone(), "--input")?;
            let output = required(args.output, config.paths.db_dir.clone(), "--output")?;
            let files = list_input_files(&input)?;
            let report = pipeline
                .build_databases(
                    &files,
                    &input,
                    args.db_type.unwrap_or(config.db_type),
                    !args.label_input,
                    &output,
                )?;
            emit_report(&report, output_mode)
        }
        Commands::Index(args) => {
            let input = required(args.input, config.paths.input_dir.clone(), "--input")?;
            let index = args
                .index
                .or_else(|| config.paths.index_dir.clone())
                .unwrap_or_else(|| input.clone());
            let files = list_input_files(&input)?;
            let report = pipeline.build_indexes(&input, &files, &index)?;
            emit_report(&report, output_mode)
        }
        Commands::Harvest(args) => {
            let index = required(
                args.index,
                config
                    .paths
                    .index_dir
                    .clone()
                    .or_else(|| config.paths.input_dir.clone()),
                "--index",
            )?;
            let output = required(args.output, config.paths.harvest_dir.clone(), "--output")?;
            let input = args
                .input
                .or_else(|| config.paths.input_dir.clone())
                .unwrap_or_else(|| index.clone());
            let files = list_input_files(&input)?;
            let report = pipeline.harvest(&index, &files, &output)?;
            emit_report(&report, output_mode)
        }
        Commands::Tools => Ok(()),
    }
}

fn build_pipeline(
    config: &ResolvedConfig,
    force_rerun: bool,
) -> miette::Result<Pipeline<NcbiTaxonomyClient, SystemToolRunner>> {
    let client = NcbiTaxonomyClient::new(config.credentials.clone())?;
    Ok(Pipeline::new(
        client,
        SystemToolRunner::new(),
        config.retry,
        config.registry.clone(),
        config.tools.clone(),
        PipelineOptions { force_rerun },
    ))
}

fn required(
    arg: Option<Utf8PathBuf>,
    configured: Option<Utf8PathBuf>,
    flag: &'static str,
) -> miette::Result<Utf8PathBuf> {
    Ok(arg.or(configured).ok_or(TaxoError::MissingPath(flag))?)
}

fn emit_report(report: &StageReport, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_report(report).into_diagnostic(),
        OutputMode::Human => {
            print_summary(report);
            Ok(())
        }
    }
}

fn print_summary(report: &StageReport) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}taxodb {} summary{reset}", report.stage);
    println!("{green}built: {}{reset}", report.built().len());
    println!(
        "{yellow}already complete: {}{reset}",
        report.with_action(StageAction::AlreadyComplete).len()
    );
    println!(
        "{yellow}not in registry: {}{reset}",
        report.with_action(StageAction::NotInRegistry).len()
    );

    for item in &report.items {
        let (label, color) = match item.action {
            StageAction::Built => ("built", green),
            StageAction::AlreadyComplete => ("skip", yellow),
            StageAction::NotInRegistry => ("gated", yellow),
        };
        println!("{color}  {label:<6} {} ({}){reset}", item.species, item.file);
    }
}

fn print_tools(info: &ToolInfo) {
    for status in [&info.makeblastdb, &info.genometools] {
        print_tool(status);
    }
}

fn print_tool(status: &ToolStatus) {
    match (&status.path, &status.version) {
        (Some(path), Some(version)) => {
            println!("{}: {} ({version})", status.program, path.display())
        }
        (Some(path), None) => println!("{}: {}", status.program, path.display()),
        (None, _) => println!("{}: not found", status.program),
    }
}
