use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use taxodb::domain::{DbType, FileLabel, Stage};
use taxodb::error::TaxoError;
use taxodb::pipeline::{Pipeline, PipelineOptions, StageAction};
use taxodb::registry::SpeciesRegistry;
use taxodb::retry::RetryPolicy;
use taxodb::taxonomy::TaxonomyClient;
use taxodb::tools::{ToolInvocation, ToolPrograms, ToolRunner};

struct MockTaxonomy {
    names: HashMap<u64, String>,
}

impl TaxonomyClient for MockTaxonomy {
    fn scientific_name(&self, tax_id: u64) -> Result<Option<String>, TaxoError> {
        Ok(self.names.get(&tax_id).cloned())
    }
}

struct DownTaxonomy;

impl TaxonomyClient for DownTaxonomy {
    fn scientific_name(&self, _tax_id: u64) -> Result<Option<String>, TaxoError> {
        Err(TaxoError::TaxonomyStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }
}

/// Records every invocation and writes the files the real tool would leave behind.
#[derive(Default)]
struct FakeTools {
    calls: Mutex<Vec<ToolInvocation>>,
}

impl FakeTools {
    fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    fn arg_after(invocation: &ToolInvocation, flag: &str) -> String {
        let pos = invocation.args.iter().position(|arg| arg == flag).unwrap();
        invocation.args[pos + 1].clone()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), TaxoError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match invocation.args.first().map(String::as_str) {
            Some("suffixerator") => {
                let index = Self::arg_after(invocation, "-indexname");
                fs::write(format!("{index}.esq"), b"").unwrap();
            }
            Some("ltrharvest") => {
                fs::write(Self::arg_after(invocation, "-out"), b">ltr\nACGT\n").unwrap();
                fs::write(Self::arg_after(invocation, "-gff3"), b"##gff-version 3\n").unwrap();
            }
            _ => {
                let out = Self::arg_after(invocation, "-out");
                fs::write(format!("{out}.ndb"), b"").unwrap();
            }
        }
        Ok(())
    }
}

struct FailingTools;

impl ToolRunner for FailingTools {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), TaxoError> {
        Err(TaxoError::ToolFailed {
            program: invocation.program.clone(),
            status: "exit status: 1".to_string(),
            stderr: "BLAST options error".to_string(),
        })
    }
}

fn taxonomy() -> MockTaxonomy {
    MockTaxonomy {
        names: [
            (9606, "Homo sapiens"),
            (4577, "Zea mays"),
            (39947, "Oryza sativa Japonica Group"),
        ]
        .into_iter()
        .map(|(id, name)| (id, name.to_string()))
        .collect(),
    }
}

fn pipeline<R: ToolRunner>(
    runner: R,
    registry: &[&str],
    force_rerun: bool,
) -> Pipeline<MockTaxonomy, R> {
    Pipeline::new(
        taxonomy(),
        runner,
        RetryPolicy::new(3, false),
        SpeciesRegistry::new(registry.iter().copied()),
        ToolPrograms::default(),
        PipelineOptions { force_rerun },
    )
}

fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

fn write_inputs(dir: &Utf8Path, names: &[&str]) -> Vec<FileLabel> {
    fs::create_dir_all(dir).unwrap();
    names
        .iter()
        .map(|name| {
            fs::write(dir.join(name), b">seq\nACGT\n").unwrap();
            FileLabel::from(*name)
        })
        .collect()
}

#[test]
fn database_build_is_idempotent() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("blastdb");
    let files = write_inputs(&input, &["9606.fasta", "4577.fasta"]);

    let first = pipeline(FakeTools::default(), &[], false);
    let report = first
        .build_databases(&files, &input, DbType::Nucl, true, &output)
        .unwrap();
    assert_eq!(report.stage, Stage::Database);
    let built = report.built().iter().map(|s| s.as_str()).collect::<Vec<_>>();
    assert_eq!(built, vec!["Homo_sapiens", "Zea_mays"]);
    assert_eq!(first.runner().calls().len(), 2);
    assert!(output.join("Homo_sapiens").is_dir());

    let second = pipeline(FakeTools::default(), &[], false);
    let report = second
        .build_databases(&files, &input, DbType::Nucl, true, &output)
        .unwrap();
    assert!(second.runner().calls().is_empty());
    assert!(report.built().is_empty());
    assert_eq!(report.with_action(StageAction::AlreadyComplete).len(), 2);

    let forced = pipeline(FakeTools::default(), &[], true);
    let report = forced
        .build_databases(&files, &input, DbType::Nucl, true, &output)
        .unwrap();
    assert_eq!(forced.runner().calls().len(), 2);
    assert_eq!(report.built().len(), 2);
}

#[test]
fn database_arguments_follow_input_mode() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("blastdb");
    let files = write_inputs(&input, &["9606.fasta", "Danio_rerio.fa"]);

    let run = pipeline(FakeTools::default(), &[], false);
    run.build_databases(&files, &input, DbType::Prot, true, &output)
        .unwrap();
    let calls = run.runner().calls();
    assert_eq!(calls[0].program, "makeblastdb");
    assert_eq!(
        calls[0].args,
        vec![
            "-in".to_string(),
            input.join("9606.fasta").to_string(),
            "-dbtype".to_string(),
            "prot".to_string(),
            "-out".to_string(),
            output.join("Homo_sapiens/Homo_sapiens").to_string(),
        ]
    );
    assert_eq!(
        FakeTools::arg_after(&calls[1], "-out"),
        output.join("Danio_rerio/Danio_rerio").to_string()
    );

    let labelled = pipeline(FakeTools::default(), &[], true);
    labelled
        .build_databases(&files, &input, DbType::Nucl, false, &output)
        .unwrap();
    let calls = labelled.runner().calls();
    assert_eq!(
        FakeTools::arg_after(&calls[0], "-in"),
        input.join("Homo_sapiens.fasta").to_string()
    );
}

#[test]
fn index_build_respects_registry() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let files = write_inputs(&input, &["9606.fasta", "4577.fasta"]);

    let run = pipeline(FakeTools::default(), &["Zea_mays"], false);
    let report = run.build_indexes(&input, &files, &input).unwrap();

    let calls = run.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].command_line(),
        format!(
            "gt suffixerator -db {} -indexname {} -tis -suf -lcp -des -ssp -sds -dna -v",
            input.join("4577.fasta"),
            input.join("Zea_mays/Zea_mays")
        )
    );
    let gated = report.with_action(StageAction::NotInRegistry);
    assert_eq!(gated.len(), 1);
    assert_eq!(gated[0].as_str(), "Homo_sapiens");
    assert!(!input.join("Homo_sapiens").exists());

    let again = pipeline(FakeTools::default(), &["Zea_mays"], false);
    let report = again.build_indexes(&input, &files, &input).unwrap();
    assert!(again.runner().calls().is_empty());
    assert_eq!(report.with_action(StageAction::AlreadyComplete).len(), 1);
}

#[test]
fn harvest_respects_registry_and_existing_output() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("ltr");
    let files = write_inputs(&input, &["9606.fasta", "4577.fasta", "39947.fasta"]);
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("Oryza_sativa_Japonica_Group.fasta"), b"").unwrap();

    let run = pipeline(
        FakeTools::default(),
        &["Zea_mays", "Oryza_sativa_Japonica_Group"],
        false,
    );
    let report = run.harvest(&input, &files, &output).unwrap();

    let calls = run.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        vec![
            "ltrharvest".to_string(),
            "-index".to_string(),
            input.join("Zea_mays/Zea_mays").to_string(),
            "-out".to_string(),
            output.join("Zea_mays.fasta").to_string(),
            "-gff3".to_string(),
            output.join("Zea_mays.gff").to_string(),
        ]
    );
    let actions = report
        .items
        .iter()
        .map(|item| (item.species.as_str(), item.action))
        .collect::<Vec<_>>();
    assert_eq!(
        actions,
        vec![
            ("Homo_sapiens", StageAction::NotInRegistry),
            ("Zea_mays", StageAction::Built),
            ("Oryza_sativa_Japonica_Group", StageAction::AlreadyComplete),
        ]
    );
}

#[test]
fn unregistered_species_never_harvested_even_when_forced() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("ltr");
    let files = write_inputs(&input, &["9606.fasta"]);

    let run = pipeline(FakeTools::default(), &[], true);
    run.harvest(&input, &files, &output).unwrap();
    run.build_indexes(&input, &files, &input).unwrap();
    assert!(run.runner().calls().is_empty());
}

#[test]
fn resolver_exhaustion_aborts_batch() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("blastdb");
    let files = write_inputs(&input, &["9606.fasta"]);

    let run = Pipeline::new(
        DownTaxonomy,
        FakeTools::default(),
        RetryPolicy::new(2, true),
        SpeciesRegistry::default(),
        ToolPrograms::default(),
        PipelineOptions::default(),
    );
    let err = run
        .build_databases(&files, &input, DbType::Nucl, true, &output)
        .unwrap_err();
    assert_matches!(err, TaxoError::ResolutionExhausted { attempts: 2, .. });
    assert!(run.runner().calls().is_empty());
}

#[test]
fn tool_failure_is_surfaced() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("blastdb");
    let files = write_inputs(&input, &["9606.fasta", "4577.fasta"]);

    let run = pipeline(FailingTools, &[], false);
    let err = run
        .build_databases(&files, &input, DbType::Nucl, true, &output)
        .unwrap_err();
    assert_matches!(err, TaxoError::ToolFailed { program, .. } if program == "makeblastdb");
}

#[test]
fn forced_index_rebuilds_existing_index() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let files = write_inputs(&input, &["4577.fasta"]);
    fs::create_dir_all(input.join("Zea_mays")).unwrap();
    fs::write(input.join("Zea_mays/Zea_mays.esq"), b"").unwrap();

    let run = pipeline(FakeTools::default(), &["Zea_mays"], true);
    let report = run.build_indexes(&input, &files, &input).unwrap();

    let calls = run.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args[0], "suffixerator");
    assert_eq!(report.built()[0].as_str(), "Zea_mays");
}

#[test]
fn forced_harvest_reruns_existing_output() {
    let (_temp, root) = workspace();
    let input = root.join("genomes");
    let output = root.join("ltr");
    let files = write_inputs(&input, &["4577.fasta"]);
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("Zea_mays.fasta"), b"").unwrap();

    let run = pipeline(FakeTools::default(), &["Zea_mays"], true);
    let report = run.harvest(&input, &files, &output).unwrap();

    let calls = run.runner().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args[0], "ltrharvest");
    assert_eq!(report.with_action(StageAction::Built).len(), 1);
    assert_eq!(
        fs::read_to_string(output.join("Zea_mays.fasta")).unwrap(),
        ">ltr\nACGT\n"
    );
}
