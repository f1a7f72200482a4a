use camino::Utf8Path;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{DbType, FileLabel, SpeciesName, Stage};
use crate::error::TaxoError;
use crate::layout::Layout;
use crate::registry::SpeciesRegistry;
use crate::resolver::NameResolver;
use crate::retry::RetryPolicy;
use crate::state::{Marker, completed_species};
use crate::taxonomy::TaxonomyClient;
use crate::tools::{ToolInvocation, ToolPrograms, ToolRunner};

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub force_rerun: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    Built,
    AlreadyComplete,
    NotInRegistry,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageItem {
    pub file: String,
    pub species: SpeciesName,
    pub action: StageAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub generated_at: String,
    pub items: Vec<StageItem>,
}

impl StageReport {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            generated_at: chrono::Utc::now().to_rfc3339(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, file: &FileLabel, species: SpeciesName, action: StageAction) {
        self.items.push(StageItem {
            file: file.as_str().to_string(),
            species,
            action,
        });
    }

    /// Species the stage actually ran the external tool for, in input order.
    pub fn built(&self) -> Vec<&SpeciesName> {
        self.with_action(StageAction::Built)
    }

    pub fn with_action(&self, action: StageAction) -> Vec<&SpeciesName> {
        self.items
            .iter()
            .filter(|item| item.action == action)
            .map(|item| &item.species)
            .collect()
    }
}

pub struct Pipeline<T: TaxonomyClient, R: ToolRunner> {
    resolver: NameResolver<T>,
    retry: RetryPolicy,
    registry: SpeciesRegistry,
    programs: ToolPrograms,
    runner: R,
    options: PipelineOptions,
}

impl<T: TaxonomyClient, R: ToolRunner> Pipeline<T, R> {
    pub fn new(
        client: T,
        runner: R,
        retry: RetryPolicy,
        registry: SpeciesRegistry,
        programs: ToolPrograms,
        options: PipelineOptions,
    ) -> Self {
        Self {
            resolver: NameResolver::new(client),
            retry,
            registry,
            programs,
            runner,
            options,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn resolve_names(&self, labels: &[FileLabel]) -> Result<Vec<SpeciesName>, TaxoError> {
        self.resolver.resolve_all(labels, &self.retry)
    }

    /// With `tax_id_input` the FASTA is the input file itself, otherwise
    /// `input_dir/<species>.fasta`.
    pub fn build_databases(
        &self,
        files: &[FileLabel],
        input_dir: &Utf8Path,
        db_type: DbType,
        tax_id_input: bool,
        output_dir: &Utf8Path,
    ) -> Result<StageReport, TaxoError> {
        let mut report = StageReport::new(Stage::Database);
        let completed = completed_species(output_dir, Marker::Database)?;
        if !self.options.force_rerun {
            for name in &completed {
                info!("{name} already contains a .ndb file. Skipping.");
            }
        }

        for file in files {
            let species = self.resolve(file)?;
            if completed.contains(species.as_str()) && !self.options.force_rerun {
                info!("{} database already exists. Skipping.", species.display_name());
                report.push(file, species, StageAction::AlreadyComplete);
                continue;
            }

            let species_dir = Layout::species_dir(output_dir, &species);
            Layout::ensure_dir(&species_dir)?;
            let input = if tax_id_input {
                Layout::input_file(input_dir, file)
            } else {
                Layout::species_fasta(input_dir, &species)
            };
            let invocation = ToolInvocation::makeblastdb(
                &self.programs.makeblastdb,
                &input,
                db_type,
                &Layout::database_prefix(output_dir, &species),
            );
            self.runner.run(&invocation)?;
            info!("Generated BLAST database for {species}.");
            report.push(file, species, StageAction::Built);
        }

        Ok(report)
    }

    pub fn build_indexes(
        &self,
        input_dir: &Utf8Path,
        files: &[FileLabel],
        index_dir: &Utf8Path,
    ) -> Result<StageReport, TaxoError> {
        let mut report = StageReport::new(Stage::Index);
        let completed = completed_species(index_dir, Marker::Index)?;

        for file in files {
            let species = self.resolve(file)?;
            if completed.contains(species.as_str()) && !self.options.force_rerun {
                info!("{} index already exists. Skipping.", species.display_name());
                report.push(file, species, StageAction::AlreadyComplete);
                continue;
            }
            if !self.registry.contains(&species) {
                debug!("{species} is not a registered species");
                report.push(file, species, StageAction::NotInRegistry);
                continue;
            }

            Layout::ensure_dir(&Layout::species_dir(index_dir, &species))?;
            let invocation = ToolInvocation::suffixerator(
                &self.programs.gt,
                &Layout::input_file(input_dir, file),
                &Layout::index_name(index_dir, &species),
            );
            self.runner.run(&invocation)?;
            info!("Generated LTRHarvest Index for {species}.");
            report.push(file, species, StageAction::Built);
        }

        Ok(report)
    }

    pub fn harvest(
        &self,
        index_dir: &Utf8Path,
        files: &[FileLabel],
        output_dir: &Utf8Path,
    ) -> Result<StageReport, TaxoError> {
        let mut report = StageReport::new(Stage::Harvest);
        let completed = completed_species(output_dir, Marker::Harvest)?;

        for file in files {
            let species = self.resolve(file)?;
            if completed.contains(species.as_str()) && !self.options.force_rerun {
                info!(
                    "LTRHarvest output for {} already exists. Skipping.",
                    species.display_name()
                );
                report.push(file, species, StageAction::AlreadyComplete);
                continue;
            }
            if !self.registry.contains(&species) {
                debug!("{species} is not a registered species");
                report.push(file, species, StageAction::NotInRegistry);
                continue;
            }

            Layout::ensure_dir(output_dir)?;
            let invocation = ToolInvocation::ltrharvest(
                &self.programs.gt,
                &Layout::index_name(index_dir, &species),
                &Layout::harvest_fasta(output_dir, &species),
                &Layout::harvest_gff(output_dir, &species),
            );
            self.runner.run(&invocation)?;
            info!("Generated LTRHarvest output for {species}.");
            report.push(file, species, StageAction::Built);
        }

        Ok(report)
    }

    fn resolve(&self, file: &FileLabel) -> Result<SpeciesName, TaxoError> {
        self.resolver.resolve_with_retry(file, &self.retry)
    }
}
