use tracing::warn;

use crate::domain::{FileLabel, SpeciesName};
use crate::error::TaxoError;
use crate::retry::RetryPolicy;
use crate::taxonomy::TaxonomyClient;

/// Maps input file names to species directory names.
#[derive(Clone)]
pub struct NameResolver<T: TaxonomyClient> {
    client: T,
}

impl<T: TaxonomyClient> NameResolver<T> {
    pub fn new(client: T) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &T {
        &self.client
    }

    /// Only service failures are errors; a label that is not a taxid, or a taxid the
    /// service does not know, falls back to the label itself.
    pub fn resolve(&self, label: &FileLabel) -> Result<SpeciesName, TaxoError> {
        let tax_id = match label.tax_id() {
            Ok(tax_id) => tax_id,
            Err(_) => {
                warn!(
                    "Invalid taxid {}. Generating folder with the same name.",
                    label.stem()
                );
                return Ok(SpeciesName::new(label.stem()));
            }
        };

        match self.client.scientific_name(tax_id)? {
            Some(name) => Ok(SpeciesName::from_scientific(&name)),
            None => {
                warn!("Taxid {label} not found.");
                Ok(SpeciesName::new(tax_id.to_string()))
            }
        }
    }

    pub fn resolve_with_retry(
        &self,
        label: &FileLabel,
        retry: &RetryPolicy,
    ) -> Result<SpeciesName, TaxoError> {
        retry.run(label.as_str(), || self.resolve(label))
    }

    pub fn resolve_all(
        &self,
        labels: &[FileLabel],
        retry: &RetryPolicy,
    ) -> Result<Vec<SpeciesName>, TaxoError> {
        labels
            .iter()
            .map(|label| self.resolve_with_retry(label, retry))
            .collect()
    }
}
