use std::collections::BTreeSet;

use crate::domain::SpeciesName;

/// Allow-list of species that may go through indexing and harvesting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesRegistry {
    names: BTreeSet<String>,
}

impl SpeciesRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .map(|name: String| name.trim().replace(' ', "_"))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, species: &SpeciesName) -> bool {
        self.names.contains(species.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
