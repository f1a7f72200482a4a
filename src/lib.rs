//! Per-species BLAST databases, GenomeTools suffix indexes and LTRharvest runs over a
//! directory of FASTA files named by NCBI taxonomy id.
//!
//! File names are resolved to `Genus_species` through NCBI E-utilities, each species gets its
//! own output directory, and work whose marker file already exists is skipped.

pub mod config;
pub mod domain;
pub mod error;
pub mod fasta;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod retry;
pub mod state;
pub mod taxonomy;
pub mod tools;
