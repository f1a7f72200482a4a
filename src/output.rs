use std::io::{self, Write};

use serde::Serialize;

use crate::domain::SpeciesName;
use crate::pipeline::StageReport;
use crate::tools::ToolInfo;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameEntry {
    pub label: String,
    pub species: SpeciesName,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &StageReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_names(names: &[NameEntry]) -> io::Result<()> {
        Self::print_json(names)
    }

    pub fn print_tools(info: &ToolInfo) -> io::Result<()> {
        Self::print_json(info)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
