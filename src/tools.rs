use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::DbType;
use crate::error::TaxoError;

/// Executable names (or paths) for the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPrograms {
    #[serde(default = "default_makeblastdb")]
    pub makeblastdb: String,
    #[serde(default = "default_gt")]
    pub gt: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            makeblastdb: default_makeblastdb(),
            gt: default_gt(),
        }
    }
}

fn default_makeblastdb() -> String {
    "makeblastdb".to_string()
}

fn default_gt() -> String {
    "gt".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn makeblastdb(program: &str, input: &Utf8Path, db_type: DbType, out: &Utf8Path) -> Self {
        Self {
            program: program.to_string(),
            args: vec![
                "-in".to_string(),
                input.to_string(),
                "-dbtype".to_string(),
                db_type.to_string(),
                "-out".to_string(),
                out.to_string(),
            ],
        }
    }

    pub fn suffixerator(program: &str, db: &Utf8Path, index_name: &Utf8Path) -> Self {
        let mut args = vec![
            "suffixerator".to_string(),
            "-db".to_string(),
            db.to_string(),
            "-indexname".to_string(),
            index_name.to_string(),
        ];
        args.extend(
            ["-tis", "-suf", "-lcp", "-des", "-ssp", "-sds", "-dna", "-v"]
                .iter()
                .map(|flag| flag.to_string()),
        );
        Self {
            program: program.to_string(),
            args,
        }
    }

    pub fn ltrharvest(program: &str, index: &Utf8Path, out: &Utf8Path, gff: &Utf8Path) -> Self {
        Self {
            program: program.to_string(),
            args: vec![
                "ltrharvest".to_string(),
                "-index".to_string(),
                index.to_string(),
                "-out".to_string(),
                out.to_string(),
                "-gff3".to_string(),
                gff.to_string(),
            ],
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

pub trait ToolRunner: Send + Sync {
    /// Runs to completion; a non-zero exit is an error.
    fn run(&self, invocation: &ToolInvocation) -> Result<(), TaxoError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub makeblastdb: ToolStatus,
    pub genometools: ToolStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub program: String,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

impl ToolStatus {
    fn detect(program: &str) -> Self {
        let path = if program.contains(std::path::MAIN_SEPARATOR) {
            Some(PathBuf::from(program)).filter(|path| path.exists())
        } else {
            find_in_path(program)
        };
        let version = path
            .as_ref()
            .and_then(|_| tool_version(program, &["-version"]));
        Self {
            program: program.to_string(),
            path,
            version,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn tool_info(&self, programs: &ToolPrograms) -> ToolInfo {
        ToolInfo {
            makeblastdb: ToolStatus::detect(&programs.makeblastdb),
            genometools: ToolStatus::detect(&programs.gt),
        }
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), TaxoError> {
        debug!("running {}", invocation.command_line());
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => TaxoError::MissingTool(invocation.program.clone()),
                _ => TaxoError::ToolSpawn {
                    program: invocation.program.clone(),
                    message: err.to_string(),
                },
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", invocation.program, stdout.trim());
        }
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(TaxoError::ToolFailed {
            program: invocation.program.clone(),
            status: output.status.to_string(),
            stderr: if stderr.is_empty() {
                format!("command failed: {}", invocation.command_line())
            } else {
                stderr
            },
        })
    }
}

/// Absolute path of `name` on `PATH`, if any.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}

fn tool_version(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
