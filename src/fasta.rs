use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use crate::error::TaxoError;

const LINE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub id: String,
    pub description: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        sequence: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            sequence: sequence.into(),
        }
    }

    /// `>id description`, or just the description when it already starts with the id.
    pub fn header(&self) -> String {
        if self.description.is_empty() {
            format!(">{}", self.id)
        } else if self.description.split_whitespace().next() == Some(self.id.as_str()) {
            format!(">{}", self.description)
        } else {
            format!(">{} {}", self.id, self.description)
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}", self.header())?;
        for chunk in self.sequence.as_bytes().chunks(LINE_WIDTH) {
            writer.write_all(chunk)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Anything that can hand out its sequence as a FASTA record.
pub trait FastaExport {
    fn fasta_record(&self) -> FastaRecord;
}

impl FastaExport for FastaRecord {
    fn fasta_record(&self) -> FastaRecord {
        self.clone()
    }
}

/// Writes one record per entry, in iteration order, to `output_dir/file_name`.
/// A `.gz` file name is gzip-compressed. Nothing is cleaned up on failure.
pub fn concat_fasta<'a, K, S, I>(
    entries: I,
    output_dir: &Utf8Path,
    file_name: &str,
) -> Result<Utf8PathBuf, TaxoError>
where
    K: Display,
    S: FastaExport + 'a + ?Sized,
    I: IntoIterator<Item = (K, &'a S)>,
{
    let path = output_dir.join(file_name);
    let file = File::create(path.as_std_path())
        .map_err(|err| TaxoError::Filesystem(format!("create {path}: {err}")))?;

    if path.extension() == Some("gz") {
        let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
        write_entries(&mut writer, entries, file_name)?;
        let encoder = writer
            .into_inner()
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        encoder
            .finish()
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
    } else {
        let mut writer = BufWriter::new(file);
        write_entries(&mut writer, entries, file_name)?;
        writer
            .flush()
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
    }
    Ok(path)
}

fn write_entries<'a, W, K, S, I>(writer: &mut W, entries: I, file_name: &str) -> Result<(), TaxoError>
where
    W: Write,
    K: Display,
    S: FastaExport + 'a + ?Sized,
    I: IntoIterator<Item = (K, &'a S)>,
{
    for (key, object) in entries {
        object
            .fasta_record()
            .write_to(writer)
            .map_err(|err| TaxoError::Filesystem(err.to_string()))?;
        info!("Extracted FASTA from {key} and appended to {file_name}.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_sixty_columns() {
        let record = FastaRecord::new("chr1", "", "A".repeat(130));
        let mut out = Vec::new();
        record.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], ">chr1");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }

    #[test]
    fn header_with_description() {
        let record = FastaRecord::new("ltr_1", "Zea mays LTR", "ACGT");
        assert_eq!(record.header(), ">ltr_1 Zea mays LTR");
    }

    #[test]
    fn header_does_not_repeat_leading_id() {
        let record = FastaRecord::new("chr1", "chr1 Zea mays", "ACGT");
        assert_eq!(record.header(), ">chr1 Zea mays");

        let bare = FastaRecord::new("chr1", "chr1", "ACGT");
        assert_eq!(bare.header(), ">chr1");

        let prefixed = FastaRecord::new("chr1", "chr10 scaffold", "ACGT");
        assert_eq!(prefixed.header(), ">chr1 chr10 scaffold");
    }
}
