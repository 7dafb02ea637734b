use std::collections::HashMap;
use std::fmt::{Display, Write as _};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::types::{BillRecord, Section};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pending: Vec<BillRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub passed: Vec<BillRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub failed: Vec<BillRecord>,
}

impl Snapshot {
    pub fn parse(yaml: &str) -> Result<Self, SnapshotError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// A missing file is a first run.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        match fs::read_to_string(path) {
            Ok(yaml) => Self::parse(&yaml).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn section(&self, section: Section) -> &[BillRecord] {
        match section {
            Section::Pending => &self.pending,
            Section::Passed => &self.passed,
            Section::Failed => &self.failed,
        }
    }

    pub fn into_index(self) -> HashMap<String, BillRecord> {
        self.pending
            .into_iter()
            .chain(self.passed)
            .chain(self.failed)
            .map(|record| (record.bill_id.clone(), record))
            .collect()
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn quoted(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{}\"", escape(v)),
        None => "null".to_string(),
    }
}

fn plain<T: Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

pub fn render_section_header(section: Section) -> String {
    format!("{}:\n", section.slug())
}

// Every key is always written, in this order.
pub fn render_record(record: &BillRecord) -> String {
    let fields = [
        ("title", quoted(record.title.as_deref())),
        ("status", quoted(record.status.as_ref().map(|s| s.as_str()))),
        ("type", quoted(record.bill_type.as_ref().map(|t| t.as_str()))),
        ("portfolio", quoted(record.portfolio.as_deref())),
        ("originating_house", quoted(record.originating_house.as_deref())),
        ("summary", quoted(record.summary.as_deref())),
        ("sponsor_name", quoted(record.sponsor_name.as_deref())),
        ("sponsor_party", quoted(record.sponsor_party.as_deref())),
        ("sponsor_id", plain(record.sponsor_id)),
        ("sponsor_division", quoted(record.sponsor_division.as_deref())),
        ("minister_name", quoted(record.minister_name.as_deref())),
        ("minister_party", quoted(record.minister_party.as_deref())),
        ("minister_id", plain(record.minister_id)),
        ("minister_division", quoted(record.minister_division.as_deref())),
        ("pdf_url", quoted(record.pdf_url.as_deref())),
        ("last_updated", plain(record.last_updated)),
        (
            "second_reading_hansard_url",
            quoted(record.second_reading_hansard_url.as_deref()),
        ),
    ];

    let mut out = format!("  - bill_id: {}\n", quoted(Some(record.bill_id.as_str())));
    for (key, value) in fields {
        let _ = writeln!(out, "    {}: {}", key, value);
    }
    out
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for section in Section::ALL {
        out.push_str(&render_section_header(section));
        for record in snapshot.section(section) {
            out.push_str(&render_record(record));
        }
    }
    out
}

/// Dropping the writer without committing deletes the partial file.
pub struct SnapshotWriter {
    final_path: PathBuf,
    temp_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl SnapshotWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let final_path = path.into();
        if let Some(parent) = final_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = final_path.clone().into_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        // Truncates anything a crashed run left behind.
        let file = File::create(&temp_path)?;

        Ok(Self {
            final_path,
            temp_path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    fn writer(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("snapshot already committed"))
    }

    pub fn begin_section(&mut self, section: Section) -> Result<(), SnapshotError> {
        self.writer()?
            .write_all(render_section_header(section).as_bytes())?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &BillRecord) -> Result<(), SnapshotError> {
        self.writer()?.write_all(render_record(record).as_bytes())?;
        Ok(())
    }

    pub fn commit(mut self) -> Result<PathBuf, SnapshotError> {
        let writer = self.writer()?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        self.writer = None;

        if let Err(e) = fs::rename(&self.temp_path, &self.final_path) {
            let _ = fs::remove_file(&self.temp_path);
            return Err(e.into());
        }
        log::debug!("Snapshot written to {:?}", self.final_path);
        Ok(self.final_path.clone())
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            log::warn!("Discarding unfinished snapshot {:?}", self.temp_path);
            if let Err(e) = fs::remove_file(&self.temp_path) {
                log::error!("Failed to remove {:?}: {}", self.temp_path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BillStatus, BillType};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn government_record() -> BillRecord {
        BillRecord {
            bill_id: "r7123".to_string(),
            title: Some("Treasury Laws Amendment (\"Better\" <Targeted>) Bill 2023".to_string()),
            status: Some(BillStatus::Act),
            bill_type: Some(BillType::Government),
            portfolio: Some("Treasury".to_string()),
            originating_house: Some("House of Representatives".to_string()),
            summary: Some("Amends C:\\ acts.".to_string()),
            sponsor_name: None,
            sponsor_party: None,
            sponsor_id: None,
            sponsor_division: None,
            minister_name: Some("Jim Chalmers".to_string()),
            minister_party: Some("Labor".to_string()),
            minister_id: Some(10119),
            minister_division: Some("Rankin".to_string()),
            pdf_url: Some("https://parlinfo.aph.gov.au/r7123.pdf".to_string()),
            last_updated: NaiveDate::from_ymd_opt(2024, 3, 5),
            second_reading_hansard_url: None,
        }
    }

    #[test]
    fn test_render_record_layout() {
        let rendered = render_record(&government_record());

        let expected = "  - bill_id: \"r7123\"
    title: \"Treasury Laws Amendment (&quot;Better&quot; &lt;Targeted&gt;) Bill 2023\"
    status: \"Act\"
    type: \"Government\"
    portfolio: \"Treasury\"
    originating_house: \"House of Representatives\"
    summary: \"Amends C:\\\\ acts.\"
    sponsor_name: null
    sponsor_party: null
    sponsor_id: null
    sponsor_division: null
    minister_name: \"Jim Chalmers\"
    minister_party: \"Labor\"
    minister_id: 10119
    minister_division: \"Rankin\"
    pdf_url: \"https://parlinfo.aph.gov.au/r7123.pdf\"
    last_updated: 2024-03-05
    second_reading_hansard_url: null
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_rendered_snapshot_reads_back() {
        let record = government_record();
        let snapshot = Snapshot {
            pending: Vec::new(),
            passed: vec![record.clone()],
            failed: Vec::new(),
        };

        let yaml = render_snapshot(&snapshot);
        let parsed = Snapshot::parse(&yaml).expect("Rendered snapshot should parse");

        assert!(parsed.pending.is_empty(), "Empty section reads as empty list");
        let read_back = &parsed.passed[0];
        assert_eq!(read_back.last_updated, record.last_updated);
        assert_eq!(read_back.summary.as_deref(), Some("Amends C:\\ acts."));
        assert_eq!(
            read_back.title.as_deref(),
            Some("Treasury Laws Amendment (&quot;Better&quot; &lt;Targeted&gt;) Bill 2023")
        );

        // Entities survive a second pass unchanged.
        assert_eq!(render_snapshot(&parsed), yaml);
    }

    #[test]
    fn test_parse_snapshot_with_quoted_ids() {
        let yaml = r#"pending:
passed:
  - bill_id: "s1402"
    title: "Environment Protection Amendment Bill 2023"
    status: "Not Proceeding"
    type: "Private"
    portfolio: null
    originating_house: "Senate"
    summary: "Amends the &quot;Act&quot;."
    sponsor_name: "Sarah Hanson-Young"
    sponsor_party: "Greens"
    sponsor_id: "10290"
    sponsor_division: "SA"
    minister_name: null
    minister_party: null
    minister_id: null
    minister_division: null
    pdf_url: "https://parlinfo.aph.gov.au/s1402.pdf"
    last_updated: 2023-09-14
    second_reading_hansard_url: "https://parlinfo.aph.gov.au/x"
failed:
"#;

        let snapshot = Snapshot::parse(yaml).expect("Quoted ids should be accepted");

        let record = &snapshot.passed[0];
        assert_eq!(record.sponsor_id, Some(10290));
        assert_eq!(record.minister_id, None);
        assert_eq!(record.status, Some(BillStatus::NotProceeding));
        assert_eq!(record.last_updated, NaiveDate::from_ymd_opt(2023, 9, 14));
        assert!(
            render_record(record).contains("    sponsor_id: 10290\n"),
            "Ids are written back unquoted"
        );
    }

    #[test]
    fn test_parse_snapshot_rejects_non_numeric_id() {
        let yaml = "passed:\n  - bill_id: \"s1402\"\n    sponsor_id: \"abc\"\n";

        assert!(matches!(Snapshot::parse(yaml), Err(SnapshotError::Yaml(_))));
    }

    #[test]
    fn test_load_missing_snapshot_is_first_run() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Snapshot::load(&dir.path().join("bills.yml")).unwrap(), None);
    }

    #[test]
    fn test_writer_commit_replaces_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("_data").join("bills.yml");

        let mut writer = SnapshotWriter::create(&path).unwrap();
        writer.begin_section(Section::Pending).unwrap();
        writer.write_record(&government_record()).unwrap();
        writer.begin_section(Section::Passed).unwrap();
        writer.begin_section(Section::Failed).unwrap();
        let temp = writer.temp_path().to_path_buf();
        writer.commit().unwrap();

        assert!(!temp.exists(), "Temporary file is renamed away");
        let snapshot = Snapshot::load(&path).unwrap().unwrap();
        assert_eq!(snapshot.pending.len(), 1);
        assert_eq!(snapshot.pending[0].bill_id, "r7123");
        assert_eq!(snapshot.pending[0].minister_id, Some(10119));
        assert!(snapshot.passed.is_empty() && snapshot.failed.is_empty());
    }

    #[test]
    fn test_abandoned_write_leaves_previous_snapshot_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bills.yml");
        fs::write(&path, "pending:\npassed:\nfailed:\n").unwrap();
        let before = fs::read(&path).unwrap();

        let temp = {
            let mut writer = SnapshotWriter::create(&path).unwrap();
            writer.begin_section(Section::Pending).unwrap();
            writer.write_record(&government_record()).unwrap();
            writer.temp_path().to_path_buf()
            // Dropped here, as if the run had failed mid-way.
        };

        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(!temp.exists(), "Partial output is cleaned up");
    }
}
