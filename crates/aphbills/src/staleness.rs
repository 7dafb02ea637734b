use std::fmt::Display;

use serde::Serialize;

use crate::snapshot::Snapshot;
use crate::types::{BillRecord, Section};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    NoExistingRecord,
    InProgress(String),
    MissingField(&'static str),
}

impl Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::NoExistingRecord => write!(f, "No existing bill"),
            StaleReason::InProgress(status) => {
                write!(f, "Updating bill data due to status {}", status)
            }
            StaleReason::MissingField(field) => {
                write!(f, "Updating bill data due to missing {}", field)
            }
        }
    }
}

fn required_fields(record: &BillRecord) -> Vec<(&'static str, bool)> {
    let mut fields = vec![
        ("bill_id", !record.bill_id.is_empty()),
        ("title", record.title.is_some()),
        ("status", record.status.is_some()),
        ("type", record.bill_type.is_some()),
        ("originating_house", record.originating_house.is_some()),
        ("summary", record.summary.is_some()),
        ("last_updated", record.last_updated.is_some()),
        (
            "second_reading_hansard_url",
            record.second_reading_hansard_url.is_some(),
        ),
    ];

    if record.is_private() {
        fields.extend([
            ("sponsor_name", record.sponsor_name.is_some()),
            ("sponsor_party", record.sponsor_party.is_some()),
            ("sponsor_id", record.sponsor_id.is_some()),
            ("sponsor_division", record.sponsor_division.is_some()),
        ]);
    } else {
        fields.extend([
            ("minister_name", record.minister_name.is_some()),
            ("minister_party", record.minister_party.is_some()),
            ("minister_id", record.minister_id.is_some()),
            ("portfolio", record.portfolio.is_some()),
            ("minister_division", record.minister_division.is_some()),
        ]);
    }

    fields
}

pub fn stale_reason(existing: Option<&BillRecord>) -> Option<StaleReason> {
    let Some(record) = existing else {
        return Some(StaleReason::NoExistingRecord);
    };

    match &record.status {
        Some(status) if status.is_terminal() => {}
        Some(status) => return Some(StaleReason::InProgress(status.to_string())),
        None => return Some(StaleReason::MissingField("status")),
    }

    required_fields(record)
        .into_iter()
        .find(|(_, present)| !present)
        .map(|(field, _)| StaleReason::MissingField(field))
}

pub fn is_sufficient(existing: Option<&BillRecord>) -> bool {
    stale_reason(existing).is_none()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StalenessEntry {
    pub section: Section,
    pub bill_id: String,
    pub title: Option<String>,
    /// `None` when the record would be reused as-is.
    pub reason: Option<String>,
}

impl Display for StalenessEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.section,
            self.bill_id,
            self.title.as_deref().unwrap_or("(untitled)"),
            self.reason.as_deref().unwrap_or("up to date")
        )
    }
}

pub fn staleness_report(snapshot: &Snapshot) -> Vec<StalenessEntry> {
    Section::ALL
        .into_iter()
        .flat_map(|section| {
            snapshot
                .section(section)
                .iter()
                .map(move |record| StalenessEntry {
                    section,
                    bill_id: record.bill_id.clone(),
                    title: record.title.clone(),
                    reason: stale_reason(Some(record)).map(|r| r.to_string()),
                })
        })
        .collect()
}
