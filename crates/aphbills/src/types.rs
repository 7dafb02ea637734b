use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("Invalid section '{0}'. Accepted values: 'pending', 'passed', 'failed'")]
pub struct SectionParseError(String);

/// Chamber a bill originated in, encoded by the first letter of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chamber {
    Senate,
    House,
}

impl Chamber {
    pub fn from_bill_id(bill_id: &str) -> Self {
        if bill_id.starts_with('r') {
            Chamber::House
        } else {
            Chamber::Senate
        }
    }
}

impl Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Chamber::Senate => write!(f, "Senate"),
            Chamber::House => write!(f, "House of Representatives"),
        }
    }
}

/// Listing page a bill was found on. Also the top-level keys of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Pending,
    Passed,
    Failed,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Pending, Section::Passed, Section::Failed];

    pub fn slug(&self) -> &'static str {
        match self {
            Section::Pending => "pending",
            Section::Passed => "passed",
            Section::Failed => "failed",
        }
    }

    pub fn listing_path(&self) -> &'static str {
        match self {
            Section::Pending => "Bills_before_Parliament",
            Section::Passed => "Assented_Bills_of_the_current_Parliament",
            Section::Failed => "Bills_not_passed_current_Parliament",
        }
    }
}

impl FromStr for Section {
    type Err = SectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Section::Pending),
            "passed" => Ok(Section::Passed),
            "failed" => Ok(Section::Failed),
            _ => Err(SectionParseError(s.to_string())),
        }
    }
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Pending => write!(f, "Pending"),
            Section::Passed => write!(f, "Passed"),
            Section::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillStatus {
    Act,
    NotProceeding,
    /// Any non-terminal stage, kept verbatim ("Before Senate", "Passed Both Houses", ...).
    InProgress(String),
}

impl BillStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BillStatus::Act | BillStatus::NotProceeding)
    }

    pub fn as_str(&self) -> &str {
        match self {
            BillStatus::Act => "Act",
            BillStatus::NotProceeding => "Not Proceeding",
            BillStatus::InProgress(s) => s,
        }
    }
}

impl From<String> for BillStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Act" => BillStatus::Act,
            "Not Proceeding" => BillStatus::NotProceeding,
            _ => BillStatus::InProgress(s),
        }
    }
}

impl From<BillStatus> for String {
    fn from(status: BillStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BillType {
    Government,
    Private,
    Other(String),
}

impl BillType {
    pub fn as_str(&self) -> &str {
        match self {
            BillType::Government => "Government",
            BillType::Private => "Private",
            BillType::Other(s) => s,
        }
    }
}

impl From<String> for BillType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Government" => BillType::Government,
            "Private" => BillType::Private,
            _ => BillType::Other(s),
        }
    }
}

impl From<BillType> for String {
    fn from(bill_type: BillType) -> Self {
        bill_type.as_str().to_string()
    }
}

impl Display for BillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attribution {
    pub party: Option<String>,
    pub id: Option<u32>,
    pub division: Option<String>,
}

// Older snapshots quote roster ids ("10290").
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u32),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid roster id \"{}\"", text))),
    }
}

/// One bill as persisted in the snapshot. Field order matches the snapshot layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRecord {
    pub bill_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<BillStatus>,
    #[serde(default, rename = "type")]
    pub bill_type: Option<BillType>,
    #[serde(default)]
    pub portfolio: Option<String>,
    #[serde(default)]
    pub originating_house: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sponsor_name: Option<String>,
    #[serde(default)]
    pub sponsor_party: Option<String>,
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub sponsor_id: Option<u32>,
    #[serde(default)]
    pub sponsor_division: Option<String>,
    #[serde(default)]
    pub minister_name: Option<String>,
    #[serde(default)]
    pub minister_party: Option<String>,
    #[serde(default, deserialize_with = "id_from_number_or_string")]
    pub minister_id: Option<u32>,
    #[serde(default)]
    pub minister_division: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub last_updated: Option<NaiveDate>,
    #[serde(default)]
    pub second_reading_hansard_url: Option<String>,
}

impl BillRecord {
    pub fn chamber(&self) -> Chamber {
        Chamber::from_bill_id(&self.bill_id)
    }

    pub fn is_private(&self) -> bool {
        self.bill_type == Some(BillType::Private)
    }
}

impl Display for BillRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.bill_id,
            self.title.as_deref().unwrap_or("(untitled)")
        )?;
        if let Some(status) = &self.status {
            write!(f, " [{}]", status)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Legislator {
    pub id: u32,
    pub name: String,
    pub party: String,
    pub division: String,
}

impl Display for Legislator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.party, self.division)
    }
}
