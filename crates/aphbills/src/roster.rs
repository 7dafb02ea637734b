use std::collections::HashMap;

use serde::Deserialize;

use crate::fetcher::{FetchError, Fetcher};
use crate::parser::ParseError;
use crate::types::{Attribution, BillType, Legislator};

pub const REPRESENTATIVES_URL: &str = "http://data.openaustralia.org.au/members/representatives.xml";
pub const SENATORS_URL: &str = "http://data.openaustralia.org.au/members/senators.xml";
pub const PEOPLE_URL: &str = "http://data.openaustralia.org.au/members/people.xml";

/// Party codes of presiding officers, who sit without a party for sponsorship purposes.
const PRESIDING_OFFICER_PARTIES: [&str; 2] = ["SPK", "PRES"];

const SEAT_OFFICE_PREFIXES: [&str; 2] = ["uk.org.publicwhip/member/", "uk.org.publicwhip/lord/"];

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to download legislator feed: {0}")]
    Fetch(#[from] FetchError),
    #[error("Failed to parse legislator feed: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Deserialize)]
struct MembersFeed {
    #[serde(rename = "member", default)]
    members: Vec<MemberEntry>,
}

#[derive(Debug, Deserialize)]
struct MemberEntry {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@party", default)]
    party: String,
    #[serde(rename = "@division", default)]
    division: String,
}

#[derive(Debug, Deserialize)]
struct PeopleFeed {
    #[serde(rename = "person", default)]
    people: Vec<PersonEntry>,
}

#[derive(Debug, Deserialize)]
struct PersonEntry {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@latestname")]
    latest_name: String,
    #[serde(rename = "office", default)]
    offices: Vec<OfficeEntry>,
}

#[derive(Debug, Deserialize)]
struct OfficeEntry {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@current", default)]
    current: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sponsor,
    Minister,
}

pub fn short_party_name(party: &str) -> String {
    match party {
        "Liberal Party" => "Liberal",
        "Australian Labor Party" => "Labor",
        "Australian Greens" => "Greens",
        "National Party" => "National",
        "Pauline Hanson's One Nation Party" => "One Nation",
        other => other,
    }
    .to_string()
}

fn trailing_number(id: &str) -> Option<u32> {
    id.rsplit('/').next()?.parse().ok()
}

/// The seat a person holds now, or their most recent one.
fn seat_office(person: &PersonEntry) -> Option<&OfficeEntry> {
    let seats: Vec<&OfficeEntry> = person
        .offices
        .iter()
        .filter(|o| SEAT_OFFICE_PREFIXES.iter().any(|p| o.id.contains(p)))
        .collect();

    seats
        .iter()
        .find(|o| o.current.as_deref() == Some("yes"))
        .or_else(|| {
            seats
                .iter()
                .max_by_key(|o| trailing_number(&o.id).unwrap_or(0))
        })
        .copied()
}

pub fn build_roster(
    representatives_xml: &str,
    senators_xml: &str,
    people_xml: &str,
) -> Result<Roster, ParseError> {
    let representatives: MembersFeed = quick_xml::de::from_str(representatives_xml)?;
    let senators: MembersFeed = quick_xml::de::from_str(senators_xml)?;
    let people: PeopleFeed = quick_xml::de::from_str(people_xml)?;

    let members: HashMap<&str, &MemberEntry> = representatives
        .members
        .iter()
        .chain(senators.members.iter())
        .map(|m| (m.id.as_str(), m))
        .collect();

    let mut legislators = Vec::with_capacity(people.people.len());
    for person in &people.people {
        let Some(office) = seat_office(person) else {
            log::warn!("Skipping {}: no seat office", person.latest_name);
            continue;
        };
        let Some(member) = members.get(office.id.as_str()) else {
            log::warn!(
                "Skipping {}: office {} not in member feeds",
                person.latest_name,
                office.id
            );
            continue;
        };
        let Some(id) = trailing_number(&person.id) else {
            log::warn!("Skipping {}: invalid person id {}", person.latest_name, person.id);
            continue;
        };

        legislators.push(Legislator {
            id,
            name: person.latest_name.clone(),
            party: short_party_name(&member.party),
            division: member.division.clone(),
        });
    }

    log::info!("Built roster of {} legislators", legislators.len());
    Ok(Roster::new(legislators))
}

pub async fn fetch_roster<F: Fetcher>(fetcher: &F) -> Result<Roster, RosterError> {
    log::info!("Fetching legislator feeds...");
    let representatives = fetcher.fetch(REPRESENTATIVES_URL).await?;
    let senators = fetcher.fetch(SENATORS_URL).await?;
    let people = fetcher.fetch(PEOPLE_URL).await?;
    Ok(build_roster(&representatives, &senators, &people)?)
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    legislators: Vec<Legislator>,
    ruling_party: Option<String>,
}

impl Roster {
    pub fn new(legislators: Vec<Legislator>) -> Self {
        let ruling_party = most_common_party(&legislators);
        Self {
            legislators,
            ruling_party,
        }
    }

    pub fn legislators(&self) -> &[Legislator] {
        &self.legislators
    }

    pub fn ruling_party(&self) -> Option<&str> {
        self.ruling_party.as_deref()
    }

    /// Case-insensitive exact match. With duplicate names the first legislator wins.
    pub fn find(&self, name: &str) -> Option<&Legislator> {
        let name = name.to_lowercase();
        self.legislators
            .iter()
            .find(|l| l.name.to_lowercase() == name)
    }

    pub fn attribute(
        &self,
        name: Option<&str>,
        bill_type: Option<&BillType>,
        role: Role,
    ) -> Attribution {
        let assume_ruling = role == Role::Minister && bill_type == Some(&BillType::Government);

        match name.and_then(|n| self.find(n)) {
            Some(legislator) => {
                let party = if PRESIDING_OFFICER_PARTIES.contains(&legislator.party.as_str()) {
                    self.ruling_party.clone()
                } else {
                    Some(legislator.party.clone())
                };
                Attribution {
                    party,
                    id: Some(legislator.id),
                    division: Some(legislator.division.clone()),
                }
            }
            None if assume_ruling => Attribution {
                party: self.ruling_party.clone(),
                ..Attribution::default()
            },
            None => Attribution::default(),
        }
    }
}

/// Mode of party affiliation; ties go to the party encountered first.
fn most_common_party(legislators: &[Legislator]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for legislator in legislators {
        match counts.iter_mut().find(|(p, _)| *p == legislator.party) {
            Some((_, count)) => *count += 1,
            None => counts.push((legislator.party.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (party, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((party, count));
        }
    }
    best.map(|(party, _)| party.to_string())
}
