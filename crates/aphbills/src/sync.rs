use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::fetcher::{FetchError, Fetcher, RetryPolicy, RetryingFetcher};
use crate::minister::{DEFAULT_MAX_TRANSCRIPT_STEPS, MinisterError, MinisterResolver};
use crate::parser::{BillPage, ParseError, parse_listing};
use crate::roster::{Role, Roster};
use crate::snapshot::{Snapshot, SnapshotError, SnapshotWriter};
use crate::source::BillSource;
use crate::staleness::stale_reason;
use crate::types::{BillRecord, BillType, Chamber, Section};
use crate::utils::SyncStats;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Minister(#[from] MinisterError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
    pub page_size: u32,
    pub max_listing_pages: u32,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub max_transcript_steps: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            page_size: 100,
            max_listing_pages: 50,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
            max_transcript_steps: DEFAULT_MAX_TRANSCRIPT_STEPS,
        }
    }
}

impl SyncConfig {
    pub fn fetcher(&self) -> Result<RetryingFetcher, FetchError> {
        RetryingFetcher::new(self.retry.clone(), self.timeout)
    }

    pub fn listing_url(&self, section: Section, page: u32) -> String {
        format!(
            "{}/{}?ps={}&page={}",
            self.base_url,
            section.listing_path(),
            self.page_size,
            page
        )
    }

    pub fn bill_url(&self, bill_id: &str) -> String {
        format!("{}/Bills_Search_Results/Result?bId={}", self.base_url, bill_id)
    }
}

pub struct Synchronizer<'a, F> {
    fetcher: &'a F,
    roster: &'a Roster,
    previous: HashMap<String, BillRecord>,
    config: SyncConfig,
    ministers: MinisterResolver,
}

impl<'a, F: Fetcher> Synchronizer<'a, F> {
    pub fn new(
        fetcher: &'a F,
        roster: &'a Roster,
        previous: HashMap<String, BillRecord>,
        config: SyncConfig,
    ) -> Self {
        let ministers = MinisterResolver::new(config.max_transcript_steps);
        Self {
            fetcher,
            roster,
            previous,
            config,
            ministers,
        }
    }

    /// All bill ids listed in `section`, following pagination. Sorted and de-duplicated.
    pub async fn fetch_section_ids(&self, section: Section) -> Result<Vec<String>, SyncError> {
        let mut ids = Vec::new();
        let mut page = 1;

        loop {
            let url = self.config.listing_url(section, page);
            log::debug!("Fetching {} listing page {}: {}", section, page, url);
            let listing = parse_listing(&self.fetcher.fetch(&url).await?);
            ids.extend(listing.bill_ids);

            if !listing.has_next {
                break;
            }
            if page >= self.config.max_listing_pages {
                return Err(ParseError::ListingPageLimit {
                    section: section.to_string(),
                    pages: page,
                }
                .into());
            }
            page += 1;
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Returns the record for `bill_id` and whether its page had to be fetched.
    pub async fn sync_bill(&self, bill_id: &str) -> Result<(BillRecord, bool), SyncError> {
        log::info!("Starting bill {} ({})", bill_id, Chamber::from_bill_id(bill_id));
        let existing = self.previous.get(bill_id);

        let (record, refreshed) = match (existing, stale_reason(existing)) {
            (Some(cached), None) => {
                log::info!("Existing bill data is sufficient");
                (self.assemble(bill_id, cached, Some(cached)).await?, false)
            }
            (_, reason) => {
                if let Some(reason) = reason {
                    log::info!("{}", reason);
                }
                let html = self.fetcher.fetch(&self.config.bill_url(bill_id)).await?;
                let page = BillPage::parse(&html);
                (self.assemble(bill_id, &page, existing).await?, true)
            }
        };

        log::info!(
            "Loaded bill {}: {}",
            bill_id,
            record.title.as_deref().unwrap_or_default()
        );
        Ok((record, refreshed))
    }

    pub async fn assemble<S: BillSource>(
        &self,
        bill_id: &str,
        source: &S,
        existing: Option<&BillRecord>,
    ) -> Result<BillRecord, SyncError> {
        let title = source.title()?;
        let status = source.status()?;
        let bill_type = source.bill_type()?;
        let originating_house = source.originating_house()?;
        let pdf_url = source.pdf_url()?;
        let last_updated = source.last_updated()?;
        let portfolio = source.portfolio();
        let second_reading_url = source.second_reading_url();

        let minister_name = if portfolio.is_none() || bill_type == BillType::Private {
            None
        } else if let Some(name) = source.minister_name() {
            Some(name)
        } else if let Some(name) = existing.and_then(|r| r.minister_name.clone()) {
            log::debug!("Reusing minister {} from existing record", name);
            Some(name)
        } else if let Some(url) = &second_reading_url {
            Some(self.ministers.resolve(self.fetcher, url).await?)
        } else {
            log::debug!("No second reading speech for {}", bill_id);
            None
        };

        let sponsor_name = source.sponsor_name();
        let sponsor = source.sponsor_attribution().unwrap_or_else(|| {
            self.roster
                .attribute(sponsor_name.as_deref(), Some(&bill_type), Role::Sponsor)
        });
        let minister = source.minister_attribution().unwrap_or_else(|| {
            self.roster
                .attribute(minister_name.as_deref(), Some(&bill_type), Role::Minister)
        });

        Ok(BillRecord {
            bill_id: bill_id.to_string(),
            title: Some(title),
            status: Some(status),
            bill_type: Some(bill_type),
            portfolio,
            originating_house: Some(originating_house),
            summary: source.summary(),
            sponsor_name,
            sponsor_party: sponsor.party,
            sponsor_id: sponsor.id,
            sponsor_division: sponsor.division,
            minister_name,
            minister_party: minister.party,
            minister_id: minister.id,
            minister_division: minister.division,
            pdf_url,
            last_updated,
            second_reading_hansard_url: second_reading_url,
        })
    }

    pub async fn run(&self, writer: &mut SnapshotWriter) -> Result<SyncStats, SyncError> {
        let mut stats = SyncStats::default();

        for section in Section::ALL {
            log::info!("Downloading {} bills", section);
            writer.begin_section(section)?;

            for bill_id in self.fetch_section_ids(section).await? {
                let (record, refreshed) = self
                    .sync_bill(&bill_id)
                    .await
                    .inspect_err(|e| log::error!("Failed to sync bill {}: {}", bill_id, e))?;
                writer.write_record(&record)?;

                let counts = stats.section_mut(section);
                if refreshed {
                    counts.refreshed += 1;
                } else {
                    counts.reused += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// Loads the snapshot at `output`, re-syncs every section and atomically replaces it.
/// On error the previous snapshot is left untouched.
pub async fn sync_snapshot<F: Fetcher>(
    fetcher: &F,
    roster: &Roster,
    output: &Path,
    config: SyncConfig,
) -> Result<SyncStats, SyncError> {
    let previous = Snapshot::load(output)?
        .map(Snapshot::into_index)
        .unwrap_or_default();
    log::info!("Loaded {} existing bill(s) from {:?}", previous.len(), output);

    let mut writer = SnapshotWriter::create(output)?;
    let stats = Synchronizer::new(fetcher, roster, previous, config)
        .run(&mut writer)
        .await?;
    writer.commit()?;

    Ok(stats)
}
