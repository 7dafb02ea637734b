use chrono::NaiveDate;
use scraper::{ElementRef, Html, Node, Selector};

use crate::source::BillSource;
use crate::types::{BillStatus, BillType};
use crate::utils::reorder_name;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse date: {0}")]
    DateParse(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Invalid transcript link: {0}")]
    TranscriptLink(String),
    #[error("Invalid transcript entry: {0}")]
    TranscriptJson(#[from] serde_json::Error),
    #[error("{section} listing still has a next page after {pages} pages")]
    ListingPageLimit { section: String, pages: u32 },
    #[error("Invalid legislator feed: {0}")]
    Xml(#[from] quick_xml::de::DeError),
}

const LISTING_LINK_ID_PREFIX: &str = "main_0_content_0_lvResults_hlTitle_";

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(text: String) -> Option<String> {
    Some(text).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub bill_ids: Vec<String>,
    pub has_next: bool,
}

pub fn parse_listing(html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let link_sel = Selector::parse(&format!("a[id^=\"{}\"]", LISTING_LINK_ID_PREFIX)).unwrap();
    let next_sel = Selector::parse("a[title=\"Next page\"]").unwrap();

    let bill_ids = document
        .select(&link_sel)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let after = href.split("bId=").nth(1)?;
            non_empty(after.chars().take_while(|c| *c != '&' && *c != '#').collect())
        })
        .collect();

    ListingPage {
        bill_ids,
        has_next: document.select(&next_sel).next().is_some(),
    }
}

pub struct BillPage {
    document: Html,
}

impl BillPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// The `dd` that follows the `dt` captioned exactly `caption`.
    fn definition(&self, caption: &str) -> Option<ElementRef<'_>> {
        let dt_sel = Selector::parse("dt").unwrap();
        let dt = self
            .document
            .select(&dt_sel)
            .find(|e| normalize_whitespace(&elem_text(*e)) == caption)?;

        dt.next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "dd")
    }

    fn definition_text(&self, caption: &str) -> Option<String> {
        self.definition(caption)
            .map(|dd| normalize_whitespace(&elem_text(dd)))
    }

    fn required_definition(&self, caption: &str) -> Result<String, ParseError> {
        self.definition_text(caption)
            .ok_or_else(|| ParseError::MissingField(caption.to_string()))
    }
}

impl BillSource for BillPage {
    fn title(&self) -> Result<String, ParseError> {
        let meta_sel = Selector::parse("meta[property=\"og:title\"]").unwrap();
        self.document
            .select(&meta_sel)
            .next()
            .and_then(|e| e.value().attr("content"))
            .map(normalize_whitespace)
            .ok_or_else(|| ParseError::MissingField("og:title".to_string()))
    }

    fn status(&self) -> Result<BillStatus, ParseError> {
        self.required_definition("Status").map(BillStatus::from)
    }

    fn bill_type(&self) -> Result<BillType, ParseError> {
        self.required_definition("Type").map(BillType::from)
    }

    fn originating_house(&self) -> Result<String, ParseError> {
        self.required_definition("Originating house")
    }

    fn portfolio(&self) -> Option<String> {
        self.definition_text("Portfolio").and_then(non_empty)
    }

    fn summary(&self) -> Option<String> {
        let panel_sel = Selector::parse("div#main_0_summaryPanel").unwrap();
        let panel = self.document.select(&panel_sel).next()?;

        // The first descendant element is the panel heading.
        panel
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .nth(1)
            .map(|e| normalize_whitespace(&elem_text(e)))
            .and_then(non_empty)
    }

    fn sponsor_name(&self) -> Option<String> {
        let dd = self.definition("Sponsor(s)")?;

        // Co-sponsors follow the first <br>.
        let mut text = String::new();
        for child in dd.children() {
            match child.value() {
                Node::Element(e) if e.name() == "br" => break,
                Node::Text(t) => text.push_str(t),
                _ => {}
            }
        }

        reorder_name(&text)
    }

    fn pdf_url(&self) -> Result<Option<String>, ParseError> {
        let missing = || ParseError::MissingField("Text of bill".to_string());
        let h3_sel = Selector::parse("h3").unwrap();
        let row_sel = Selector::parse("tr").unwrap();
        let cell_sel = Selector::parse("td").unwrap();
        let link_sel = Selector::parse("a[href]").unwrap();

        let heading = self
            .document
            .select(&h3_sel)
            .find(|e| normalize_whitespace(&elem_text(*e)) == "Text of bill")
            .ok_or_else(missing)?;
        let table = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "table")
            .ok_or_else(missing)?;
        let row = table.select(&row_sel).last().ok_or_else(missing)?;
        let cell = row.select(&cell_sel).nth(1).ok_or_else(missing)?;

        // The first link in the cell is the explanatory memorandum.
        let href = cell
            .select(&link_sel)
            .nth(1)
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(missing)?;

        Ok(Some(href.to_string()))
    }

    fn last_updated(&self) -> Result<Option<NaiveDate>, ParseError> {
        let missing = || ParseError::MissingField("last updated".to_string());
        let main_sel = Selector::parse("div#main_0_mainDiv").unwrap();
        let table_sel = Selector::parse("table").unwrap();
        let row_sel = Selector::parse("tbody tr").unwrap();
        let cell_sel = Selector::parse("td").unwrap();

        let main = self.document.select(&main_sel).next().ok_or_else(missing)?;
        let table = main.select(&table_sel).last().ok_or_else(missing)?;
        let row = table.select(&row_sel).last().ok_or_else(missing)?;
        let cell = row.select(&cell_sel).last().ok_or_else(missing)?;

        parse_day_month_year(&elem_text(cell)).map(Some)
    }

    fn second_reading_url(&self) -> Option<String> {
        let item_sel = Selector::parse("ul.speech-transcripts li").unwrap();
        let link_sel = Selector::parse("a[href]").unwrap();

        // The first transcript is the first reading.
        self.document
            .select(&item_sel)
            .nth(1)?
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }
}

/// Parses dates like `5 Mar 2024`.
pub fn parse_day_month_year(text: &str) -> Result<NaiveDate, ParseError> {
    let text = normalize_whitespace(text);
    NaiveDate::parse_from_str(&text, "%d %b %Y")
        .map_err(|e| ParseError::DateParse(format!("{}: {}", text, e)))
}
