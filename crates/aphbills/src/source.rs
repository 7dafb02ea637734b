use chrono::NaiveDate;

use crate::parser::ParseError;
use crate::types::{Attribution, BillRecord, BillStatus, BillType};

pub trait BillSource {
    fn title(&self) -> Result<String, ParseError>;
    fn status(&self) -> Result<BillStatus, ParseError>;
    fn bill_type(&self) -> Result<BillType, ParseError>;
    fn originating_house(&self) -> Result<String, ParseError>;
    fn portfolio(&self) -> Option<String>;
    fn summary(&self) -> Option<String>;
    fn sponsor_name(&self) -> Option<String>;
    fn pdf_url(&self) -> Result<Option<String>, ParseError>;
    fn last_updated(&self) -> Result<Option<NaiveDate>, ParseError>;
    fn second_reading_url(&self) -> Option<String>;

    /// Minister already known to this source. Pages never know it.
    fn minister_name(&self) -> Option<String> {
        None
    }

    fn sponsor_attribution(&self) -> Option<Attribution> {
        None
    }

    fn minister_attribution(&self) -> Option<Attribution> {
        None
    }
}

fn required<T: Clone>(value: &Option<T>, field: &str) -> Result<T, ParseError> {
    value
        .clone()
        .ok_or_else(|| ParseError::MissingField(field.to_string()))
}

impl BillSource for BillRecord {
    fn title(&self) -> Result<String, ParseError> {
        required(&self.title, "title")
    }

    fn status(&self) -> Result<BillStatus, ParseError> {
        required(&self.status, "status")
    }

    fn bill_type(&self) -> Result<BillType, ParseError> {
        required(&self.bill_type, "type")
    }

    fn originating_house(&self) -> Result<String, ParseError> {
        required(&self.originating_house, "originating_house")
    }

    fn portfolio(&self) -> Option<String> {
        self.portfolio.clone()
    }

    fn summary(&self) -> Option<String> {
        self.summary.clone()
    }

    fn sponsor_name(&self) -> Option<String> {
        self.sponsor_name.clone()
    }

    fn pdf_url(&self) -> Result<Option<String>, ParseError> {
        Ok(self.pdf_url.clone())
    }

    fn last_updated(&self) -> Result<Option<NaiveDate>, ParseError> {
        Ok(self.last_updated)
    }

    fn second_reading_url(&self) -> Option<String> {
        self.second_reading_hansard_url.clone()
    }

    fn minister_name(&self) -> Option<String> {
        self.minister_name.clone()
    }

    fn sponsor_attribution(&self) -> Option<Attribution> {
        Some(Attribution {
            party: self.sponsor_party.clone(),
            id: self.sponsor_id,
            division: self.sponsor_division.clone(),
        })
    }

    fn minister_attribution(&self) -> Option<Attribution> {
        Some(Attribution {
            party: self.minister_party.clone(),
            id: self.minister_id,
            division: self.minister_division.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_source_requires_core_fields() {
        let record = BillRecord {
            bill_id: "r7001".to_string(),
            title: None,
            status: Some(BillStatus::Act),
            bill_type: None,
            portfolio: None,
            originating_house: None,
            summary: None,
            sponsor_name: None,
            sponsor_party: None,
            sponsor_id: None,
            sponsor_division: None,
            minister_name: None,
            minister_party: None,
            minister_id: None,
            minister_division: None,
            pdf_url: None,
            last_updated: None,
            second_reading_hansard_url: None,
        };

        assert_eq!(record.status().unwrap(), BillStatus::Act);
        assert!(matches!(record.title(), Err(ParseError::MissingField(f)) if f == "title"));
        assert_eq!(record.pdf_url().unwrap(), None);
        assert_eq!(
            record.minister_attribution(),
            Some(Attribution::default()),
            "Records always carry their own attribution, even when empty"
        );
    }
}
