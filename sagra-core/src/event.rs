//! Event records and submissions.
//!
//! `EventRecord` is what the cache holds and the filter pipeline returns.
//! `NewEvent` is the user-submitted draft that becomes a record after
//! validation, geocoding and id assignment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SagraError, SagraResult};
use crate::geo::Coordinates;
use crate::row::parse_date;

pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MIN_LOCATION_LENGTH: usize = 3;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Event category. The set is closed; anything else read from the sheet
/// becomes `Other`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    FestaPaese,
    StreetFood,
    FestaBirra,
    Concerto,
    Bambini,
    Cultura,
    Sport,
    #[default]
    #[serde(rename = "altro")]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::FestaPaese,
        Category::StreetFood,
        Category::FestaBirra,
        Category::Concerto,
        Category::Bambini,
        Category::Cultura,
        Category::Sport,
        Category::Other,
    ];

    /// Code stored in the sheet's Category column.
    pub fn code(&self) -> &'static str {
        match self {
            Category::FestaPaese => "festa-paese",
            Category::StreetFood => "street-food",
            Category::FestaBirra => "festa-birra",
            Category::Concerto => "concerto",
            Category::Bambini => "bambini",
            Category::Cultura => "cultura",
            Category::Sport => "sport",
            Category::Other => "altro",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::FestaPaese => "Festa di paese",
            Category::StreetFood => "Street Food",
            Category::FestaBirra => "Festa della birra",
            Category::Concerto => "Concerti",
            Category::Bambini => "Eventi per bambini",
            Category::Cultura => "Cultura e libri",
            Category::Sport => "Sport",
            Category::Other => "Altro",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Lenient mapping used for sheet rows: unknown or empty codes become `Other`.
    pub fn from_code_or_default(code: &str) -> Self {
        Category::from_code(code.trim()).unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_code(s.trim()).ok_or_else(|| {
            let known: Vec<_> = Category::ALL.iter().map(|c| c.code()).collect();
            format!("Unknown category '{}'. Available: {}", s, known.join(", "))
        })
    }
}

/// A validated, normalized event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub contact: Option<String>,
    pub creator: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.date)
    }
}

/// An event as submitted by a user, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub title: String,
    pub category: String,
    pub date: String,
    pub time: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub contact: Option<String>,
}

/// A submission that passed validation.
#[derive(Debug, Clone)]
pub struct ValidEvent {
    pub title: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub price: Option<String>,
    pub contact: Option<String>,
}

impl NewEvent {
    /// Check every field constraint, collecting all violations.
    ///
    /// `today` is the first acceptable event date.
    pub fn validate(&self, today: NaiveDate) -> SagraResult<ValidEvent> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        } else if title_len < MIN_TITLE_LENGTH {
            errors.push(format!(
                "Title must be at least {} characters",
                MIN_TITLE_LENGTH
            ));
        } else if title_len > MAX_TITLE_LENGTH {
            errors.push(format!(
                "Title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            ));
        }

        let category = if self.category.trim().is_empty() {
            errors.push("Category is required".to_string());
            None
        } else {
            let category = Category::from_code(self.category.trim());
            if category.is_none() {
                errors.push(format!("Invalid category '{}'", self.category.trim()));
            }
            category
        };

        let date = if self.date.trim().is_empty() {
            errors.push("Date is required".to_string());
            None
        } else {
            match parse_date(&self.date) {
                Some(date) if date < today => {
                    errors.push("Date must be today or in the future".to_string());
                    None
                }
                Some(date) => Some(date),
                None => {
                    errors.push(format!("Invalid date '{}'", self.date.trim()));
                    None
                }
            }
        };

        let location = self.location.trim();
        if location.is_empty() {
            errors.push("Location is required".to_string());
        } else if location.chars().count() < MIN_LOCATION_LENGTH {
            errors.push(format!(
                "Location must be at least {} characters",
                MIN_LOCATION_LENGTH
            ));
        }

        let description = non_empty(self.description.as_deref());
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LENGTH)
        {
            errors.push(format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }

        match (category, date) {
            (Some(category), Some(date)) if errors.is_empty() => Ok(ValidEvent {
                title: title.to_string(),
                category,
                date,
                time: non_empty(self.time.as_deref()),
                location: location.to_string(),
                description,
                price: non_empty(self.price.as_deref()),
                contact: non_empty(self.contact.as_deref()),
            }),
            _ => Err(SagraError::ValidationFailed(errors)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn draft() -> NewEvent {
        NewEvent {
            title: "Sagra del tortello".into(),
            category: "festa-paese".into(),
            date: "2025-06-14".into(),
            time: Some("19:30".into()),
            location: "Piazza Garibaldi, Parma".into(),
            description: Some("  ".into()),
            price: None,
            contact: None,
        }
    }

    #[test]
    fn category_codes_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
    }

    #[test]
    fn unknown_category_defaults_to_other() {
        assert_eq!(Category::from_code_or_default("rave"), Category::Other);
        assert_eq!(Category::from_code_or_default(""), Category::Other);
        assert_eq!(Category::from_code_or_default(" sport "), Category::Sport);
    }

    #[test]
    fn category_serializes_as_sheet_code() {
        let json = serde_json::to_string(&Category::StreetFood).unwrap();
        assert_eq!(json, "\"street-food\"");
        let json = serde_json::to_string(&Category::Other).unwrap();
        assert_eq!(json, "\"altro\"");
    }

    #[test]
    fn valid_draft_is_normalized() {
        let valid = draft().validate(today()).unwrap();

        assert_eq!(valid.category, Category::FestaPaese);
        assert_eq!(valid.date, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap());
        assert_eq!(valid.description, None);
        assert_eq!(valid.time.as_deref(), Some("19:30"));
    }

    #[test]
    fn today_is_accepted() {
        let mut d = draft();
        d.date = "2025-06-02".into();
        assert!(d.validate(today()).is_ok());
    }

    #[test]
    fn past_date_is_rejected() {
        let mut d = draft();
        d.date = "2025-06-01".into();

        let err = d.validate(today()).unwrap_err();
        assert_eq!(err.violations(), ["Date must be today or in the future"]);
    }

    #[test]
    fn collects_every_violation() {
        let d = NewEvent {
            title: "ab".into(),
            category: "rave".into(),
            date: "someday".into(),
            location: "".into(),
            description: Some("x".repeat(501)),
            ..Default::default()
        };

        let err = d.validate(today()).unwrap_err();
        assert_eq!(err.violations().len(), 5, "{:?}", err.violations());
    }

    #[test]
    fn title_length_bounds() {
        let mut d = draft();
        d.title = "x".repeat(MAX_TITLE_LENGTH);
        assert!(d.validate(today()).is_ok());

        d.title = "x".repeat(MAX_TITLE_LENGTH + 1);
        assert!(d.validate(today()).is_err());
    }

    #[test]
    fn missing_category_is_required_error() {
        let mut d = draft();
        d.category = " ".into();

        let err = d.validate(today()).unwrap_err();
        assert_eq!(err.violations(), ["Category is required"]);
    }
}
