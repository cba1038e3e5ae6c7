//! Sheet row layouts and the row parser.
//!
//! Rows arrive as JSON cells (usually strings, sometimes numbers) in a fixed
//! column order. Parsing never fails loudly: a row that cannot become a record
//! is dropped and its siblings are unaffected.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::event::{Category, EventRecord};
use crate::geo::Coordinates;
use crate::user::UserRecord;

/// One raw row as returned by the tabular source.
pub type Row = Vec<Value>;

// Events sheet, columns A..M
pub const COL_ID: usize = 0;
pub const COL_TITLE: usize = 1;
pub const COL_CATEGORY: usize = 2;
pub const COL_DATE: usize = 3;
pub const COL_TIME: usize = 4;
pub const COL_LOCATION: usize = 5;
pub const COL_LATITUDE: usize = 6;
pub const COL_LONGITUDE: usize = 7;
pub const COL_DESCRIPTION: usize = 8;
pub const COL_PRICE: usize = 9;
pub const COL_CONTACT: usize = 10;
pub const COL_CREATOR: usize = 11;
pub const COL_CREATED_AT: usize = 12;
pub const EVENT_COLUMNS: usize = 13;

// Users sheet, columns A..F
pub const COL_USER_EMAIL: usize = 0;
pub const COL_USER_NAME: usize = 1;
pub const COL_USER_PHOTO: usize = 2;
pub const COL_USER_FIRST_LOGIN: usize = 3;
pub const COL_USER_LAST_LOGIN: usize = 4;
pub const COL_USER_ACTIVE: usize = 5;
pub const USER_COLUMNS: usize = 6;

/// Why a row did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    MissingTitle,
    MissingDate,
    InvalidDate(String),
}

/// Trimmed text of a cell; missing cells and empty strings are `None`.
pub fn cell_text(row: &[Value], index: usize) -> Option<String> {
    let text = match row.get(index)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

fn cell_number(row: &[Value], index: usize) -> Option<f64> {
    match row.get(index)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Parse a calendar date in any of the formats the sheet may hold.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, `YYYY/MM/DD` and RFC 3339 timestamps
/// (date part only).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // ISO datetime without an offset, e.g. "2025-06-14T19:30"
    s.get(..10)
        .filter(|_| s.as_bytes().get(10) == Some(&b'T'))
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Both coordinates must parse and be in range, otherwise the pair is absent.
fn parse_coordinates(row: &[Value]) -> Option<Coordinates> {
    let lat = cell_number(row, COL_LATITUDE)?;
    let lng = cell_number(row, COL_LONGITUDE)?;
    Coordinates::new(lat, lng)
}

/// Turn one events-sheet row into a record.
pub fn parse_event_row(row: &[Value]) -> Result<EventRecord, RowRejection> {
    let title = cell_text(row, COL_TITLE).ok_or(RowRejection::MissingTitle)?;
    let raw_date = cell_text(row, COL_DATE).ok_or(RowRejection::MissingDate)?;
    let date = parse_date(&raw_date).ok_or(RowRejection::InvalidDate(raw_date))?;

    let category = cell_text(row, COL_CATEGORY)
        .map(|c| Category::from_code_or_default(&c))
        .unwrap_or_default();

    Ok(EventRecord {
        id: cell_text(row, COL_ID).unwrap_or_default(),
        title,
        category,
        date,
        time: cell_text(row, COL_TIME),
        location: cell_text(row, COL_LOCATION).unwrap_or_default(),
        coordinates: parse_coordinates(row),
        description: cell_text(row, COL_DESCRIPTION),
        price: cell_text(row, COL_PRICE),
        contact: cell_text(row, COL_CONTACT),
        creator: cell_text(row, COL_CREATOR).unwrap_or_default(),
        created_at: cell_text(row, COL_CREATED_AT).and_then(|s| parse_timestamp(&s)),
    })
}

/// Serialize a record into the 13-column append layout.
pub fn event_to_row(event: &EventRecord) -> Vec<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    let mut row = vec![String::new(); EVENT_COLUMNS];
    row[COL_ID] = event.id.clone();
    row[COL_TITLE] = event.title.clone();
    row[COL_CATEGORY] = event.category.code().to_string();
    row[COL_DATE] = event.date.format("%Y-%m-%d").to_string();
    row[COL_TIME] = opt(&event.time);
    row[COL_LOCATION] = event.location.clone();
    if let Some(c) = event.coordinates {
        row[COL_LATITUDE] = c.lat.to_string();
        row[COL_LONGITUDE] = c.lng.to_string();
    }
    row[COL_DESCRIPTION] = opt(&event.description);
    row[COL_PRICE] = opt(&event.price);
    row[COL_CONTACT] = opt(&event.contact);
    row[COL_CREATOR] = event.creator.clone();
    row[COL_CREATED_AT] = event
        .created_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    row
}

/// Turn one users-sheet row into a record. Rows without an email are dropped.
pub fn parse_user_row(row: &[Value]) -> Option<UserRecord> {
    Some(UserRecord {
        email: cell_text(row, COL_USER_EMAIL)?,
        name: cell_text(row, COL_USER_NAME).unwrap_or_default(),
        photo_url: cell_text(row, COL_USER_PHOTO),
        first_login: cell_text(row, COL_USER_FIRST_LOGIN).and_then(|s| parse_timestamp(&s)),
        last_login: cell_text(row, COL_USER_LAST_LOGIN).and_then(|s| parse_timestamp(&s)),
        active: cell_text(row, COL_USER_ACTIVE).as_deref() == Some("true"),
    })
}

pub fn user_to_row(user: &UserRecord) -> Vec<String> {
    let stamp = |t: Option<DateTime<Utc>>| t.map(|t| t.to_rfc3339()).unwrap_or_default();

    let mut row = vec![String::new(); USER_COLUMNS];
    row[COL_USER_EMAIL] = user.email.clone();
    row[COL_USER_NAME] = user.name.clone();
    row[COL_USER_PHOTO] = user.photo_url.clone().unwrap_or_default();
    row[COL_USER_FIRST_LOGIN] = stamp(user.first_login);
    row[COL_USER_LAST_LOGIN] = stamp(user.last_login);
    row[COL_USER_ACTIVE] = user.active.to_string();
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn full_row() -> Row {
        vec![
            json!("evt_lx1abc_k3j9qz"),
            json!("Festa della birra"),
            json!("festa-birra"),
            json!("2025-07-05"),
            json!("18:00"),
            json!("Via Roma 1, Bergamo"),
            json!("45.6983"),
            json!("9.6773"),
            json!("Birre artigianali"),
            json!("Gratis"),
            json!("info@example.com"),
            json!("mario@example.com"),
            json!("2025-05-01T10:00:00.000Z"),
        ]
    }

    #[test]
    fn parses_complete_row() {
        let event = parse_event_row(&full_row()).unwrap();

        assert_eq!(event.id, "evt_lx1abc_k3j9qz");
        assert_eq!(event.category, Category::FestaBirra);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 7, 5).unwrap());
        assert_eq!(event.coordinates, Coordinates::new(45.6983, 9.6773));
        assert_eq!(event.price.as_deref(), Some("Gratis"));
        assert!(event.created_at.is_some());
    }

    #[test]
    fn non_numeric_latitude_drops_only_coordinates() {
        let mut row = full_row();
        row[COL_LATITUDE] = json!("north-ish");

        let event = parse_event_row(&row).unwrap();
        assert_eq!(event.coordinates, None);
        assert_eq!(event.title, "Festa della birra");
    }

    #[test]
    fn half_a_coordinate_pair_is_absent() {
        let mut row = full_row();
        row[COL_LONGITUDE] = json!("");

        assert_eq!(parse_event_row(&row).unwrap().coordinates, None);
    }

    #[test]
    fn numeric_cells_and_decimal_commas() {
        let mut row = full_row();
        row[COL_LATITUDE] = json!(45.5);
        row[COL_LONGITUDE] = json!("9,25");

        assert_eq!(
            parse_event_row(&row).unwrap().coordinates,
            Coordinates::new(45.5, 9.25)
        );
    }

    #[test]
    fn zero_coordinates_are_kept() {
        let mut row = full_row();
        row[COL_LATITUDE] = json!("0");
        row[COL_LONGITUDE] = json!("0");

        assert_eq!(
            parse_event_row(&row).unwrap().coordinates,
            Coordinates::new(0.0, 0.0)
        );
    }

    #[test]
    fn missing_title_rejects_row() {
        let mut row = full_row();
        row[COL_TITLE] = json!("   ");

        assert_eq!(parse_event_row(&row), Err(RowRejection::MissingTitle));
    }

    #[test]
    fn missing_or_bad_date_rejects_row() {
        let mut row = full_row();
        row.truncate(COL_DATE);
        assert_eq!(parse_event_row(&row), Err(RowRejection::MissingDate));

        let mut row = full_row();
        row[COL_DATE] = json!("next friday");
        assert_eq!(
            parse_event_row(&row),
            Err(RowRejection::InvalidDate("next friday".into()))
        );
    }

    #[test]
    fn unknown_category_is_coerced() {
        let mut row = full_row();
        row[COL_CATEGORY] = json!("Sagra");

        assert_eq!(parse_event_row(&row).unwrap().category, Category::Other);
    }

    #[test]
    fn short_row_fills_optional_fields_with_none() {
        let row = vec![json!(""), json!("Mercatino"), json!(""), json!("2025-12-08")];
        let event = parse_event_row(&row).unwrap();

        assert_eq!(event.category, Category::Other);
        assert_eq!(event.location, "");
        assert_eq!(event.time, None);
        assert_eq!(event.created_at, None);
    }

    #[test]
    fn date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 5);
        assert_eq!(parse_date("2025-07-05"), expected);
        assert_eq!(parse_date("05/07/2025"), expected);
        assert_eq!(parse_date("2025/07/05"), expected);
        assert_eq!(parse_date("2025-07-05T21:00:00+02:00"), expected);
        assert_eq!(parse_date("2025-07-05T21:00"), expected);
        assert_eq!(parse_date("July 5th"), None);
        assert_eq!(parse_date("2025-13-40"), None);
    }

    #[test]
    fn record_serializes_back_to_same_layout() {
        let event = parse_event_row(&full_row()).unwrap();
        let row = event_to_row(&event);

        assert_eq!(row.len(), EVENT_COLUMNS);
        assert_eq!(row[COL_CATEGORY], "festa-birra");
        assert_eq!(row[COL_LATITUDE], "45.6983");

        let cells: Row = row.into_iter().map(Value::String).collect();
        assert_eq!(parse_event_row(&cells).unwrap(), event);
    }

    fn user_cells(active: &str) -> Row {
        ["a@b.it", "Anna", "", "", "", active]
            .iter()
            .map(|c| json!(c))
            .collect()
    }

    #[test]
    fn user_row_active_flag_is_literal() {
        let row = user_cells("TRUE");
        let user = parse_user_row(&row).unwrap();
        assert!(!user.active);
        assert_eq!(user.photo_url, None);

        let row = user_cells("true");
        assert!(parse_user_row(&row).unwrap().active);

        assert!(parse_user_row(&[json!(""), json!("Nobody")]).is_none());
    }
}
