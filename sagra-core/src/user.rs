//! Companion user dataset and the authenticated principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the users sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub first_login: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub active: bool,
}

/// The authenticated submitter, as handed to us by whatever did the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

impl Principal {
    pub fn from_email(email: impl Into<String>) -> Self {
        Principal {
            email: email.into(),
            name: None,
            photo_url: None,
        }
    }

    /// First sighting of this principal, as stored in the users sheet.
    pub fn to_user_record(&self, now: DateTime<Utc>) -> UserRecord {
        UserRecord {
            email: self.email.clone(),
            name: self.name.clone().unwrap_or_default(),
            photo_url: self.photo_url.clone(),
            first_login: Some(now),
            last_login: Some(now),
            active: true,
        }
    }
}
