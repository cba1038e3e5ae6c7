//! Fetch orchestration: cache-or-fetch for events and users, and the
//! add-event path.
//!
//! Concurrent `load_events` calls are serialized by a per-scope fetch guard.
//! A caller that waited on an in-flight fetch takes that fetch's outcome:
//! the fresh cache on success, the same error on failure. Overlapping
//! callers share one read either way.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::cache::{CacheScope, CacheStore, DEFAULT_TTL};
use crate::error::{SagraError, SagraResult, SourceError};
use crate::event::{EventRecord, NewEvent};
use crate::filter::{self, FilterState};
use crate::geo::Haversine;
use crate::geocode::{Geocode, Geocoder};
use crate::id::{IdGenerator, IdSource};
use crate::row::{self, Row};
use crate::source::TabularSource;
use crate::user::{Principal, UserRecord};

/// Sheet names and ranges the store reads and appends to.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub events_sheet: String,
    pub users_sheet: String,
}

impl SheetLayout {
    pub fn events_range(&self) -> String {
        format!("{}!A:M", self.events_sheet)
    }

    pub fn users_range(&self) -> String {
        format!("{}!A:F", self.users_sheet)
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            events_sheet: "Eventi".to_string(),
            users_sheet: "Utenti".to_string(),
        }
    }
}

/// Serializes reads for one cache scope and remembers how the last one went.
#[derive(Default)]
struct FetchGuard {
    /// Completed attempts, bumped while `last_failure` is held.
    attempts: AtomicU64,
    last_failure: Mutex<Option<SourceError>>,
}

impl FetchGuard {
    fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Acquire)
    }

    fn record(&self, failure: &mut Option<SourceError>, outcome: Option<SourceError>) {
        *failure = outcome;
        self.attempts.fetch_add(1, Ordering::Release);
    }
}

pub struct EventStore {
    source: Arc<dyn TabularSource>,
    geocoder: Arc<dyn Geocoder>,
    layout: SheetLayout,
    ids: Arc<dyn IdSource>,
    cache: Mutex<CacheStore>,
    events_fetch: FetchGuard,
    users_fetch: FetchGuard,
}

impl EventStore {
    pub fn new(
        source: Arc<dyn TabularSource>,
        geocoder: Arc<dyn Geocoder>,
        layout: SheetLayout,
    ) -> Self {
        EventStore::with_ttl(source, geocoder, layout, DEFAULT_TTL)
    }

    pub fn with_ttl(
        source: Arc<dyn TabularSource>,
        geocoder: Arc<dyn Geocoder>,
        layout: SheetLayout,
        ttl: Duration,
    ) -> Self {
        EventStore {
            source,
            geocoder,
            layout,
            ids: Arc::new(IdGenerator::new()),
            cache: Mutex::new(CacheStore::new(ttl)),
            events_fetch: FetchGuard::default(),
            users_fetch: FetchGuard::default(),
        }
    }

    /// Replace the default [`IdGenerator`].
    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    /// Current and future events, from cache when fresh.
    pub async fn load_events(&self) -> SagraResult<Arc<Vec<EventRecord>>> {
        if let Some(events) = self.fresh_events().await {
            tracing::debug!(count = events.len(), "events cache hit");
            return Ok(events);
        }

        let attempts_seen = self.events_fetch.attempts();
        let mut last_failure = self.events_fetch.last_failure.lock().await;

        // Someone else may have completed a fetch while we waited
        if let Some(events) = self.fresh_events().await {
            tracing::debug!(count = events.len(), "events fetched by concurrent caller");
            return Ok(events);
        }
        if self.events_fetch.attempts() != attempts_seen
            && let Some(e) = last_failure.as_ref()
        {
            tracing::debug!(error = %e, "concurrent events fetch failed");
            return Err(SagraError::from(e.clone()));
        }

        let range = self.layout.events_range();
        tracing::debug!(range = %range, "events cache miss, fetching");

        let result = self.source.read_range(&range).await;
        self.events_fetch
            .record(&mut last_failure, result.as_ref().err().cloned());

        let rows = result.map_err(|e| {
            tracing::error!(range = %range, error = %e, "failed to fetch events");
            SagraError::from(e)
        })?;

        let events = parse_events(&rows, today());
        tracing::info!(rows = rows.len().saturating_sub(1), kept = events.len(), "loaded events");

        let mut cache = self.cache.lock().await;
        Ok(cache.events.replace(events, Instant::now()))
    }

    async fn fresh_events(&self) -> Option<Arc<Vec<EventRecord>>> {
        let cache = self.cache.lock().await;
        cache.events.fresh(Instant::now(), cache.ttl())
    }

    /// Clear one cache scope, or everything.
    pub async fn invalidate(&self, scope: Option<CacheScope>) {
        tracing::debug!(scope = ?scope, "invalidating cache");
        self.cache.lock().await.invalidate(scope);
    }

    /// Drop everything cached and fetch events again.
    pub async fn force_reload(&self) -> SagraResult<Arc<Vec<EventRecord>>> {
        self.invalidate(None).await;
        self.load_events().await
    }

    /// Load events and run the filter pipeline against today's date.
    pub async fn search(&self, state: &FilterState) -> SagraResult<Vec<EventRecord>> {
        let events = self.load_events().await?;
        Ok(filter::apply(&events, state, today(), &Haversine))
    }

    /// Validate, geocode and append a new event.
    ///
    /// Geocoding failures are not errors: the event is stored without
    /// coordinates.
    pub async fn add_event(
        &self,
        principal: Option<&Principal>,
        draft: &NewEvent,
    ) -> SagraResult<EventRecord> {
        let principal = principal.ok_or(SagraError::AuthenticationRequired)?;
        let valid = draft.validate(today())?;

        let coordinates = match self.geocoder.geocode(&valid.location).await {
            Geocode::Resolved(c) => Some(c),
            Geocode::Unresolved(reason) => {
                tracing::warn!(
                    location = %valid.location,
                    reason = %reason,
                    "storing event without coordinates"
                );
                None
            }
        };

        let id = self.ids.next_id();
        let current = self.load_events().await?;
        if current.iter().any(|e| e.id == id) {
            tracing::error!(id = %id, "generated id already exists");
            return Err(SagraError::IdCollision(id));
        }

        let event = EventRecord {
            id,
            title: valid.title,
            category: valid.category,
            date: valid.date,
            time: valid.time,
            location: valid.location,
            coordinates,
            description: valid.description,
            price: valid.price,
            contact: valid.contact,
            creator: principal.email.clone(),
            created_at: Some(Utc::now()),
        };

        self.source
            .append_rows(&self.layout.events_sheet, vec![row::event_to_row(&event)])
            .await
            .map_err(|e| {
                tracing::error!(id = %event.id, error = %e, "failed to append event");
                SagraError::from(e)
            })?;

        self.invalidate(Some(CacheScope::Events)).await;
        tracing::info!(id = %event.id, title = %event.title, "event added");

        Ok(event)
    }

    /// Users from the companion sheet. Read failures degrade to an empty list.
    pub async fn load_users(&self) -> Arc<Vec<UserRecord>> {
        if let Some(users) = self.fresh_users().await {
            return users;
        }

        let attempts_seen = self.users_fetch.attempts();
        let mut last_failure = self.users_fetch.last_failure.lock().await;
        if let Some(users) = self.fresh_users().await {
            return users;
        }
        if self.users_fetch.attempts() != attempts_seen && last_failure.is_some() {
            return Arc::new(Vec::new());
        }

        let range = self.layout.users_range();
        let result = self.source.read_range(&range).await;
        self.users_fetch
            .record(&mut last_failure, result.as_ref().err().cloned());

        match result {
            Ok(rows) => {
                let users: Vec<UserRecord> = rows
                    .iter()
                    .skip(1)
                    .filter_map(|r| row::parse_user_row(r))
                    .collect();
                tracing::debug!(count = users.len(), "loaded users");

                let mut cache = self.cache.lock().await;
                cache.users.replace(users, Instant::now())
            }
            Err(e) => {
                tracing::warn!(range = %range, error = %e, "could not load users");
                Arc::new(Vec::new())
            }
        }
    }

    async fn fresh_users(&self) -> Option<Arc<Vec<UserRecord>>> {
        let cache = self.cache.lock().await;
        cache.users.fresh(Instant::now(), cache.ttl())
    }

    /// Record a principal in the users sheet unless already present.
    /// Returns true if a row was appended.
    pub async fn register_user(&self, principal: &Principal) -> SagraResult<bool> {
        let users = self.load_users().await;
        if users.iter().any(|u| u.email == principal.email) {
            tracing::debug!(email = %principal.email, "user already registered");
            return Ok(false);
        }

        let record = principal.to_user_record(Utc::now());
        self.source
            .append_rows(&self.layout.users_sheet, vec![row::user_to_row(&record)])
            .await?;

        self.invalidate(Some(CacheScope::Users)).await;
        tracing::info!(email = %principal.email, "user registered");
        Ok(true)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Skip the header, parse every row, keep events dated today or later.
fn parse_events(rows: &[Row], today: NaiveDate) -> Vec<EventRecord> {
    rows.iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, r)| match row::parse_event_row(r) {
            Ok(event) => Some(event),
            Err(rejection) => {
                tracing::debug!(row = index + 1, reason = ?rejection, "dropping malformed row");
                None
            }
        })
        .filter(|e| e.date >= today)
        .collect()
}
