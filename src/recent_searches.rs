use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 5;

/// Outcome kept alongside a search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub did_rain: bool,
    pub temperature: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSearch {
    pub id: String,
    pub place: String,
    pub station_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub recorded_at: DateTime<Utc>,
    pub outcome: Option<SearchOutcome>,
}

/// Fields supplied by the caller; id and timestamp are assigned on record
#[derive(Debug, Clone)]
pub struct NewSearch {
    pub place: String,
    pub station_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub outcome: Option<SearchOutcome>,
}

/// Bounded, newest-first list of recent searches
///
/// Cloning the store clones the handle; all clones see the same list.
#[derive(Clone)]
pub struct RecentSearchStore {
    entries: Arc<RwLock<VecDeque<RecentSearch>>>,
    next_sequence: Arc<AtomicU64>,
    capacity: usize,
}

impl RecentSearchStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            next_sequence: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert at the front, replacing any entry for the same place, date and time
    pub async fn record(&self, search: NewSearch) -> RecentSearch {
        let recorded_at = Utc::now();
        // Millis alone collide within the same millisecond
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let entry = RecentSearch {
            id: format!("{}-{}", recorded_at.timestamp_millis(), sequence),
            place: search.place,
            station_id: search.station_id,
            date: search.date,
            time: search.time,
            recorded_at,
            outcome: search.outcome,
        };

        let mut entries = self.entries.write().await;
        entries.retain(|e| !(e.place == entry.place && e.date == entry.date && e.time == entry.time));
        entries.push_front(entry.clone());
        entries.truncate(self.capacity);

        debug!("Recorded search for {} ({} kept)", entry.place, entries.len());
        entry
    }

    pub async fn list(&self) -> Vec<RecentSearch> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for RecentSearchStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
