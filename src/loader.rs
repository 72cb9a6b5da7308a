//! Cache-or-fetch loader for the three measurement collections
//!
//! [`MeasurementLoader::load_all`] serves today's snapshots when all three
//! exist, and otherwise walks the country list, fetching one series at a time,
//! before writing new snapshots. The published collections are swapped in as
//! a whole, so readers never observe a mix of two loads.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{CacheReadError, SnapshotStore};
use crate::data::{Category, CountryProvider, FetchError, Measurement, MeasurementSet, SeriesClient};
use crate::progress::{LoadEvent, Progress, ProgressSink};

/// Errors that abort a load
#[derive(Error)]
pub enum LoadError {
    /// Today's snapshots exist but at least one can't be used
    #[error("cached data could not be read: {0}")]
    Cache(#[from] CacheReadError),

    /// The list of countries to fetch is unavailable
    #[error("country list unavailable: {0}")]
    Countries(#[source] FetchError),

    /// Stopped on request before every country was fetched
    #[error("load cancelled after {countries_done} of {countries_total} countries")]
    Cancelled {
        countries_done: usize,
        countries_total: usize,
        /// What had been fetched so far; never persisted or published
        partial: Box<MeasurementSet>,
    },

    /// The background load task panicked or was aborted
    #[error("load task stopped unexpectedly: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// Partial sets can hold every measurement fetched so far; show only their size.
impl fmt::Debug for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache(e) => f.debug_tuple("Cache").field(e).finish(),
            Self::Countries(e) => f.debug_tuple("Countries").field(e).finish(),
            Self::Cancelled {
                countries_done,
                countries_total,
                partial,
            } => f
                .debug_struct("Cancelled")
                .field("countries_done", countries_done)
                .field("countries_total", countries_total)
                .field("partial_records", &partial.len())
                .finish(),
            Self::Task(e) => f.debug_tuple("Task").field(e).finish(),
        }
    }
}

/// Where a load got its data from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Network,
}

/// A country left out of a network load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCountry {
    pub slug: String,
    pub reason: String,
}

/// A category whose snapshot could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWriteFailure {
    pub category: Category,
    pub reason: String,
}

/// Outcome of a successful load
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Day the data belongs to
    pub date: NaiveDate,
    pub source: LoadSource,
    /// Countries requested; zero when served from cache
    pub countries_total: usize,
    pub skipped: Vec<SkippedCountry>,
    pub cache_write_failures: Vec<CacheWriteFailure>,
    /// Measurements per category
    pub records: usize,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn countries_loaded(&self) -> usize {
        self.countries_total - self.skipped.len()
    }

    /// True if the next load on the same day can be served from cache
    pub fn is_cached(&self) -> bool {
        self.cache_write_failures.is_empty()
    }
}

/// Shared flag asking a running load to stop between countries
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Loads and holds the confirmed, deaths and recovered collections
pub struct MeasurementLoader {
    countries: Arc<dyn CountryProvider>,
    series: SeriesClient,
    store: SnapshotStore,
    current: RwLock<Arc<MeasurementSet>>,
}

impl MeasurementLoader {
    /// Creates a loader with nothing published yet
    pub fn new(countries: Arc<dyn CountryProvider>, series: SeriesClient, store: SnapshotStore) -> Self {
        Self {
            countries,
            series,
            store,
            current: RwLock::new(Arc::new(MeasurementSet::new())),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Loads today's collections, from cache if possible
    pub async fn load_all(
        &self,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<LoadReport, LoadError> {
        self.load_all_on(Local::now().date_naive(), progress, cancel).await
    }

    /// Loads the collections for `today`
    ///
    /// # Behavior
    /// - If snapshots for all three categories exist for `today`, they are read
    ///   and any read failure is returned as [`LoadError::Cache`]; the network
    ///   is never used as a fallback
    /// - Otherwise every country is fetched in order, skipping those that fail,
    ///   and the result is written to the cache; write failures are logged and
    ///   reported but don't fail the load
    /// - On success the new collections replace the published ones
    pub async fn load_all_on(
        &self,
        today: NaiveDate,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<LoadReport, LoadError> {
        let started = Instant::now();

        let report = if self.store.has_fresh_snapshot(today) {
            progress.hide();
            info!(%today, "Loading cached measurements");
            let set = self.load_cached(today)?;
            let records = set.confirmed().len();
            self.publish(set);
            LoadReport {
                date: today,
                source: LoadSource::Cache,
                countries_total: 0,
                skipped: Vec::new(),
                cache_write_failures: Vec::new(),
                records,
                elapsed: started.elapsed(),
            }
        } else {
            info!(%today, "Downloading country measurements");
            let (set, countries_total, skipped) = self.fetch_all(progress, cancel).await?;
            let cache_write_failures = self.persist(today, &set);
            let records = set.confirmed().len();
            self.publish(set);
            LoadReport {
                date: today,
                source: LoadSource::Network,
                countries_total,
                skipped,
                cache_write_failures,
                records,
                elapsed: started.elapsed(),
            }
        };

        info!(
            source = ?report.source,
            records = report.records,
            skipped = report.skipped.len(),
            elapsed = ?report.elapsed,
            "Measurements loaded"
        );
        Ok(report)
    }

    fn load_cached(&self, today: NaiveDate) -> Result<MeasurementSet, CacheReadError> {
        let confirmed = self.store.load(Category::Confirmed, today)?;
        let deaths = self.store.load(Category::Deaths, today)?;
        let recovered = self.store.load(Category::Recovered, today)?;
        Ok(MeasurementSet::from_parts(confirmed, deaths, recovered))
    }

    async fn fetch_all(
        &self,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<(MeasurementSet, usize, Vec<SkippedCountry>), LoadError> {
        let countries = self
            .countries
            .countries()
            .await
            .map_err(LoadError::Countries)?;
        let total = countries.len();

        let mut set = MeasurementSet::new();
        let mut skipped = Vec::new();

        if total == 0 {
            progress.report(Progress::new(0, 0));
        }

        for (index, country) in countries.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(done = index, total, "Load cancelled");
                return Err(LoadError::Cancelled {
                    countries_done: index,
                    countries_total: total,
                    partial: Box::new(set.into_partial(index, total)),
                });
            }

            match self.series.fetch_series(&country.slug).await {
                Ok(series) => set.push_series(&country.slug, &series),
                Err(e) => {
                    warn!(country = %country.slug, error = %e, "Skipping country");
                    skipped.push(SkippedCountry {
                        slug: country.slug.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            let update = Progress::new(index + 1, total);
            progress.report(update);
            info!(
                country = %country.slug,
                done = update.done,
                total,
                percent = update.percent,
                "Country measurements processed"
            );
        }

        Ok((set, total, skipped))
    }

    fn persist(&self, today: NaiveDate, set: &MeasurementSet) -> Vec<CacheWriteFailure> {
        let mut failures = Vec::new();
        for category in Category::ALL {
            match self.store.save(category, today, set.get(category)) {
                Ok(path) => info!(path = %path.display(), "Snapshot saved"),
                Err(e) => {
                    warn!(%category, error = %e, "Snapshot not saved");
                    failures.push(CacheWriteFailure {
                        category,
                        reason: e.to_string(),
                    });
                }
            }
        }
        failures
    }

    fn publish(&self, set: MeasurementSet) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(set);
    }

    /// The most recently published collections
    pub fn current(&self) -> Arc<MeasurementSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Copy of one published collection
    pub fn get(&self, category: Category) -> Vec<Measurement> {
        self.current().get(category).to_vec()
    }

    pub fn confirmed(&self) -> Vec<Measurement> {
        self.get(Category::Confirmed)
    }

    pub fn deaths(&self) -> Vec<Measurement> {
        self.get(Category::Deaths)
    }

    pub fn recovered(&self) -> Vec<Measurement> {
        self.get(Category::Recovered)
    }
}

/// Handle to a load running on a background task
pub struct LoadHandle {
    /// Progress and completion events, in order
    pub events: mpsc::UnboundedReceiver<LoadEvent>,
    cancel: CancelFlag,
    task: JoinHandle<Result<LoadReport, LoadError>>,
}

impl LoadHandle {
    /// Starts `load_all` on a tokio task
    ///
    /// The last event sent is always [`LoadEvent::Finished`].
    pub fn spawn(loader: Arc<MeasurementLoader>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancelFlag::new();
        let task_cancel = cancel.clone();

        let task = tokio::spawn(async move {
            let result = loader.load_all(&tx, &task_cancel).await;
            let summary = match &result {
                Ok(report) => Ok(report.clone()),
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(LoadEvent::Finished(summary));
            result
        });

        Self {
            events,
            cancel,
            task,
        }
    }

    /// Asks the load to stop before the next country
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The flag behind [`LoadHandle::cancel`], for use while `events` is borrowed
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Waits for the load to finish
    pub async fn join(self) -> Result<LoadReport, LoadError> {
        self.task.await?
    }
}
