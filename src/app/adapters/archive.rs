//! Supplemental record sources
//!
//! Some channels want rain totals the archive record itself does not carry.
//! A [`SupplementalSource`] looks them up so the worker can merge them into
//! the record before formatting. [`RainArchive`] keeps a rolling rain history
//! in memory and derives `hourRain`, `rain24` and `dayRain` from it.

use crate::app::models::{Record, UnitSystem};
use crate::app::services::units::{StandardUnits, UnitConverter, UnitGroup};
use crate::constants::{DAY_SECS, HOUR_SECS, RAIN_ARCHIVE_RETENTION_SECS};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Looks up extra observation values for a record
///
/// The returned record only needs to hold the supplemental values. The
/// worker fills them in where the original record has no value.
#[async_trait]
pub trait SupplementalSource: Send + Sync {
    async fn get_supplemental_fields(&self, record: &Record) -> Result<Record>;
}

#[derive(Debug, Clone, Copy)]
struct RainSample {
    date_time: i64,
    rain: f64,
    us_units: UnitSystem,
}

/// In-memory rain history
///
/// The producer calls [`observe`](RainArchive::observe) for every record it
/// generates. Samples older than a day are pruned as new ones arrive.
pub struct RainArchive {
    history: Mutex<VecDeque<RainSample>>,
    converter: Arc<dyn UnitConverter>,
}

impl RainArchive {
    pub fn new() -> Self {
        Self::with_converter(Arc::new(StandardUnits::new()))
    }

    pub fn with_converter(converter: Arc<dyn UnitConverter>) -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
            converter,
        }
    }

    /// Record the rain of an archive record
    ///
    /// Records without a numeric `rain` value are ignored.
    pub fn observe(&self, record: &Record) -> Result<()> {
        let Some(rain) = record.get_f64("rain") else {
            return Ok(());
        };

        let mut history = self.lock()?;
        history.push_back(RainSample {
            date_time: record.date_time,
            rain,
            us_units: record.us_units,
        });

        let newest = history.iter().map(|s| s.date_time).max().unwrap_or(record.date_time);
        let cutoff = newest.saturating_sub(RAIN_ARCHIVE_RETENTION_SECS);
        history.retain(|s| s.date_time > cutoff);
        Ok(())
    }

    /// Number of samples currently retained
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<RainSample>>> {
        self.history
            .lock()
            .map_err(|_| Error::augmentation("Rain history lock poisoned"))
    }

    /// Total rain in `(start, end]`, expressed in `system`
    fn rain_between(
        &self,
        samples: &VecDeque<RainSample>,
        start: i64,
        end: i64,
        system: UnitSystem,
    ) -> Result<Option<f64>> {
        let target = UnitGroup::Rain.unit_in(system);
        let mut total = None;
        for sample in samples.iter().filter(|s| s.date_time > start && s.date_time <= end) {
            let from = UnitGroup::Rain.unit_in(sample.us_units);
            let rain = self.converter.convert(sample.rain, from, target)?;
            *total.get_or_insert(0.0) += rain;
        }
        Ok(total)
    }
}

impl Default for RainArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SupplementalSource for RainArchive {
    async fn get_supplemental_fields(&self, record: &Record) -> Result<Record> {
        let now = record.date_time;
        let system = record.us_units;
        let day_start = now.saturating_sub(now.rem_euclid(DAY_SECS));

        let history = self.lock()?;
        let mut supplement = Record::new(now, system);
        let windows = [
            ("hourRain", now.saturating_sub(HOUR_SECS)),
            ("rain24", now.saturating_sub(RAIN_ARCHIVE_RETENTION_SECS)),
            ("dayRain", day_start),
        ];
        for (name, start) in windows {
            if let Some(total) = self.rain_between(&history, start, now, system)? {
                supplement.insert(name, total);
            }
        }

        debug!(
            "Rain supplement for {}: {} values from {} samples",
            now,
            supplement.values.len(),
            history.len()
        );
        Ok(supplement)
    }
}
