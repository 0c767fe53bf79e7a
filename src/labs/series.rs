use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DecisionError;
use crate::models::enums::{LabKind, Trend};
use crate::models::LabReading;

/// Number of most recent readings a trend is read over.
pub const DEFAULT_TREND_WINDOW: usize = 3;

/// Conditions found while ordering a series. Reported, never silently resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeriesNotice {
    /// Several readings share a draw time; later insertion is treated as newer.
    SimultaneousReadings {
        drawn_at: NaiveDateTime,
        reading_ids: Vec<Uuid>,
    },
    /// A reading of another kind was handed to this series and left out.
    ForeignReading { reading_id: Uuid, kind: LabKind },
}

/// Readings of one lab kind, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct LabSeries {
    kind: LabKind,
    readings: Vec<LabReading>,
    notices: Vec<SeriesNotice>,
}

impl LabSeries {
    /// Order `readings` newest first.
    ///
    /// Readings sharing a draw time keep their insertion order, the later
    /// insertion counting as the more recent one, and each such group is
    /// recorded as a [`SeriesNotice::SimultaneousReadings`].
    pub fn new(kind: LabKind, readings: &[LabReading]) -> Self {
        let mut notices = Vec::new();
        let mut indexed: Vec<(usize, &LabReading)> = Vec::with_capacity(readings.len());

        for (idx, reading) in readings.iter().enumerate() {
            if reading.kind() == kind {
                indexed.push((idx, reading));
            } else {
                notices.push(SeriesNotice::ForeignReading {
                    reading_id: reading.id(),
                    kind: reading.kind(),
                });
            }
        }

        indexed.sort_by(|(ia, a), (ib, b)| {
            b.drawn_at()
                .cmp(&a.drawn_at())
                .then_with(|| ib.cmp(ia))
        });

        let ordered: Vec<LabReading> = indexed.into_iter().map(|(_, r)| r.clone()).collect();
        notices.extend(simultaneous_groups(&ordered));

        for notice in &notices {
            tracing::debug!(kind = kind.as_str(), ?notice, "Lab series notice");
        }

        Self {
            kind,
            readings: ordered,
            notices,
        }
    }

    /// Accept readings the caller claims are already newest first.
    /// Out-of-order input is rejected rather than re-sorted.
    pub fn from_ordered(kind: LabKind, readings: Vec<LabReading>) -> Result<Self, DecisionError> {
        let field = kind.field_name();
        if let Some(foreign) = readings.iter().find(|r| r.kind() != kind) {
            return Err(DecisionError::structural(
                field,
                format!("Reading {} is a {} reading.", foreign.id(), foreign.kind()),
            ));
        }
        if readings
            .windows(2)
            .any(|pair| pair[0].drawn_at() < pair[1].drawn_at())
        {
            return Err(DecisionError::structural(
                field,
                format!("The {field} are not in chronological order, newest first."),
            ));
        }

        let notices = simultaneous_groups(&readings);
        Ok(Self {
            kind,
            readings,
            notices,
        })
    }

    pub fn kind(&self) -> LabKind {
        self.kind
    }

    /// Newest first.
    pub fn readings(&self) -> &[LabReading] {
        &self.readings
    }

    pub fn notices(&self) -> &[SeriesNotice] {
        &self.notices
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn latest(&self) -> Option<&LabReading> {
        self.readings.first()
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.latest().map(LabReading::value)
    }

    /// Trend over the `window` most recent readings.
    ///
    /// Falling values (non-increasing, at least one drop) are improving,
    /// rising values are worsening, anything else is stable.
    /// Fewer than two readings is unknown.
    pub fn trend(&self, window: usize) -> Trend {
        let window = window.max(2);
        if self.readings.len() < 2 {
            return Trend::Unknown;
        }

        // oldest -> newest
        let recent: Vec<f64> = self
            .readings
            .iter()
            .take(window)
            .rev()
            .map(LabReading::value)
            .collect();

        let deltas: Vec<f64> = recent.windows(2).map(|p| p[1] - p[0]).collect();
        let falling = deltas.iter().all(|d| *d <= 0.0) && deltas.iter().any(|d| *d < 0.0);
        let rising = deltas.iter().all(|d| *d >= 0.0) && deltas.iter().any(|d| *d > 0.0);

        if falling {
            Trend::Improving
        } else if rising {
            Trend::Worsening
        } else {
            Trend::Stable
        }
    }

    /// True when every consecutive pair was drawn more than a day apart.
    pub fn drawn_more_than_a_day_apart(&self) -> bool {
        self.readings
            .windows(2)
            .all(|p| p[0].drawn_at() - p[1].drawn_at() > Duration::days(1))
    }
}

fn simultaneous_groups(ordered: &[LabReading]) -> Vec<SeriesNotice> {
    let mut notices = Vec::new();
    let mut i = 0;
    while i < ordered.len() {
        let drawn_at = ordered[i].drawn_at();
        let mut j = i + 1;
        while j < ordered.len() && ordered[j].drawn_at() == drawn_at {
            j += 1;
        }
        if j - i > 1 {
            notices.push(SeriesNotice::SimultaneousReadings {
                drawn_at,
                reading_ids: ordered[i..j].iter().map(LabReading::id).collect(),
            });
        }
        i = j;
    }
    notices
}
