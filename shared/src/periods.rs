//! CLOSED/OPEN segmentation of a reporting date range
//!
//! A requested range is reconstructed as alternating sub-periods: CLOSED
//! where a persisted closing snapshot covers the dates, OPEN where the
//! ledger is the only source. The output spans the range exactly, with no
//! gaps and no overlaps.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SegmentType;

/// A closed accounting period (inclusive dates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedPeriod {
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
}

/// Bounds of one report segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentBounds {
    pub segment_type: SegmentType,
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Index into the closed-period slice for CLOSED segments
    pub closed_index: Option<usize>,
}

/// Midnight UTC at the start of `date`
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight UTC after the end of `date`, the exclusive upper bound for an
/// end-of-day-inclusive range
pub fn day_end_exclusive(date: NaiveDate) -> DateTime<Utc> {
    match date.succ_opt() {
        Some(next) => day_start(next),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Split `[from, to]` against already-closed periods.
///
/// `closed` must be sorted by `period_from` and non-overlapping. Periods
/// outside the range are ignored; periods straddling a range edge are
/// clamped so that the returned segments concatenate to exactly `[from, to]`.
/// An inverted range yields no segments.
pub fn split_range(from: NaiveDate, to: NaiveDate, closed: &[ClosedPeriod]) -> Vec<SegmentBounds> {
    let mut segments = Vec::new();
    if from > to {
        return segments;
    }

    let mut cursor = from;
    for (index, period) in closed.iter().enumerate() {
        if period.period_to < cursor || period.period_from > to {
            continue;
        }

        let clamped_from = period.period_from.max(cursor);
        let clamped_to = period.period_to.min(to);

        if clamped_from > cursor {
            if let Some(gap_end) = clamped_from.pred_opt() {
                segments.push(SegmentBounds {
                    segment_type: SegmentType::Open,
                    from: cursor,
                    to: gap_end,
                    closed_index: None,
                });
            }
        }

        segments.push(SegmentBounds {
            segment_type: SegmentType::Closed,
            from: clamped_from,
            to: clamped_to,
            closed_index: Some(index),
        });

        cursor = match clamped_to.succ_opt() {
            Some(next) => next,
            None => return segments,
        };
        if cursor > to {
            return segments;
        }
    }

    segments.push(SegmentBounds {
        segment_type: SegmentType::Open,
        from: cursor,
        to,
        closed_index: None,
    });

    segments
}
