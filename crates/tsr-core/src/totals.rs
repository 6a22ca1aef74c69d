//! Daily work/break totals.

use serde::{Deserialize, Serialize};

use crate::segment::{Segment, SegmentKind};

/// Minutes of work and break in one reconstructed day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub work_minutes: i64,
    pub break_minutes: i64,
}

/// Sums segment minutes by kind.
///
/// Each segment contributes its already-floored minutes, so off-minute
/// segments can under-report against the summed seconds.
pub fn daily_total(segments: &[Segment]) -> DailyTotal {
    segments
        .iter()
        .fold(DailyTotal::default(), |mut total, segment| {
            match segment.kind {
                SegmentKind::Work => total.work_minutes += segment.duration_minutes,
                SegmentKind::Break => total.break_minutes += segment.duration_minutes,
            }
            total
        })
}
