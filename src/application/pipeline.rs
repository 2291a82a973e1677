// Telemetry aggregation pipeline - the downsampling core behind every chart
//
// Stages run in a fixed order, each a pure function over the previous
// stage's output: normalize -> collapse to one-per-second -> insert gap
// breaks -> bucket adaptively -> aggregate -> forward-fill levels. The
// whole pipeline is synchronous, never panics on malformed input, and
// never mutates its input.
use crate::application::telemetry_repository::RawRecord;
use crate::domain::telemetry::{AggregatedSeries, OutputPoint, Sample, TimeWindow};
use crate::domain::vehicle::VehicleKind;
use std::collections::BTreeMap;

const SECOND_MS: i64 = 1_000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Consecutive retained seconds further apart than this get a break row
/// so the chart line does not interpolate across the outage.
const GAP_THRESHOLD_MS: i64 = 2_000;

/// Validate and coerce raw store records into `Sample`s, input order
/// preserved. Records with no vehicle id, an unparsable or negative
/// timestamp, or a missing/non-finite speed or emissions value are dropped
/// silently; a noisy feed is expected and must not interrupt charting.
pub fn normalize(records: &[RawRecord]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(records.len());
    for record in records {
        let Some(vehicle_id) = record.vehicle_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        let Some(timestamp_ms) = record.timestamp.as_deref().and_then(parse_timestamp_ms) else {
            continue;
        };
        if timestamp_ms < 0 {
            continue;
        }
        let Some(speed_kmh) = record.speed.filter(|v| v.is_finite()) else {
            continue;
        };
        let Some(emissions_g_per_km) = record.emissions.filter(|v| v.is_finite()) else {
            continue;
        };

        samples.push(Sample {
            vehicle_id: vehicle_id.to_string(),
            timestamp_ms,
            speed_kmh,
            emissions_g_per_km,
            fuel_level_pct: record.fuel_level.map(clamp_pct),
            battery_level_pct: record.battery_level.map(clamp_pct),
        });
    }
    samples
}

/// ISO-8601 string to epoch milliseconds; `None` on anything unparsable.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn clamp_pct(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Collapse to at most one sample per wall-clock second, latest wins.
/// Retained samples are snapped to the start of their second, which keeps
/// later bucket assignment stable and puts break rows (second + 1 ms)
/// strictly after the real point. Idempotent.
pub fn collapse_seconds(mut samples: Vec<Sample>) -> Vec<Sample> {
    samples.sort_by_key(|s| s.timestamp_ms);

    let mut collapsed: Vec<Sample> = Vec::with_capacity(samples.len());
    for mut sample in samples {
        let second_ms = (sample.timestamp_ms / SECOND_MS) * SECOND_MS;
        sample.timestamp_ms = second_ms;
        match collapsed.last_mut() {
            Some(last) if last.timestamp_ms == second_ms => *last = sample,
            _ => collapsed.push(sample),
        }
    }
    collapsed
}

/// One row of the pre-bucket stream: a real collapsed sample or an all-null
/// break marker. Break rows participate in bucketing like any other row, so
/// a bucket holding only breaks still shows up (as an all-null point).
#[derive(Debug, Clone, PartialEq)]
struct Row {
    ts_ms: i64,
    speed: Option<f64>,
    emissions: Option<f64>,
    fuel: Option<f64>,
    battery: Option<f64>,
}

impl Row {
    fn from_sample(sample: &Sample) -> Self {
        Self {
            ts_ms: sample.timestamp_ms,
            speed: Some(sample.speed_kmh),
            emissions: Some(sample.emissions_g_per_km),
            fuel: sample.fuel_level_pct,
            battery: sample.battery_level_pct,
        }
    }

    fn break_at(ts_ms: i64) -> Self {
        Self {
            ts_ms,
            speed: None,
            emissions: None,
            fuel: None,
            battery: None,
        }
    }
}

/// Walk collapsed samples in ascending order and insert a break row one
/// millisecond after any sample whose successor is more than
/// `GAP_THRESHOLD_MS` away.
fn segment_gaps(samples: &[Sample]) -> Vec<Row> {
    let mut rows = Vec::with_capacity(samples.len());
    for (i, sample) in samples.iter().enumerate() {
        rows.push(Row::from_sample(sample));
        if let Some(next) = samples.get(i + 1) {
            if next.timestamp_ms - sample.timestamp_ms > GAP_THRESHOLD_MS {
                rows.push(Row::break_at(sample.timestamp_ms + 1));
            }
        }
    }
    rows
}

/// Bucket width for a requested window span. Coarser buckets for longer
/// windows keep the rendered point count bounded at every zoom level.
/// This is the fine-grained table; see DESIGN.md for the policy choice.
pub fn bucket_width_ms(span_ms: i64) -> i64 {
    if span_ms <= 15 * MINUTE_MS {
        5 * SECOND_MS
    } else if span_ms <= HOUR_MS {
        30 * SECOND_MS
    } else if span_ms <= 24 * HOUR_MS {
        5 * MINUTE_MS
    } else if span_ms <= 7 * 24 * HOUR_MS {
        HOUR_MS
    } else {
        3 * HOUR_MS
    }
}

#[derive(Debug, Default)]
struct Bucket {
    speed_sum: f64,
    speed_count: u32,
    speed_min: Option<f64>,
    emissions_sum: f64,
    emissions_count: u32,
    // Last observed value in the bucket; in-bucket summarization policy
    // for level fields is last-wins, see DESIGN.md.
    last_fuel: Option<f64>,
    last_battery: Option<f64>,
}

impl Bucket {
    fn push(&mut self, row: &Row) {
        if let Some(speed) = row.speed {
            self.speed_sum += speed;
            self.speed_count += 1;
            self.speed_min = Some(match self.speed_min {
                Some(min) => min.min(speed),
                None => speed,
            });
        }
        if let Some(emissions) = row.emissions {
            self.emissions_sum += emissions;
            self.emissions_count += 1;
        }
        if row.fuel.is_some() {
            self.last_fuel = row.fuel;
        }
        if row.battery.is_some() {
            self.last_battery = row.battery;
        }
    }

    fn finish(&self, ts_ms: i64, kind: VehicleKind) -> OutputPoint {
        let mut point = OutputPoint::empty(ts_ms);
        point.speed_avg = (self.speed_count > 0)
            .then(|| round1(self.speed_sum / f64::from(self.speed_count)));
        point.speed_min = self.speed_min.map(round1);
        point.emissions_avg = (self.emissions_count > 0).then(|| match kind {
            // Electric vehicles emit nothing regardless of what the raw
            // feed claims; stale simulator values do show up.
            VehicleKind::Electric => 0.0,
            VehicleKind::Combustion => round1(self.emissions_sum / f64::from(self.emissions_count)),
        });
        point.fuel_pct = self.last_fuel;
        point.battery_pct = self.last_battery;
        point
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Assign every row to its bucket and reduce each bucket to one point,
/// ascending by bucket start.
fn aggregate_buckets(rows: &[Row], width_ms: i64, kind: VehicleKind) -> Vec<OutputPoint> {
    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    for row in rows {
        let key = (row.ts_ms / width_ms) * width_ms;
        buckets.entry(key).or_default().push(row);
    }
    buckets
        .iter()
        .map(|(key, bucket)| bucket.finish(*key, kind))
        .collect()
}

/// Carry the last known fuel/battery percentage forward into buckets that
/// lack a direct observation. Buckets before the first observation stay
/// `None`; inventing a historical level would be worse than showing a gap.
fn forward_fill_levels(points: &mut [OutputPoint]) {
    let mut last_fuel = None;
    let mut last_battery = None;
    for point in points.iter_mut() {
        match point.fuel_pct {
            Some(value) => last_fuel = Some(value),
            None => point.fuel_pct = last_fuel,
        }
        match point.battery_pct {
            Some(value) => last_battery = Some(value),
            None => point.battery_pct = last_battery,
        }
    }
}

/// Run the full pipeline: `(samples, window) -> chart-ready series`.
///
/// With `window` set, samples outside it are discarded and the window span
/// picks the bucket width; an inverted window (`from > to`) yields an empty
/// series rather than an error. With no window the retained data's own span
/// is used, and the resolved bounds reported back are the data bounds.
pub fn aggregate(
    samples: &[Sample],
    window: Option<TimeWindow>,
    kind: VehicleKind,
) -> AggregatedSeries {
    let retained: Vec<Sample> = match window {
        Some(w) if w.span_ms() < 0 => Vec::new(),
        Some(w) => samples
            .iter()
            .filter(|s| w.contains(s.timestamp_ms))
            .cloned()
            .collect(),
        None => samples.to_vec(),
    };
    let collapsed = collapse_seconds(retained);

    let (from_ms, to_ms) = match window {
        Some(w) => (w.from_ms, w.to_ms),
        None => match (collapsed.first(), collapsed.last()) {
            (Some(first), Some(last)) => (first.timestamp_ms, last.timestamp_ms),
            _ => (0, 0),
        },
    };
    let width_ms = bucket_width_ms((to_ms - from_ms).max(0));

    let rows = segment_gaps(&collapsed);
    let mut points = aggregate_buckets(&rows, width_ms, kind);
    forward_fill_levels(&mut points);

    AggregatedSeries {
        from_ms,
        to_ms,
        bucket_width_ms: width_ms,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts_ms: i64, speed: f64) -> Sample {
        Sample {
            vehicle_id: "v1".to_string(),
            timestamp_ms: ts_ms,
            speed_kmh: speed,
            emissions_g_per_km: 120.0,
            fuel_level_pct: None,
            battery_level_pct: None,
        }
    }

    fn raw(ts: &str, speed: f64) -> RawRecord {
        RawRecord {
            vehicle_id: Some("v1".to_string()),
            timestamp: Some(ts.to_string()),
            speed: Some(speed),
            emissions: Some(120.0),
            fuel_level: None,
            battery_level: None,
        }
    }

    #[test]
    fn test_normalize_drops_malformed_records() {
        let records = vec![
            raw("2026-08-25T10:00:00Z", 50.0),
            RawRecord {
                vehicle_id: None,
                ..raw("2026-08-25T10:00:01Z", 50.0)
            },
            RawRecord {
                timestamp: Some("not-a-timestamp".to_string()),
                ..raw("", 50.0)
            },
            RawRecord {
                speed: Some(f64::NAN),
                ..raw("2026-08-25T10:00:02Z", 0.0)
            },
            RawRecord {
                emissions: None,
                ..raw("2026-08-25T10:00:03Z", 50.0)
            },
        ];
        let samples = normalize(&records);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].speed_kmh, 50.0);
    }

    #[test]
    fn test_normalize_clamps_levels() {
        let records = vec![
            RawRecord {
                fuel_level: Some(130.0),
                ..raw("2026-08-25T10:00:00Z", 50.0)
            },
            RawRecord {
                battery_level: Some(-5.0),
                ..raw("2026-08-25T10:00:01Z", 50.0)
            },
        ];
        let samples = normalize(&records);
        assert_eq!(samples[0].fuel_level_pct, Some(100.0));
        assert_eq!(samples[0].battery_level_pct, None);
        assert_eq!(samples[1].battery_level_pct, Some(0.0));
    }

    #[test]
    fn test_collapse_latest_wins_within_second() {
        // Two samples 1 ms apart in the same second: the later one survives.
        let collapsed = collapse_seconds(vec![sample(10_000, 10.0), sample(10_001, 20.0)]);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].speed_kmh, 20.0);
        assert_eq!(collapsed[0].timestamp_ms, 10_000);
    }

    #[test]
    fn test_collapse_is_idempotent() {
        let input = vec![
            sample(10_500, 10.0),
            sample(10_900, 20.0),
            sample(12_000, 30.0),
            sample(11_000, 25.0),
        ];
        let once = collapse_seconds(input);
        let twice = collapse_seconds(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_collapse_empty_input() {
        assert!(collapse_seconds(Vec::new()).is_empty());
    }

    #[test]
    fn test_gap_inserts_break_row() {
        // 0s and 10s are more than 2000 ms apart.
        let rows = segment_gaps(&[sample(0, 30.0), sample(10_000, 30.0)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], Row::break_at(1));
        assert!(rows[1].speed.is_none());
        assert!(rows[1].emissions.is_none());
    }

    #[test]
    fn test_no_break_within_threshold() {
        let rows = segment_gaps(&[sample(0, 30.0), sample(2_000, 30.0)]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_bucket_width_table() {
        assert_eq!(bucket_width_ms(10 * MINUTE_MS), 5 * SECOND_MS);
        assert_eq!(bucket_width_ms(15 * MINUTE_MS), 5 * SECOND_MS);
        assert_eq!(bucket_width_ms(30 * MINUTE_MS), 30 * SECOND_MS);
        assert_eq!(bucket_width_ms(6 * HOUR_MS), 5 * MINUTE_MS);
        assert_eq!(bucket_width_ms(3 * 24 * HOUR_MS), HOUR_MS);
        assert_eq!(bucket_width_ms(30 * 24 * HOUR_MS), 3 * HOUR_MS);
    }

    #[test]
    fn test_gap_keeps_buckets_independent() {
        // With 5 s buckets, the 0 s and 10 s samples must not share a bucket
        // and the break row lands in the first bucket without poisoning it.
        let window = TimeWindow::new(0, 10 * MINUTE_MS);
        let series = aggregate(
            &[sample(0, 30.0), sample(10_000, 30.0)],
            Some(window),
            VehicleKind::Combustion,
        );
        assert_eq!(series.bucket_width_ms, 5 * SECOND_MS);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[0].ts_ms, 0);
        assert_eq!(series.points[0].speed_avg, Some(30.0));
        assert_eq!(series.points[1].ts_ms, 10_000);
        assert_eq!(series.points[1].speed_avg, Some(30.0));
    }

    #[test]
    fn test_break_only_bucket_is_all_null() {
        let rows = vec![
            Row::from_sample(&sample(0, 40.0)),
            Row::break_at(6_001),
            Row::from_sample(&sample(12_000, 40.0)),
        ];
        let points = aggregate_buckets(&rows, 5 * SECOND_MS, VehicleKind::Combustion);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], OutputPoint::empty(5_000));
    }

    #[test]
    fn test_speed_aggregates_rounded() {
        let window = TimeWindow::new(0, 10 * MINUTE_MS);
        let mut fast = sample(1_000, 20.0);
        fast.emissions_g_per_km = 100.0;
        let mut slow = sample(2_000, 25.0);
        slow.emissions_g_per_km = 101.0;
        let series = aggregate(&[fast, slow], Some(window), VehicleKind::Combustion);
        assert_eq!(series.points[0].speed_avg, Some(22.5));
        assert_eq!(series.points[0].speed_min, Some(20.0));
        assert_eq!(series.points[0].emissions_avg, Some(100.5));
    }

    #[test]
    fn test_forward_fill_fuel() {
        // One fuel observation at t=0, later buckets carry it forward.
        let window = TimeWindow::new(0, 10 * MINUTE_MS);
        let mut with_fuel = sample(0, 30.0);
        with_fuel.fuel_level_pct = Some(80.0);
        let series = aggregate(
            &[
                with_fuel,
                sample(6_000, 30.0),
                sample(12_000, 30.0),
                sample(18_000, 30.0),
            ],
            Some(window),
            VehicleKind::Combustion,
        );
        let fuel: Vec<Option<f64>> = series.points.iter().map(|p| p.fuel_pct).collect();
        assert!(fuel.iter().all(|f| *f == Some(80.0)));
    }

    #[test]
    fn test_no_fill_before_first_observation() {
        let window = TimeWindow::new(0, 10 * MINUTE_MS);
        let mut with_battery = sample(12_000, 30.0);
        with_battery.battery_level_pct = Some(55.0);
        let series = aggregate(
            &[sample(0, 30.0), sample(6_000, 30.0), with_battery],
            Some(window),
            VehicleKind::Electric,
        );
        assert_eq!(series.points[0].battery_pct, None);
        assert_eq!(series.points[1].battery_pct, None);
        assert_eq!(series.points[2].battery_pct, Some(55.0));
    }

    #[test]
    fn test_level_last_wins_within_bucket() {
        let window = TimeWindow::new(0, 10 * MINUTE_MS);
        let mut first = sample(0, 30.0);
        first.fuel_level_pct = Some(80.0);
        let mut second = sample(2_000, 30.0);
        second.fuel_level_pct = Some(78.0);
        let series = aggregate(&[first, second], Some(window), VehicleKind::Combustion);
        assert_eq!(series.points[0].fuel_pct, Some(78.0));
    }

    #[test]
    fn test_electric_emissions_forced_zero() {
        // Stale raw emissions value on an electric vehicle.
        let window = TimeWindow::new(0, 10 * MINUTE_MS);
        let mut stale = sample(1_000, 30.0);
        stale.emissions_g_per_km = 150.0;
        let series = aggregate(&[stale], Some(window), VehicleKind::Electric);
        assert_eq!(series.points[0].emissions_avg, Some(0.0));
    }

    #[test]
    fn test_empty_input_yields_empty_series() {
        let series = aggregate(
            &[],
            Some(TimeWindow::new(0, HOUR_MS)),
            VehicleKind::Combustion,
        );
        assert!(series.points.is_empty());
        assert_eq!(series.from_ms, 0);
        assert_eq!(series.to_ms, HOUR_MS);

        let series = aggregate(&[], None, VehicleKind::Combustion);
        assert!(series.points.is_empty());
    }

    #[test]
    fn test_inverted_window_yields_empty_series() {
        let series = aggregate(
            &[sample(5_000, 30.0)],
            Some(TimeWindow::new(HOUR_MS, 0)),
            VehicleKind::Combustion,
        );
        assert!(series.points.is_empty());
    }

    #[test]
    fn test_window_filters_samples() {
        let window = TimeWindow::new(10_000, 20_000);
        let series = aggregate(
            &[sample(5_000, 99.0), sample(15_000, 40.0), sample(25_000, 99.0)],
            Some(window),
            VehicleKind::Combustion,
        );
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].speed_avg, Some(40.0));
    }

    #[test]
    fn test_output_ordered_and_bounded() {
        // A day of sparse samples: points ascend and stay within the
        // ceil(span/width)+1 bound.
        let window = TimeWindow::new(0, 24 * HOUR_MS);
        let samples: Vec<Sample> = (0..200)
            .map(|i| sample(i * 7 * MINUTE_MS, 30.0 + i as f64))
            .collect();
        let series = aggregate(&samples, Some(window), VehicleKind::Combustion);

        let width = series.bucket_width_ms;
        assert_eq!(width, 5 * MINUTE_MS);
        let max_buckets = (window.span_ms() + width - 1) / width + 1;
        assert!(series.points.len() as i64 <= max_buckets);
        assert!(series.points.windows(2).all(|w| w[0].ts_ms < w[1].ts_ms));
    }

    #[test]
    fn test_no_window_uses_data_span() {
        let series = aggregate(
            &[sample(0, 10.0), sample(30 * MINUTE_MS, 20.0)],
            None,
            VehicleKind::Combustion,
        );
        assert_eq!(series.from_ms, 0);
        assert_eq!(series.to_ms, 30 * MINUTE_MS);
        assert_eq!(series.bucket_width_ms, 30 * SECOND_MS);
    }
}
