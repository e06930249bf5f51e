//! Recompute engine
//!
//! `recompute(dataset, selection)` filters the dataset and derives the six
//! chart projections. Every projection is a pure function of the filtered
//! view; a failure in any of them fails the whole call.

use crate::chart::{
    BarPoint, BoxSummary, ChartData, ChartKind, ChartSet, ChartSpec, HistogramBin, PanelId, Slice,
    TimePoint, ViolinGroup,
};
use crate::dataset::{Dataset, EngagementRecord};
use crate::filter::{distinct, FilterSelection};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Rows shown in the top-posts bar chart
pub const TOP_N: usize = 10;
/// Equal-width bins in the engagement histogram
pub const HISTOGRAM_BINS: usize = 20;

const HISTOGRAM_COLOR: &str = "#003366";
const HEATMAP_COLOR_SCALE: &str = "Viridis";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecomputeError {
    #[error("{panel}: {reason}")]
    Aggregation { panel: PanelId, reason: String },
}

pub type Result<T> = std::result::Result<T, RecomputeError>;

/// Filter the dataset and build all six charts.
///
/// An empty filtered view is not an error: it yields six placeholder specs.
pub fn recompute(dataset: &Dataset, selection: &FilterSelection) -> Result<ChartSet> {
    let view = selection.filter(dataset);
    debug!(rows = view.len(), total = dataset.len(), "recompute");
    recompute_view(&view)
}

/// Build all six charts from an already filtered view
pub fn recompute_view(view: &[&EngagementRecord]) -> Result<ChartSet> {
    if view.is_empty() {
        return Ok(ChartSet::placeholders());
    }

    Ok(ChartSet {
        time_series: time_series_chart(view)?,
        bar: top_posts_chart(view),
        pie: platform_pie_chart(view)?,
        histogram: histogram_chart(view),
        violin: violin_chart(view),
        heatmap: heatmap_chart(view)?,
    })
}

fn overflow(panel: PanelId) -> RecomputeError {
    RecomputeError::Aggregation {
        panel,
        reason: "engagement sum overflows u64".to_string(),
    }
}

fn add(acc: &mut u64, value: u64, panel: PanelId) -> Result<()> {
    *acc = acc.checked_add(value).ok_or_else(|| overflow(panel))?;
    Ok(())
}

/// Sum of engagement per date, ascending
pub fn daily_totals(view: &[&EngagementRecord]) -> Result<Vec<TimePoint>> {
    let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for r in view {
        add(by_date.entry(r.date).or_default(), r.engagement_count, PanelId::TimeSeries)?;
    }
    Ok(by_date
        .into_iter()
        .map(|(date, value)| TimePoint { date, value })
        .collect())
}

/// The `n` largest rows by engagement; equal counts keep their original order
pub fn top_posts<'a>(view: &[&'a EngagementRecord], n: usize) -> Vec<&'a EngagementRecord> {
    let mut sorted = view.to_vec();
    // sort_by is stable
    sorted.sort_by(|a, b| b.engagement_count.cmp(&a.engagement_count));
    sorted.truncate(n);
    sorted
}

/// Sum of engagement per platform, first-seen order
pub fn platform_totals(view: &[&EngagementRecord]) -> Result<Vec<Slice>> {
    let labels = distinct(view.iter().map(|r| r.platform.as_str()));
    let mut sums: HashMap<&str, u64> = HashMap::new();
    for r in view {
        add(sums.entry(r.platform.as_str()).or_default(), r.engagement_count, PanelId::Pie)?;
    }
    Ok(labels
        .into_iter()
        .map(|label| {
            let value = sums.get(label.as_str()).copied().unwrap_or_default();
            Slice { label, value }
        })
        .collect())
}

/// Bucket counts into `bins` equal-width bins over the observed range.
///
/// The last bin is closed on the right so the maximum is counted. When every
/// value is equal the bins are one unit wide and all rows land in the first.
pub fn histogram(values: &[u64], bins: usize) -> Vec<HistogramBin> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    // Integer bin index so values on a left edge land in that bin
    let span = max - min;
    let index = |v: u64| -> usize {
        if span == 0 {
            0
        } else {
            ((v - min) as u128 * bins as u128 / span as u128) as usize
        }
    };
    let edge = |i: usize| -> f64 {
        if span == 0 {
            min as f64 + i as f64
        } else {
            min as f64 + (i as u128 * span as u128) as f64 / bins as f64
        }
    };

    let mut counts = vec![0usize; bins];
    for &v in values {
        counts[index(v).min(bins - 1)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: edge(i),
            end: edge(i + 1),
            count,
        })
        .collect()
}

/// Linear-interpolated quantile of sorted values
fn quantile(sorted: &[u64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0] as f64,
        len => {
            let pos = q * (len - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
        }
    }
}

pub fn box_summary(values: &[u64]) -> BoxSummary {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    BoxSummary {
        min: sorted.first().copied().unwrap_or_default() as f64,
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or_default() as f64,
    }
}

/// Full engagement distribution per content type, first-seen order
pub fn content_type_distributions(view: &[&EngagementRecord]) -> Vec<ViolinGroup> {
    let labels = distinct(view.iter().map(|r| r.content_type.as_str()));
    let mut values: HashMap<&str, Vec<u64>> = HashMap::new();
    for r in view {
        values
            .entry(r.content_type.as_str())
            .or_default()
            .push(r.engagement_count);
    }
    labels
        .into_iter()
        .map(|label| {
            let values = values.remove(label.as_str()).unwrap_or_default();
            let summary = box_summary(&values);
            ViolinGroup {
                label,
                values,
                summary,
            }
        })
        .collect()
}

/// Platform × content type engagement sums
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossTab {
    /// Columns, first-seen order
    pub platforms: Vec<String>,
    /// Rows, first-seen order
    pub content_types: Vec<String>,
    /// `sums[row][col]`
    pub sums: Vec<Vec<u64>>,
}

pub fn cross_tab(view: &[&EngagementRecord]) -> Result<CrossTab> {
    let platforms = distinct(view.iter().map(|r| r.platform.as_str()));
    let content_types = distinct(view.iter().map(|r| r.content_type.as_str()));

    let col: HashMap<&str, usize> = platforms
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();
    let row: HashMap<&str, usize> = content_types
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut z = vec![vec![0u64; platforms.len()]; content_types.len()];
    for r in view {
        let y = row[r.content_type.as_str()];
        let x = col[r.platform.as_str()];
        add(&mut z[y][x], r.engagement_count, PanelId::Heatmap)?;
    }

    Ok(CrossTab {
        platforms,
        content_types,
        sums: z,
    })
}

fn time_series_chart(view: &[&EngagementRecord]) -> Result<ChartSpec> {
    let points = daily_totals(view)?;
    Ok(ChartSpec::new(
        ChartKind::Line,
        "Engagement Trend Over Time",
        ChartData::Line { points },
    )
    .with_labels("Date", "Engagements"))
}

fn top_posts_chart(view: &[&EngagementRecord]) -> ChartSpec {
    let bars = top_posts(view, TOP_N)
        .into_iter()
        .map(|r| BarPoint {
            post_id: r.post_id.clone(),
            value: r.engagement_count,
            group: r.platform.clone(),
        })
        .collect();
    ChartSpec::new(
        ChartKind::Bar,
        "Top 10 Posts by Engagement",
        ChartData::Bar { bars },
    )
    .with_labels("Post ID", "Engagements")
}

fn platform_pie_chart(view: &[&EngagementRecord]) -> Result<ChartSpec> {
    let slices = platform_totals(view)?;
    Ok(ChartSpec::new(
        ChartKind::Pie,
        "Engagement Distribution by Platform",
        ChartData::Pie { slices },
    ))
}

fn histogram_chart(view: &[&EngagementRecord]) -> ChartSpec {
    let values: Vec<u64> = view.iter().map(|r| r.engagement_count).collect();
    ChartSpec::new(
        ChartKind::Histogram,
        "Distribution of Engagement Counts",
        ChartData::Histogram {
            bins: histogram(&values, HISTOGRAM_BINS),
            color: HISTOGRAM_COLOR.to_string(),
        },
    )
    .with_labels("Engagements", "Count")
}

fn violin_chart(view: &[&EngagementRecord]) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Violin,
        "Distribution of Engagement Counts by Content Type",
        ChartData::Violin {
            groups: content_type_distributions(view),
            show_box: true,
            show_points: true,
        },
    )
    .with_labels("Content_Type", "Engagement_Count")
}

fn heatmap_chart(view: &[&EngagementRecord]) -> Result<ChartSpec> {
    let tab = cross_tab(view)?;
    Ok(ChartSpec::new(
        ChartKind::Heatmap,
        "Engagement Heatmap by Platform and Content Type",
        ChartData::Heatmap {
            x: tab.platforms,
            y: tab.content_types,
            z: tab.sums,
            color_scale: HEATMAP_COLOR_SCALE.to_string(),
        },
    )
    .with_labels("Platform", "Content_Type"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::NO_DATA_TITLE;
    use proptest::prelude::*;

    fn record(
        date: (i32, u32, u32),
        platform: &str,
        content: &str,
        post: &str,
        count: u64,
    ) -> EngagementRecord {
        EngagementRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            platform: platform.to_string(),
            content_type: content.to_string(),
            action: "like".to_string(),
            post_id: post.to_string(),
            engagement_count: count,
        }
    }

    fn two_rows() -> Dataset {
        Dataset::from_records(vec![
            EngagementRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                platform: "FB".to_string(),
                content_type: "video".to_string(),
                action: "like".to_string(),
                post_id: "p1".to_string(),
                engagement_count: 10,
            },
            EngagementRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                platform: "IG".to_string(),
                content_type: "image".to_string(),
                action: "share".to_string(),
                post_id: "p2".to_string(),
                engagement_count: 5,
            },
        ])
    }

    fn slices(set: &ChartSet) -> Vec<(String, u64)> {
        match &set.pie.data {
            Some(ChartData::Pie { slices }) => {
                slices.iter().map(|s| (s.label.clone(), s.value)).collect()
            }
            other => panic!("expected pie data, got {other:?}"),
        }
    }

    fn bar_ids(set: &ChartSet) -> Vec<String> {
        match &set.bar.data {
            Some(ChartData::Bar { bars }) => bars.iter().map(|b| b.post_id.clone()).collect(),
            other => panic!("expected bar data, got {other:?}"),
        }
    }

    #[test]
    fn test_worked_example_unfiltered() {
        let set = recompute(&two_rows(), &FilterSelection::default()).unwrap();

        match &set.time_series.data {
            Some(ChartData::Line { points }) => {
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
                assert_eq!(points[0].value, 15);
            }
            other => panic!("expected line data, got {other:?}"),
        }
        assert_eq!(
            slices(&set),
            vec![("FB".to_string(), 10), ("IG".to_string(), 5)]
        );
        assert_eq!(bar_ids(&set), vec!["p1", "p2"]);
    }

    #[test]
    fn test_worked_example_filtered() {
        let sel = FilterSelection::default().with_platforms(["IG"]);
        let set = recompute(&two_rows(), &sel).unwrap();
        assert_eq!(slices(&set), vec![("IG".to_string(), 5)]);
        assert_eq!(bar_ids(&set), vec!["p2"]);
    }

    #[test]
    fn test_empty_view_gives_placeholders() {
        let sel = FilterSelection::default().with_platforms(["TikTok"]);
        let set = recompute(&two_rows(), &sel).unwrap();
        assert_eq!(set, ChartSet::placeholders());
        let panels = set.panels();
        assert_eq!(panels.len(), 6);
        for (_, spec) in panels {
            assert_eq!(spec.title, NO_DATA_TITLE);
            assert!(spec.data.is_none());
        }
    }

    #[test]
    fn test_empty_dataset_gives_placeholders() {
        let set = recompute(&Dataset::default(), &FilterSelection::default()).unwrap();
        assert_eq!(set, ChartSet::placeholders());
    }

    #[test]
    fn test_daily_totals_sorted_and_summed() {
        let rows = [
            record((2024, 1, 3), "FB", "video", "a", 4),
            record((2024, 1, 1), "FB", "video", "b", 1),
            record((2024, 1, 3), "IG", "image", "c", 6),
            record((2024, 1, 2), "IG", "image", "d", 2),
        ];
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        let points = daily_totals(&view).unwrap();

        let got: Vec<(u32, u64)> = points
            .iter()
            .map(|p| (chrono::Datelike::day(&p.date), p.value))
            .collect();
        assert_eq!(got, vec![(1, 1), (2, 2), (3, 10)]);

        let total: u64 = points.iter().map(|p| p.value).sum();
        assert_eq!(total, rows.iter().map(|r| r.engagement_count).sum::<u64>());
    }

    #[test]
    fn test_top_posts_limit_and_order() {
        let rows: Vec<EngagementRecord> = (0..15)
            .map(|i| record((2024, 1, 1), "FB", "video", &format!("p{i}"), i))
            .collect();
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        let top = top_posts(&view, TOP_N);

        assert_eq!(top.len(), 10);
        let min_selected = top.iter().map(|r| r.engagement_count).min().unwrap();
        for r in &rows {
            if !top.iter().any(|t| std::ptr::eq(*t, r)) {
                assert!(r.engagement_count <= min_selected);
            }
        }
        assert_eq!(top[0].post_id, "p14");
    }

    #[test]
    fn test_top_posts_ties_keep_row_order() {
        let rows = [
            record((2024, 1, 1), "FB", "video", "first", 5),
            record((2024, 1, 1), "FB", "video", "big", 9),
            record((2024, 1, 1), "IG", "video", "second", 5),
            record((2024, 1, 1), "IG", "video", "third", 5),
        ];
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        let ids: Vec<&str> = top_posts(&view, 3).iter().map(|r| r.post_id.as_str()).collect();
        assert_eq!(ids, vec!["big", "first", "second"]);
    }

    #[test]
    fn test_top_posts_fewer_rows_than_n() {
        let rows = [record((2024, 1, 1), "FB", "video", "only", 1)];
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        assert_eq!(top_posts(&view, TOP_N).len(), 1);
    }

    #[test]
    fn test_histogram_spans_min_max() {
        let values: Vec<u64> = (0..=100).collect();
        let bins = histogram(&values, HISTOGRAM_BINS);

        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[19].end, 100.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        // 0..=4 in the first bin, 95..=100 in the last (max included)
        assert_eq!(bins[0].count, 5);
        assert_eq!(bins[19].count, 6);
    }

    #[test]
    fn test_histogram_value_on_inexact_left_edge() {
        // Width 2.2 is not exact in binary; 33 sits on the left edge of bin 15
        let bins = histogram(&[0, 33, 44], HISTOGRAM_BINS);

        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[14].count, 0);
        assert_eq!(bins[15].count, 1);
        assert!(bins[15].start <= 33.0 && 33.0 < bins[15].end);
        assert_eq!(bins[19].count, 1);
        assert_eq!(bins[19].end, 44.0);
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[7, 7, 7], HISTOGRAM_BINS);
        assert_eq!(bins.len(), 20);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[0].start, 7.0);
        assert_eq!(bins[0].end, 8.0);
        assert!(bins[1..].iter().all(|b| b.count == 0));
    }

    #[test]
    fn test_histogram_empty() {
        assert!(histogram(&[], HISTOGRAM_BINS).is_empty());
    }

    #[test]
    fn test_box_summary() {
        let s = box_summary(&[4, 1, 3, 2, 5]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q1, 2.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q3, 4.0);
        assert_eq!(s.max, 5.0);

        let s = box_summary(&[1, 2, 3, 4]);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q1, 1.75);
    }

    #[test]
    fn test_violin_groups_keep_all_values() {
        let rows = [
            record((2024, 1, 1), "FB", "video", "a", 3),
            record((2024, 1, 1), "FB", "image", "b", 8),
            record((2024, 1, 1), "IG", "video", "c", 1),
        ];
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        let groups = content_type_distributions(&view);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "video");
        assert_eq!(groups[0].values, vec![3, 1]);
        assert_eq!(groups[1].label, "image");
        assert_eq!(groups[1].values, vec![8]);
    }

    #[test]
    fn test_cross_tab_sums_and_zero_fills() {
        let rows = [
            record((2024, 1, 1), "FB", "video", "a", 3),
            record((2024, 1, 2), "FB", "video", "b", 4),
            record((2024, 1, 1), "IG", "image", "c", 2),
        ];
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        let tab = cross_tab(&view).unwrap();

        assert_eq!(tab.platforms, vec!["FB", "IG"]);
        assert_eq!(tab.content_types, vec!["video", "image"]);
        assert_eq!(tab.sums, vec![vec![7, 0], vec![0, 2]]);
    }

    #[test]
    fn test_cross_tab_overflow_in_one_cell() {
        let rows = [
            record((2024, 1, 1), "FB", "video", "a", u64::MAX),
            record((2024, 1, 2), "IG", "video", "b", 1),
            record((2024, 1, 3), "FB", "video", "c", 1),
        ];
        let view: Vec<&EngagementRecord> = rows.iter().collect();
        let err = cross_tab(&view).unwrap_err();
        assert!(matches!(
            err,
            RecomputeError::Aggregation {
                panel: PanelId::Heatmap,
                ..
            }
        ));
    }

    #[test]
    fn test_recompute_view_matches_recompute() {
        let ds = two_rows();
        let sel = FilterSelection::default();
        let view = sel.filter(&ds);
        assert_eq!(recompute_view(&view).unwrap(), recompute(&ds, &sel).unwrap());
        assert_eq!(recompute_view(&[]).unwrap(), ChartSet::placeholders());
    }

    #[test]
    fn test_overflow_aborts_recompute() {
        let ds = Dataset::from_records(vec![
            record((2024, 1, 1), "FB", "video", "a", u64::MAX),
            record((2024, 1, 1), "FB", "video", "b", 1),
        ]);
        let err = recompute(&ds, &FilterSelection::default()).unwrap_err();
        assert!(matches!(
            err,
            RecomputeError::Aggregation {
                panel: PanelId::TimeSeries,
                ..
            }
        ));
        assert!(err.to_string().starts_with("time-series-chart"));
    }

    #[test]
    fn test_chart_titles() {
        let set = recompute(&two_rows(), &FilterSelection::default()).unwrap();
        assert_eq!(set.time_series.title, "Engagement Trend Over Time");
        assert_eq!(set.bar.title, "Top 10 Posts by Engagement");
        assert_eq!(set.pie.title, "Engagement Distribution by Platform");
        assert_eq!(set.histogram.title, "Distribution of Engagement Counts");
        assert_eq!(
            set.violin.title,
            "Distribution of Engagement Counts by Content Type"
        );
        assert_eq!(
            set.heatmap.title,
            "Engagement Heatmap by Platform and Content Type"
        );
        for (id, spec) in set.panels() {
            assert_eq!(spec.kind, id.kind());
            assert!(spec.has_data());
        }
    }

    proptest! {
        #[test]
        fn prop_histogram_bins_contain_values(
            values in prop::collection::vec(0u64..5000, 1..60),
        ) {
            let bins = histogram(&values, HISTOGRAM_BINS);
            prop_assert_eq!(bins.len(), HISTOGRAM_BINS);
            prop_assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());

            // Every bin's count is exactly the values inside its stated bounds
            let last = bins.len() - 1;
            for (i, bin) in bins.iter().enumerate() {
                let inside = values
                    .iter()
                    .map(|&v| v as f64)
                    .filter(|&v| bin.start <= v && (v < bin.end || (i == last && v == bin.end)))
                    .count();
                prop_assert_eq!(inside, bin.count, "bin {} [{}, {})", i, bin.start, bin.end);
            }
        }
    }
}
