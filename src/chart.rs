//! Renderer-agnostic chart specifications
//!
//! A [`ChartSpec`] says what to draw (kind, title, labels, data series) and
//! nothing about how. The viewer page turns these into plotly traces.

use chrono::NaiveDate;
use serde::Serialize;

/// Title carried by every chart when the filtered view is empty
pub const NO_DATA_TITLE: &str = "No Data Available";

/// The six fixed output slots of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PanelId {
    #[serde(rename = "time-series-chart")]
    TimeSeries,
    #[serde(rename = "bar-chart")]
    Bar,
    #[serde(rename = "pie-chart")]
    Pie,
    #[serde(rename = "histogram-chart")]
    Histogram,
    #[serde(rename = "violin-chart")]
    Violin,
    #[serde(rename = "heatmap-chart")]
    Heatmap,
}

impl PanelId {
    /// Panels in display order
    pub const ALL: [PanelId; 6] = [
        PanelId::TimeSeries,
        PanelId::Bar,
        PanelId::Pie,
        PanelId::Histogram,
        PanelId::Violin,
        PanelId::Heatmap,
    ];

    /// Stable element id used by the viewer
    pub fn as_str(self) -> &'static str {
        match self {
            PanelId::TimeSeries => "time-series-chart",
            PanelId::Bar => "bar-chart",
            PanelId::Pie => "pie-chart",
            PanelId::Histogram => "histogram-chart",
            PanelId::Violin => "violin-chart",
            PanelId::Heatmap => "heatmap-chart",
        }
    }

    /// Chart kind rendered in this panel
    pub fn kind(self) -> ChartKind {
        match self {
            PanelId::TimeSeries => ChartKind::Line,
            PanelId::Bar => ChartKind::Bar,
            PanelId::Pie => ChartKind::Pie,
            PanelId::Histogram => ChartKind::Histogram,
            PanelId::Violin => ChartKind::Violin,
            PanelId::Heatmap => ChartKind::Heatmap,
        }
    }
}

impl std::fmt::Display for PanelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Histogram,
    Violin,
    Heatmap,
}

/// One chart, ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    /// `None` for placeholders
    pub data: Option<ChartData>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, data: ChartData) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: None,
            y_label: None,
            data: Some(data),
        }
    }

    /// Empty chart titled "No Data Available"
    pub fn placeholder(kind: ChartKind) -> Self {
        Self {
            kind,
            title: NO_DATA_TITLE.to_string(),
            x_label: None,
            y_label: None,
            data: None,
        }
    }

    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = Some(x.into());
        self.y_label = Some(y.into());
        self
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Data series for each chart kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartData {
    Line {
        points: Vec<TimePoint>,
    },
    Bar {
        bars: Vec<BarPoint>,
    },
    Pie {
        slices: Vec<Slice>,
    },
    Histogram {
        bins: Vec<HistogramBin>,
        color: String,
    },
    Violin {
        groups: Vec<ViolinGroup>,
        show_box: bool,
        show_points: bool,
    },
    Heatmap {
        x: Vec<String>,
        y: Vec<String>,
        /// `z[row][col]`, rows follow `y`, columns follow `x`
        z: Vec<Vec<u64>>,
        color_scale: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarPoint {
    pub post_id: String,
    pub value: u64,
    /// Color group (platform)
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: u64,
}

/// Half-open `[start, end)` bin; the last bin also includes `end`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolinGroup {
    pub label: String,
    pub values: Vec<u64>,
    pub summary: BoxSummary,
}

/// Five-number summary for the box overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// The six specs, one per panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub time_series: ChartSpec,
    pub bar: ChartSpec,
    pub pie: ChartSpec,
    pub histogram: ChartSpec,
    pub violin: ChartSpec,
    pub heatmap: ChartSpec,
}

impl ChartSet {
    /// Six "No Data Available" charts
    pub fn placeholders() -> Self {
        Self {
            time_series: ChartSpec::placeholder(ChartKind::Line),
            bar: ChartSpec::placeholder(ChartKind::Bar),
            pie: ChartSpec::placeholder(ChartKind::Pie),
            histogram: ChartSpec::placeholder(ChartKind::Histogram),
            violin: ChartSpec::placeholder(ChartKind::Violin),
            heatmap: ChartSpec::placeholder(ChartKind::Heatmap),
        }
    }

    pub fn get(&self, panel: PanelId) -> &ChartSpec {
        match panel {
            PanelId::TimeSeries => &self.time_series,
            PanelId::Bar => &self.bar,
            PanelId::Pie => &self.pie,
            PanelId::Histogram => &self.histogram,
            PanelId::Violin => &self.violin,
            PanelId::Heatmap => &self.heatmap,
        }
    }

    /// Specs paired with their panel, in display order
    pub fn panels(&self) -> [(PanelId, &ChartSpec); 6] {
        PanelId::ALL.map(|id| (id, self.get(id)))
    }
}
