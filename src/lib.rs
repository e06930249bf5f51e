//! Engagement Dashboard - filterable charts over social-media engagement data
//!
//! Load a CSV of engagement events once, then recompute six chart
//! specifications every time the Platform / Content_Type / Action filters
//! change.
//!
//! # Panels
//!
//! | Panel | Chart |
//! |-------|-------|
//! | `time-series-chart` | Total engagement per date |
//! | `bar-chart` | Top 10 posts, colored by platform |
//! | `pie-chart` | Engagement share per platform |
//! | `histogram-chart` | Engagement counts in 20 bins |
//! | `violin-chart` | Engagement distribution per content type |
//! | `heatmap-chart` | Platform × content type sums |
//!
//! # Quick Start
//!
//! ```no_run
//! use engagement_dashboard::{recompute, Dataset, FilterSelection, RowPolicy};
//!
//! let dataset = Dataset::load("social_media_engagement.csv", RowPolicy::Abort).unwrap();
//!
//! let selection = FilterSelection::default().with_platforms(["Instagram"]);
//! let charts = recompute(&dataset, &selection).unwrap();
//! println!("{}", charts.pie.title);
//! ```

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod engine;
pub mod filter;
pub mod serve;

pub use chart::{ChartData, ChartKind, ChartSet, ChartSpec, PanelId, NO_DATA_TITLE};
pub use config::{Config, ConfigError};
pub use dashboard::{Dashboard, FilterChanged, PanelSlot, PanelUpdate};
pub use dataset::{Dataset, EngagementRecord, LoadError, RowPolicy, REQUIRED_COLUMNS};
pub use engine::{recompute, recompute_view, RecomputeError, HISTOGRAM_BINS, TOP_N};
pub use filter::{FilterOptions, FilterSelection, FilteredView};
pub use serve::{start_dashboard_server, ServeError, ServeOptions};
