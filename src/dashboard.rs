//! Dashboard session: the filter-changed callback contract
//!
//! On every `FilterChanged` event the dashboard recomputes synchronously and
//! publishes either six charts in their fixed slots or an error indicator.
//! Stale charts are never republished after a failure.

use crate::chart::{ChartSet, ChartSpec, PanelId};
use crate::dataset::Dataset;
use crate::engine::recompute_view;
use crate::filter::{FilterOptions, FilterSelection};
use serde::Serialize;
use tracing::{debug, error};

/// A filter widget changed; carries the full current selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChanged {
    pub selection: FilterSelection,
}

impl From<FilterSelection> for FilterChanged {
    fn from(selection: FilterSelection) -> Self {
        Self { selection }
    }
}

/// One output slot and the chart it displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSlot {
    pub id: PanelId,
    pub spec: ChartSpec,
}

/// What the viewer should display after an event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelUpdate {
    /// Six slots, in display order
    Charts {
        rows: usize,
        panels: Vec<PanelSlot>,
    },
    /// Recompute failed; show an error indicator in place of the charts
    Error { message: String },
}

impl PanelUpdate {
    fn from_chart_set(rows: usize, set: ChartSet) -> Self {
        let ChartSet {
            time_series,
            bar,
            pie,
            histogram,
            violin,
            heatmap,
        } = set;
        let specs = [time_series, bar, pie, histogram, violin, heatmap];
        let panels = PanelId::ALL
            .into_iter()
            .zip(specs)
            .map(|(id, spec)| PanelSlot { id, spec })
            .collect();
        PanelUpdate::Charts { rows, panels }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PanelUpdate::Error { .. })
    }

    /// Chart published in a given slot, if this is a chart update
    pub fn panel(&self, id: PanelId) -> Option<&ChartSpec> {
        match self {
            PanelUpdate::Charts { panels, .. } => {
                panels.iter().find(|p| p.id == id).map(|p| &p.spec)
            }
            PanelUpdate::Error { .. } => None,
        }
    }
}

/// Owns the loaded dataset and its filter options for the process lifetime
#[derive(Debug)]
pub struct Dashboard {
    dataset: Dataset,
    options: FilterOptions,
}

impl Dashboard {
    pub fn new(dataset: Dataset) -> Self {
        let options = FilterOptions::derive(&dataset);
        Self { dataset, options }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Handle a filter change: recompute and publish
    pub fn on_filter_changed(&self, event: FilterChanged) -> PanelUpdate {
        let selection = event.selection;
        let view = selection.filter(&self.dataset);
        let rows = view.len();
        match recompute_view(&view) {
            Ok(set) => {
                debug!(rows, "publishing charts");
                PanelUpdate::from_chart_set(rows, set)
            }
            Err(e) => {
                error!(error = %e, ?selection, "recompute failed");
                PanelUpdate::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Charts for the unrestricted selection, shown on first load
    pub fn initial(&self) -> PanelUpdate {
        self.on_filter_changed(FilterChanged::default())
    }
}
