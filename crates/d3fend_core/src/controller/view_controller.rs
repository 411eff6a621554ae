//! View controller implementation.

use crate::export::csv::export_csv;
use crate::model::graph::{GraphEdge, GraphNode, NeighborhoodGraph, NodeHighlight};
use crate::model::taxonomy::{Technique, TechniqueId};
use crate::store::TaxonomyStore;
use crate::view::details::{build_details, node_details, DetailsView, NodeDetails, Placeholder};
use crate::view::filter::{apply_filter, CategoryFilter, TechniqueFilter};
use crate::view::grouping::{build_matrix, group_by_category, MatrixView};
use crate::view::neighborhood::{expand, expand_overview, OVERVIEW_SAMPLE_SIZE};
use log::{debug, info, warn};
use std::sync::Arc;

/// Handle returned by subscription methods.
pub type SubscriptionId = u64;

type Callback = Box<dyn FnMut(&ViewEvent) + Send>;

/// Per-view tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Mappings and techniques sampled into the startup overview graph.
    pub overview_sample_size: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            overview_sample_size: OVERVIEW_SAMPLE_SIZE,
        }
    }
}

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Filter replaced; `matrix` is the recomputed layout.
    FilterChanged {
        filter: TechniqueFilter,
        matrix: MatrixView,
    },
    /// A technique was selected and its neighborhood expanded.
    SelectionChanged {
        technique: Technique,
        neighborhood: NeighborhoodGraph,
    },
    /// The selection was dropped; the graph reverted to the overview.
    SelectionCleared {
        technique_id: TechniqueId,
        reason: Placeholder,
    },
    /// Details payload of the current selection changed.
    DetailsRefreshed(DetailsView),
    /// A bridge-graph node was clicked.
    NodeFocused(NodeHighlight),
}

/// External force-layout renderer.
///
/// The controller never depends on the renderer's tick/physics loop; it only
/// hands over complete graphs and focus changes. Node clicks flow back
/// through [`ViewController::node_clicked`].
pub trait GraphRenderer {
    fn render(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]);
    fn highlight(&mut self, focus: &NodeHighlight);
}

/// Explicit, per-view state object over an injected taxonomy store.
pub struct ViewController {
    store: Arc<TaxonomyStore>,
    filter: TechniqueFilter,
    selection: Option<TechniqueId>,
    show_cross_mappings: bool,
    visible: Vec<Technique>,
    matrix: MatrixView,
    overview: NeighborhoodGraph,
    neighborhood: NeighborhoodGraph,
    last_cleared: Option<Placeholder>,
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_subscription_id: SubscriptionId,
    renderer: Option<Box<dyn GraphRenderer + Send>>,
}

impl ViewController {
    /// Creates a controller with default config, identity filter and the
    /// overview graph.
    pub fn new(store: Arc<TaxonomyStore>) -> Self {
        Self::with_config(store, ViewConfig::default())
    }

    pub fn with_config(store: Arc<TaxonomyStore>, config: ViewConfig) -> Self {
        let overview = expand_overview(&store, config.overview_sample_size);
        let mut controller = Self {
            store,
            filter: TechniqueFilter::default(),
            selection: None,
            show_cross_mappings: false,
            visible: Vec::new(),
            matrix: MatrixView::default(),
            neighborhood: overview.clone(),
            overview,
            last_cleared: None,
            subscribers: Vec::new(),
            next_subscription_id: 1,
            renderer: None,
        };
        controller.recompute_visible();
        controller
    }

    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    pub fn filter(&self) -> &TechniqueFilter {
        &self.filter
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn selected_technique(&self) -> Option<&Technique> {
        self.selection
            .as_deref()
            .and_then(|id| self.store.technique(id))
    }

    pub fn show_cross_mappings(&self) -> bool {
        self.show_cross_mappings
    }

    /// Techniques passing the current filter, in store order.
    pub fn visible_techniques(&self) -> &[Technique] {
        &self.visible
    }

    pub fn matrix(&self) -> &MatrixView {
        &self.matrix
    }

    /// Current bridge graph: the selection's neighborhood, or the overview.
    pub fn neighborhood(&self) -> &NeighborhoodGraph {
        &self.neighborhood
    }

    pub fn overview(&self) -> &NeighborhoodGraph {
        &self.overview
    }

    /// Details payload for the selection, if any.
    pub fn details(&self) -> Option<DetailsView> {
        self.selected_technique()
            .map(|technique| build_details(&self.store, technique, self.show_cross_mappings))
    }

    /// Details-panel placeholder when nothing is selected.
    pub fn placeholder(&self) -> Option<Placeholder> {
        if self.selection.is_some() {
            return None;
        }
        Some(self.last_cleared.unwrap_or(Placeholder::NothingSelected))
    }

    /// Matrix placeholder when the filter leaves no column.
    pub fn matrix_placeholder(&self) -> Option<Placeholder> {
        self.matrix.is_empty().then_some(Placeholder::EmptyMatrix)
    }

    /// Exports the currently visible techniques.
    pub fn export_csv(&self) -> String {
        export_csv(&self.store, &self.visible)
    }

    /// Replaces the filter and recomputes the matrix.
    ///
    /// A selection that no longer passes the filter is cleared and the graph
    /// reverts to the overview.
    pub fn set_filter(&mut self, filter: TechniqueFilter) {
        self.filter = filter;
        self.recompute_visible();
        info!(
            "event=filter_apply module=controller category={} search_len={} visible={}",
            self.filter.category.as_str(),
            self.filter.search_text.chars().count(),
            self.visible.len()
        );
        self.emit(ViewEvent::FilterChanged {
            filter: self.filter.clone(),
            matrix: self.matrix.clone(),
        });

        let Some(selected_id) = self.selection.clone() else {
            return;
        };
        if self.visible.iter().any(|technique| technique.id == selected_id) {
            self.emit_details();
        } else {
            self.clear_with(selected_id, Placeholder::SelectionFilteredOut);
        }
    }

    /// Changes only the category stage of the filter.
    pub fn set_category_filter(&mut self, category_id: &str) {
        let filter = TechniqueFilter {
            category: CategoryFilter::parse(category_id),
            search_text: self.filter.search_text.clone(),
        };
        self.set_filter(filter);
    }

    /// Changes only the search stage of the filter.
    pub fn set_search_text(&mut self, search_text: impl Into<String>) {
        let filter = TechniqueFilter {
            category: self.filter.category.clone(),
            search_text: search_text.into(),
        };
        self.set_filter(filter);
    }

    /// Selects a technique by id and expands its neighborhood.
    ///
    /// Only techniques currently visible in the matrix can be selected;
    /// unknown or filtered-out ids are ignored and return `false`.
    pub fn select(&mut self, technique_id: &str) -> bool {
        let technique_id = technique_id.trim();
        let Some(technique) = self.store.technique(technique_id).cloned() else {
            warn!(
                "event=selection_change module=controller status=ignored reason=unknown_technique"
            );
            return false;
        };
        if !self.visible.iter().any(|visible| visible.id == technique.id) {
            warn!(
                "event=selection_change module=controller status=ignored reason=filtered_out technique={}",
                technique.id
            );
            return false;
        }

        self.neighborhood = expand(&technique, &self.store);
        self.selection = Some(technique.id.clone());
        self.last_cleared = None;
        self.render_current();

        info!(
            "event=selection_change module=controller status=ok technique={} nodes={} edges={}",
            technique.id,
            self.neighborhood.node_count(),
            self.neighborhood.edge_count()
        );
        self.emit(ViewEvent::SelectionChanged {
            technique,
            neighborhood: self.neighborhood.clone(),
        });
        self.emit_details();
        true
    }

    /// Drops the current selection. Returns `false` when nothing was selected.
    pub fn clear_selection(&mut self) -> bool {
        match self.selection.clone() {
            Some(selected_id) => {
                self.clear_with(selected_id, Placeholder::NothingSelected);
                true
            }
            None => false,
        }
    }

    /// Shows or hides cross-mappings in the details payload.
    ///
    /// The graph is unchanged; only a details refresh is emitted, and only
    /// when a selection exists.
    pub fn toggle_cross_mappings(&mut self, show: bool) {
        self.show_cross_mappings = show;
        debug!(
            "event=cross_mapping_toggle module=controller show={} selected={}",
            show,
            self.selection.is_some()
        );
        if self.selection.is_some() {
            self.emit_details();
        }
    }

    /// Handles a click on a bridge-graph node.
    ///
    /// Highlights the node and its adjacent edges, then returns its details.
    /// Returns `None` for ids not in the current graph.
    pub fn node_clicked(&mut self, node_id: &str) -> Option<NodeDetails> {
        let kind = self.neighborhood.node(node_id)?.kind;
        let focus = self.neighborhood.incident(node_id)?;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.highlight(&focus);
        }
        self.emit(ViewEvent::NodeFocused(focus));
        node_details(&self.store, node_id, kind)
    }

    /// Attaches a renderer and immediately renders the current graph.
    pub fn attach_renderer(&mut self, renderer: Box<dyn GraphRenderer + Send>) {
        self.renderer = Some(renderer);
        self.render_current();
    }

    pub fn detach_renderer(&mut self) -> Option<Box<dyn GraphRenderer + Send>> {
        self.renderer.take()
    }

    /// Subscribes to every view event.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + Send + 'static,
    {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Subscribes to `SelectionChanged` and `SelectionCleared`.
    pub fn on_selection_changed<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + Send + 'static,
    {
        self.subscribe(move |event| {
            if matches!(
                event,
                ViewEvent::SelectionChanged { .. } | ViewEvent::SelectionCleared { .. }
            ) {
                callback(event);
            }
        })
    }

    /// Subscribes to `FilterChanged`.
    pub fn on_filter_changed<F>(&mut self, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&ViewEvent) + Send + 'static,
    {
        self.subscribe(move |event| {
            if matches!(event, ViewEvent::FilterChanged { .. }) {
                callback(event);
            }
        })
    }

    /// Removes a subscription. Returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    fn recompute_visible(&mut self) {
        self.visible = apply_filter(self.store.techniques(), &self.filter);
        self.matrix = build_matrix(&self.store, &group_by_category(&self.visible));
    }

    fn clear_with(&mut self, technique_id: TechniqueId, reason: Placeholder) {
        self.selection = None;
        self.last_cleared = Some(reason);
        self.neighborhood = self.overview.clone();
        self.render_current();
        info!(
            "event=selection_clear module=controller technique={} reason={:?}",
            technique_id, reason
        );
        self.emit(ViewEvent::SelectionCleared {
            technique_id,
            reason,
        });
    }

    fn emit_details(&mut self) {
        if let Some(details) = self.details() {
            self.emit(ViewEvent::DetailsRefreshed(details));
        }
    }

    fn render_current(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(self.neighborhood.nodes(), self.neighborhood.edges());
        }
    }

    fn emit(&mut self, event: ViewEvent) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }
}
