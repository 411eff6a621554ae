//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose per-view sessions over `ViewController` to Dart via FRB.
//! - Flatten core view models into plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Each session owns an independent controller; the dataset is shared.
//! - Every call runs to completion under the session lock.

use d3fend_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DetailsView, GraphEdge, GraphNode, MatrixView, NeighborhoodGraph, NodeDetails, NodeKind,
    TaxonomyStore, TechniqueFilter, ViewController, EXPORT_FILE_NAME,
};
use log::{info, warn};
use once_cell::sync::{Lazy, OnceCell};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

const DATASET_PATH_ENV: &str = "D3FEND_DATASET_PATH";

static STORE: OnceCell<Result<Arc<TaxonomyStore>, String>> = OnceCell::new();
static SESSIONS: Lazy<Mutex<BTreeMap<String, ViewController>>> =
    Lazy::new(|| Mutex::new(BTreeMap::new()));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Session creation envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOpenResponse {
    pub ok: bool,
    /// Opaque session id passed to every `view_*` call.
    pub session_id: Option<String>,
    pub message: String,
}

/// One matrix cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueItem {
    pub id: String,
    pub name: String,
}

/// One matrix column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixColumnItem {
    pub category_id: String,
    pub category_name: String,
    pub techniques: Vec<TechniqueItem>,
}

/// Matrix layout envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixResponse {
    pub ok: bool,
    pub columns: Vec<MatrixColumnItem>,
    /// Selection after the call.
    pub selected_technique_id: Option<String>,
    /// Whether this call dropped the previous selection.
    pub selection_cleared: bool,
    /// Placeholder text when empty, diagnostics on failure.
    pub message: String,
}

impl MatrixResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            columns: Vec::new(),
            selected_technique_id: None,
            selection_cleared: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNodeItem {
    pub id: String,
    pub display_name: String,
    /// `defensive|offensive|artifact`.
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdgeItem {
    pub source_id: String,
    pub target_id: String,
    /// `defensive_to_artifact|offensive_to_artifact`.
    pub kind: String,
}

/// Bridge-graph envelope for force-layout rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResponse {
    pub ok: bool,
    pub nodes: Vec<GraphNodeItem>,
    pub edges: Vec<GraphEdgeItem>,
    pub message: String,
}

impl GraphResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            nodes: Vec::new(),
            edges: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingItem {
    pub offensive_id: String,
    pub offensive_name: String,
}

/// Details-panel envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsResponse {
    pub ok: bool,
    /// `None` renders `message` as a placeholder.
    pub technique_id: Option<String>,
    pub title: String,
    pub category_name: String,
    pub description: String,
    pub artifact_names: Vec<String>,
    /// Artifacts the names resolve to, with `relation = "artifact"`.
    pub related_artifacts: Vec<RelatedItem>,
    /// `Some` only while cross-mappings are toggled on.
    pub cross_mappings: Option<Vec<MappingItem>>,
    pub message: String,
}

impl DetailsResponse {
    fn placeholder(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            technique_id: None,
            title: String::new(),
            category_name: String::new(),
            description: String::new(),
            artifact_names: Vec::new(),
            related_artifacts: Vec::new(),
            cross_mappings: None,
            message: message.into(),
        }
    }
}

/// Related entry listed under a clicked node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedItem {
    pub id: String,
    pub name: String,
    /// `artifact|countermeasure|addresses|offensive|defensive`.
    pub relation: String,
}

/// Node-click details envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDetailsResponse {
    pub ok: bool,
    pub node_id: String,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub related: Vec<RelatedItem>,
    pub message: String,
}

/// CSV export envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub content: String,
    pub message: String,
}

/// Opens an independent view session over the shared dataset.
///
/// # FFI contract
/// - Loads the dataset on first call (`D3FEND_DATASET_PATH` or built-in).
/// - Never panics; returns failure envelope when the dataset is invalid.
#[flutter_rust_bridge::frb(sync)]
pub fn view_open() -> ViewOpenResponse {
    let store = match shared_store() {
        Ok(store) => store,
        Err(message) => {
            return ViewOpenResponse {
                ok: false,
                session_id: None,
                message: format!("view_open failed: {message}"),
            };
        }
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    lock_sessions().insert(session_id.clone(), ViewController::new(store));
    info!("event=session_open module=ffi status=ok");
    ViewOpenResponse {
        ok: true,
        session_id: Some(session_id),
        message: "View opened.".to_string(),
    }
}

/// Closes a session. Returns `false` for unknown ids.
#[flutter_rust_bridge::frb(sync)]
pub fn view_close(session_id: String) -> bool {
    lock_sessions().remove(session_id.trim()).is_some()
}

/// Returns the current matrix layout.
#[flutter_rust_bridge::frb(sync)]
pub fn view_matrix(session_id: String) -> MatrixResponse {
    with_session(&session_id, |view| to_matrix_response(view, false))
        .unwrap_or_else(|err| MatrixResponse::failure(format!("view_matrix failed: {err}")))
}

/// Replaces the filter (`category_id` may be `all`) and returns the matrix.
#[flutter_rust_bridge::frb(sync)]
pub fn view_set_filter(
    session_id: String,
    category_id: String,
    search_text: String,
) -> MatrixResponse {
    with_session(&session_id, |view| {
        let had_selection = view.selection().is_some();
        view.set_filter(TechniqueFilter::new(category_id.as_str(), search_text));
        let cleared = had_selection && view.selection().is_none();
        to_matrix_response(view, cleared)
    })
    .unwrap_or_else(|err| MatrixResponse::failure(format!("view_set_filter failed: {err}")))
}

/// Selects a technique and returns its neighborhood graph.
///
/// Unknown or filtered-out technique ids keep the current graph and report
/// `ok = false`.
#[flutter_rust_bridge::frb(sync)]
pub fn view_select(session_id: String, technique_id: String) -> GraphResponse {
    with_session(&session_id, |view| {
        if view.select(technique_id.as_str()) {
            to_graph_response(view.neighborhood(), true, "Technique selected.")
        } else {
            to_graph_response(
                view.neighborhood(),
                false,
                format!("Technique is unknown or not visible: {}", technique_id.trim()),
            )
        }
    })
    .unwrap_or_else(|err| GraphResponse::failure(format!("view_select failed: {err}")))
}

/// Clears the selection and returns the placeholder details.
#[flutter_rust_bridge::frb(sync)]
pub fn view_clear_selection(session_id: String) -> DetailsResponse {
    with_session(&session_id, |view| {
        view.clear_selection();
        to_details_response(view)
    })
    .unwrap_or_else(|err| {
        DetailsResponse::placeholder(false, format!("view_clear_selection failed: {err}"))
    })
}

/// Toggles cross-mapping details and returns the refreshed details.
#[flutter_rust_bridge::frb(sync)]
pub fn view_toggle_cross_mappings(session_id: String, show: bool) -> DetailsResponse {
    with_session(&session_id, |view| {
        view.toggle_cross_mappings(show);
        to_details_response(view)
    })
    .unwrap_or_else(|err| {
        DetailsResponse::placeholder(false, format!("view_toggle_cross_mappings failed: {err}"))
    })
}

/// Returns the details payload, or a placeholder when nothing is selected.
#[flutter_rust_bridge::frb(sync)]
pub fn view_details(session_id: String) -> DetailsResponse {
    with_session(&session_id, |view| to_details_response(view)).unwrap_or_else(|err| {
        DetailsResponse::placeholder(false, format!("view_details failed: {err}"))
    })
}

/// Returns the current bridge graph (overview before any selection).
#[flutter_rust_bridge::frb(sync)]
pub fn view_graph(session_id: String) -> GraphResponse {
    with_session(&session_id, |view| {
        to_graph_response(view.neighborhood(), true, String::new())
    })
    .unwrap_or_else(|err| GraphResponse::failure(format!("view_graph failed: {err}")))
}

/// Handles a bridge-graph node click and returns that node's details.
#[flutter_rust_bridge::frb(sync)]
pub fn view_node_details(session_id: String, node_id: String) -> NodeDetailsResponse {
    let node_id = node_id.trim().to_string();
    let outcome = with_session(&session_id, |view| view.node_clicked(node_id.as_str()));
    match outcome {
        Ok(Some(details)) => to_node_details_response(node_id, details),
        Ok(None) => node_details_failure(node_id, "Node is not part of the current graph."),
        Err(err) => node_details_failure(node_id, format!("view_node_details failed: {err}")),
    }
}

/// Exports the visible techniques as CSV text.
#[flutter_rust_bridge::frb(sync)]
pub fn view_export_csv(session_id: String) -> ExportResponse {
    match with_session(&session_id, |view| {
        (view.export_csv(), view.visible_techniques().len())
    }) {
        Ok((content, rows)) => ExportResponse {
            ok: true,
            file_name: EXPORT_FILE_NAME.to_string(),
            content,
            message: format!("Exported {rows} technique(s)."),
        },
        Err(err) => ExportResponse {
            ok: false,
            file_name: EXPORT_FILE_NAME.to_string(),
            content: String::new(),
            message: format!("view_export_csv failed: {err}"),
        },
    }
}

fn shared_store() -> Result<Arc<TaxonomyStore>, String> {
    STORE
        .get_or_init(|| {
            let loaded = match std::env::var(DATASET_PATH_ENV) {
                Ok(raw) if !raw.trim().is_empty() => TaxonomyStore::from_json_file(raw.trim()),
                _ => TaxonomyStore::builtin(),
            };
            loaded.map(Arc::new).map_err(|err| {
                warn!("event=dataset_load module=ffi status=error");
                err.to_string()
            })
        })
        .clone()
}

fn lock_sessions() -> MutexGuard<'static, BTreeMap<String, ViewController>> {
    SESSIONS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_session<T>(
    session_id: &str,
    f: impl FnOnce(&mut ViewController) -> T,
) -> Result<T, String> {
    let mut sessions = lock_sessions();
    let view = sessions
        .get_mut(session_id.trim())
        .ok_or_else(|| format!("unknown session `{}`", session_id.trim()))?;
    Ok(f(view))
}

fn to_matrix_response(view: &ViewController, selection_cleared: bool) -> MatrixResponse {
    let message = match view.matrix_placeholder() {
        Some(placeholder) => placeholder.message().to_string(),
        None => format!("Showing {} technique(s).", view.matrix().technique_count()),
    };
    MatrixResponse {
        ok: true,
        columns: to_column_items(view.matrix()),
        selected_technique_id: view.selection().map(str::to_string),
        selection_cleared,
        message,
    }
}

fn to_column_items(matrix: &MatrixView) -> Vec<MatrixColumnItem> {
    matrix
        .columns
        .iter()
        .map(|column| MatrixColumnItem {
            category_id: column.category.id.clone(),
            category_name: column.category.name.clone(),
            techniques: column
                .techniques
                .iter()
                .map(|technique| TechniqueItem {
                    id: technique.id.clone(),
                    name: technique.name.clone(),
                })
                .collect(),
        })
        .collect()
}

fn to_graph_response(
    graph: &NeighborhoodGraph,
    ok: bool,
    message: impl Into<String>,
) -> GraphResponse {
    GraphResponse {
        ok,
        nodes: graph.nodes().iter().map(to_node_item).collect(),
        edges: graph.edges().iter().map(to_edge_item).collect(),
        message: message.into(),
    }
}

fn to_node_item(node: &GraphNode) -> GraphNodeItem {
    GraphNodeItem {
        id: node.id.clone(),
        display_name: node.display_name.clone(),
        kind: node.kind.as_str().to_string(),
        description: node.description.clone(),
    }
}

fn to_edge_item(edge: &GraphEdge) -> GraphEdgeItem {
    GraphEdgeItem {
        source_id: edge.source_id.clone(),
        target_id: edge.target_id.clone(),
        kind: edge.kind.as_str().to_string(),
    }
}

fn to_details_response(view: &ViewController) -> DetailsResponse {
    let Some(details) = view.details() else {
        let message = view
            .placeholder()
            .map(|placeholder| placeholder.message())
            .unwrap_or_default();
        return DetailsResponse::placeholder(true, message);
    };
    details_from_view(details)
}

fn details_from_view(details: DetailsView) -> DetailsResponse {
    let message = details
        .placeholders()
        .iter()
        .map(|placeholder| placeholder.message())
        .collect::<Vec<_>>()
        .join(" ");
    let related_artifacts = details
        .related_artifacts
        .into_iter()
        .map(|artifact| related_item(artifact.id, artifact.name, "artifact"))
        .collect();
    let cross_mappings = details.cross_mappings.map(|mappings| {
        mappings
            .into_iter()
            .map(|mapping| MappingItem {
                offensive_id: mapping.offensive_id,
                offensive_name: mapping.offensive_name,
            })
            .collect()
    });

    DetailsResponse {
        ok: true,
        technique_id: Some(details.technique.id.clone()),
        title: format!("{}: {}", details.technique.id, details.technique.name),
        category_name: details.category_name,
        description: details.technique.description,
        artifact_names: details.artifact_names,
        related_artifacts,
        cross_mappings,
        message,
    }
}

fn to_node_details_response(node_id: String, details: NodeDetails) -> NodeDetailsResponse {
    let (kind, title, description, related) = match details {
        NodeDetails::Offensive {
            mapping,
            countermeasures,
        } => (
            NodeKind::Offensive,
            mapping.offensive_name.clone(),
            format!("ATT&CK Technique: {}", mapping.offensive_name),
            countermeasures
                .into_iter()
                .map(|technique| related_item(technique.id, technique.name, "countermeasure"))
                .collect::<Vec<_>>(),
        ),
        NodeDetails::Defensive {
            technique,
            addressed,
        } => (
            NodeKind::Defensive,
            technique.name,
            technique.description,
            addressed
                .into_iter()
                .map(|mapping| {
                    related_item(mapping.offensive_id, mapping.offensive_name, "addresses")
                })
                .collect(),
        ),
        NodeDetails::Artifact {
            artifact,
            offensive,
            defensive,
        } => {
            let mut related = offensive
                .into_iter()
                .map(|mapping| related_item(mapping.offensive_id, mapping.offensive_name, "offensive"))
                .collect::<Vec<_>>();
            related.extend(
                defensive
                    .into_iter()
                    .map(|technique| related_item(technique.id, technique.name, "defensive")),
            );
            (NodeKind::Artifact, artifact.name, artifact.description, related)
        }
    };

    NodeDetailsResponse {
        ok: true,
        node_id,
        kind: kind.as_str().to_string(),
        title,
        description,
        related,
        message: String::new(),
    }
}

fn related_item(id: String, name: String, relation: &str) -> RelatedItem {
    RelatedItem {
        id,
        name,
        relation: relation.to_string(),
    }
}

fn node_details_failure(node_id: String, message: impl Into<String>) -> NodeDetailsResponse {
    NodeDetailsResponse {
        ok: false,
        node_id,
        kind: String::new(),
        title: String::new(),
        description: String::new(),
        related: Vec::new(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, view_clear_selection, view_close, view_details,
        view_export_csv, view_graph, view_matrix, view_node_details, view_open, view_select,
        view_set_filter, view_toggle_cross_mappings,
    };

    fn open() -> String {
        let response = view_open();
        assert!(response.ok, "{}", response.message);
        response.session_id.expect("session id on success")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn new_session_shows_full_matrix_and_overview() {
        let session = open();
        let matrix = view_matrix(session.clone());
        assert!(matrix.ok);
        assert_eq!(matrix.columns.len(), 6);
        assert_eq!(matrix.columns[0].category_name, "Model");

        let graph = view_graph(session.clone());
        assert!(graph.nodes.iter().any(|node| node.id == "DA-04" && node.kind == "artifact"));

        let details = view_details(session.clone());
        assert!(details.ok);
        assert_eq!(details.technique_id, None);
        assert!(details.message.contains("Select a technique"));
        assert!(view_close(session));
    }

    #[test]
    fn select_then_filter_out_clears_selection() {
        let session = open();
        let graph = view_select(session.clone(), "D3-CH".to_string());
        assert!(graph.ok, "{}", graph.message);
        assert!(graph.edges.iter().any(|edge| edge.source_id == "T1003"
            && edge.target_id == "DA-04"
            && edge.kind == "offensive_to_artifact"));

        let matrix = view_set_filter(session.clone(), "detect".to_string(), String::new());
        assert!(matrix.selection_cleared);
        assert_eq!(matrix.selected_technique_id, None);

        let details = view_details(session.clone());
        assert!(details.message.contains("no longer visible"));
        view_close(session);
    }

    #[test]
    fn blank_category_filter_shows_empty_matrix() {
        let session = open();
        let matrix = view_set_filter(session.clone(), String::new(), String::new());
        assert!(matrix.ok);
        assert!(matrix.columns.is_empty());
        assert_eq!(matrix.message, "No techniques match the current filters.");

        let hidden = view_select(session.clone(), "D3-CH".to_string());
        assert!(!hidden.ok);
        view_close(session);
    }

    #[test]
    fn details_list_resolved_artifacts() {
        let session = open();
        view_select(session.clone(), "D3-CH".to_string());
        let details = view_details(session.clone());
        let artifacts = details
            .related_artifacts
            .iter()
            .map(|item| (item.id.as_str(), item.name.as_str(), item.relation.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            artifacts,
            vec![("DA-04", "Credential", "artifact"), ("DA-05", "User Account", "artifact")]
        );
        view_close(session);
    }

    #[test]
    fn toggle_cross_mappings_adds_mapping_items() {
        let session = open();
        view_select(session.clone(), "D3-CE".to_string());
        let details = view_toggle_cross_mappings(session.clone(), true);
        assert_eq!(details.title, "D3-CE: Credential Eviction");
        let ids = details
            .cross_mappings
            .expect("toggled on")
            .into_iter()
            .map(|item| item.offensive_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["T1003", "T1078"]);

        let cleared = view_clear_selection(session.clone());
        assert_eq!(cleared.technique_id, None);
        view_close(session);
    }

    #[test]
    fn node_details_follow_current_graph() {
        let session = open();
        view_select(session.clone(), "D3-CH".to_string());

        let details = view_node_details(session.clone(), "T1003".to_string());
        assert!(details.ok, "{}", details.message);
        assert_eq!(details.kind, "offensive");
        assert!(details
            .related
            .iter()
            .any(|item| item.id == "D3-PA" && item.relation == "countermeasure"));

        let missing = view_node_details(session.clone(), "T1055".to_string());
        assert!(!missing.ok);
        view_close(session);
    }

    #[test]
    fn export_and_unknown_session_handling() {
        let session = open();
        view_set_filter(session.clone(), "all".to_string(), "cred".to_string());
        let export = view_export_csv(session.clone());
        assert!(export.ok);
        assert_eq!(export.file_name, "d3fend_matrix_export.csv");
        assert_eq!(export.content.lines().count(), 4);
        assert!(view_close(session.clone()));

        assert!(!view_close(session.clone()));
        assert!(!view_matrix(session.clone()).ok);
        assert!(!view_select(session, "D3-CH".to_string()).ok);
    }
}
