use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::events::{legacy_fork_name, BranchRef, StreamEvent, Transition};

/// Column of the main recipe line
pub const MAIN_COLUMN: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    BranchOut,
    MergeIn,
    UnmergeOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    #[serde(rename = "type")]
    pub kind: ConnectorKind,
    pub from_column: usize,
    pub to_column: usize,
}

/// A run of consecutive branch edits drawn as one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collapsed {
    pub count: usize,
    pub events: Vec<StreamEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    /// The event itself, or the latest event of a collapsed run
    pub event: StreamEvent,
    pub column: usize,
    pub branch_id: Option<String>,
    pub branch_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub collapsed: Option<Collapsed>,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRow {
    pub node: GraphNode,
    /// Branch columns still open after this row
    pub active_branches: BTreeSet<usize>,
}

struct GraphBuilder<'a> {
    columns: IndexMap<&'a str, usize>,
    labels: IndexMap<&'a str, &'a str>,
    active: BTreeSet<usize>,
    pending: IndexMap<&'a str, Vec<&'a StreamEvent>>,
    rows: Vec<GraphRow>,
}

impl<'a> GraphBuilder<'a> {
    /// Assign a column to every fork slug in order of its first fork event.
    fn new(events: &'a [StreamEvent]) -> Self {
        let mut columns = IndexMap::new();
        let mut labels = IndexMap::new();
        for event in events {
            if let Transition::Fork { slug, label } = event.transition() {
                if !columns.contains_key(slug) {
                    columns.insert(slug, columns.len() + 1);
                    labels.insert(slug, label);
                }
            }
        }

        GraphBuilder {
            columns,
            labels,
            active: BTreeSet::new(),
            pending: IndexMap::new(),
            rows: Vec::new(),
        }
    }

    fn column_of(&self, slug: &str) -> usize {
        self.columns.get(slug).copied().unwrap_or(MAIN_COLUMN)
    }

    fn slug_for_label(&self, name: &str) -> Option<&'a str> {
        self.labels
            .iter()
            .find(|(_, label)| **label == name)
            .map(|(slug, _)| *slug)
    }

    fn resolve(&self, branch: BranchRef<'a>) -> Option<&'a str> {
        match branch {
            BranchRef::Slug(slug) => Some(slug),
            BranchRef::Name(name) => self.slug_for_label(name),
            BranchRef::Unknown { message } => {
                legacy_fork_name(message).and_then(|name| self.slug_for_label(name))
            }
        }
    }

    fn push(
        &mut self,
        event: StreamEvent,
        column: usize,
        branch: Option<(&str, Option<&str>)>,
        collapsed: Option<Collapsed>,
        connectors: Vec<Connector>,
    ) {
        let node = GraphNode {
            id: format!("node-{}", self.rows.len()),
            event,
            column,
            branch_id: branch.map(|(id, _)| id.to_string()),
            branch_label: branch.and_then(|(_, label)| label.map(String::from)),
            collapsed,
            connectors,
        };
        self.rows.push(GraphRow {
            node,
            active_branches: self.active.clone(),
        });
    }

    fn flush(&mut self, slug: &'a str) {
        let pending = match self.pending.get_mut(slug) {
            Some(pending) if !pending.is_empty() => std::mem::take(pending),
            _ => return,
        };
        let column = self.column_of(slug);
        if column == MAIN_COLUMN {
            warn!("Edits on unknown fork '{}' placed on the main line", slug);
        }

        let Some(latest) = pending.last().map(|event| (*event).clone()) else {
            return;
        };
        let collapsed = (pending.len() > 1).then(|| Collapsed {
            count: pending.len(),
            events: pending.into_iter().cloned().collect(),
        });
        self.push(latest, column, Some((slug, None)), collapsed, Vec::new());
    }

    fn apply(&mut self, event: &'a StreamEvent) {
        match event.transition() {
            Transition::Fork { slug, .. } => {
                let column = self.column_of(slug);
                self.active.insert(column);
                let label = self.labels.get(slug).copied();
                self.push(
                    event.clone(),
                    column,
                    Some((slug, label)),
                    None,
                    vec![Connector {
                        kind: ConnectorKind::BranchOut,
                        from_column: MAIN_COLUMN,
                        to_column: column,
                    }],
                );
            }
            Transition::BranchEdit { slug } => {
                self.pending.entry(slug).or_default().push(event);
            }
            Transition::Merge(branch) => {
                let slug = self.resolve(branch);
                if let Some(slug) = slug {
                    self.flush(slug);
                }
                let column = slug.map(|s| self.column_of(s)).unwrap_or(MAIN_COLUMN);
                let mut connectors = Vec::new();
                if column > MAIN_COLUMN {
                    connectors.push(Connector {
                        kind: ConnectorKind::MergeIn,
                        from_column: column,
                        to_column: MAIN_COLUMN,
                    });
                    self.active.remove(&column);
                } else {
                    debug!("Merge event '{}' has no known branch", event.message);
                }
                self.push(event.clone(), MAIN_COLUMN, None, None, connectors);
            }
            Transition::Unmerge(branch) => {
                let column = self
                    .resolve(branch)
                    .map(|s| self.column_of(s))
                    .unwrap_or(MAIN_COLUMN);
                let mut connectors = Vec::new();
                if column > MAIN_COLUMN {
                    self.active.insert(column);
                    connectors.push(Connector {
                        kind: ConnectorKind::UnmergeOut,
                        from_column: MAIN_COLUMN,
                        to_column: column,
                    });
                }
                self.push(event.clone(), MAIN_COLUMN, None, None, connectors);
            }
            Transition::Mainline => {
                self.push(event.clone(), MAIN_COLUMN, None, None, Vec::new());
            }
        }
    }

    fn finish(mut self) -> Vec<GraphRow> {
        let open: Vec<&'a str> = self.pending.keys().copied().collect();
        for slug in open {
            self.flush(slug);
        }
        self.rows
    }
}

/// Turn a chronological event stream into rows of a branching graph.
///
/// Column 0 is the main line; each fork gets its own column in order of
/// its first fork event. Consecutive edits on a branch are held back and
/// emitted as one node (collapsed when there is more than one) when the
/// branch merges or the stream ends.
pub fn build_graph(events: &[StreamEvent]) -> Vec<GraphRow> {
    let mut builder = GraphBuilder::new(events);
    for event in events {
        builder.apply(event);
    }
    let rows = builder.finish();
    debug!("Built graph with {} rows from {} events", rows.len(), events.len());
    rows
}

/// Number of columns a renderer needs to reserve for `rows`.
pub fn total_columns(rows: &[GraphRow]) -> usize {
    rows.iter()
        .flat_map(|row| {
            std::iter::once(row.node.column).chain(row.active_branches.iter().copied())
        })
        .max()
        .unwrap_or(MAIN_COLUMN)
        + 1
}
