mod events;
mod graph;

pub use events::{
    events_from_history, legacy_fork_name, BranchRef, EventKind, ForkSummary, LogEntry,
    StreamEvent, Transition,
};
pub use graph::{
    build_graph, total_columns, Collapsed, Connector, ConnectorKind, GraphNode, GraphRow,
    MAIN_COLUMN,
};
