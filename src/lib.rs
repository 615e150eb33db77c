//! Text engine for versioned recipes.
//!
//! Recipes can be forked into variants and later compared and merged
//! back. This crate holds the deterministic parts of that workflow:
//!
//! - [`ingredients`]: parse free-form ingredient lines and format them back
//! - [`sections`]: split recipe markdown into `## ` sections and merge forks
//! - [`diff`]: per-section diffs of a fork against its base
//! - [`grocery`]: aggregate ingredients of several recipes into one list
//! - [`stream`]: turn a recipe's history into a branching graph
//! - [`timers`]: find durations in instruction text
//!
//! ```
//! use recipe_fork::{compute_section_diffs, LineStatus};
//!
//! let base = "## Ingredients\n- 2 cups flour\n- 1 egg";
//! let fork = "## Ingredients\n- 3 cups flour\n- 1 egg";
//! let diffs = compute_section_diffs(base, fork);
//! let lines = &diffs["Ingredients"].lines;
//! assert_eq!(lines[0].status, LineStatus::Modified);
//! assert_eq!(lines[0].annotation.as_deref(), Some("was 2 cups"));
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod grocery;
pub mod ingredients;
pub mod normalizer;
pub mod sections;
pub mod stream;
pub mod timers;
pub mod uniffi_bindings;

pub use config::{load_config, BackendKind, ForkConfig, GroceryConfig, StreamConfig};
pub use diff::{
    compute_section_diffs, diff_ingredients, diff_positional, LineDiff, LineStatus, SectionDiff,
};
pub use error::ForkError;
pub use grocery::{
    get_merged_items, BackendFactory, CustomCombine, GroceryBackend, GroceryRecipe,
    GroceryService, GroceryStore, JsonFileBackend, MemoryBackend, MergedItem,
};
pub use ingredients::{
    format_ingredient, format_quantity, ingredient_key, parse_ingredient, ParsedIngredient,
};
pub use normalizer::{normalize_ingredient, normalize_ingredients};
pub use sections::{
    changed_sections, generate_fork_markdown, get_modified_sections, merge_content,
    merge_fork_into_base, parse_sections, sections_from_recipe_data, ForkHeader, Section,
    PREAMBLE,
};
pub use stream::{
    build_graph, events_from_history, total_columns, Connector, ConnectorKind, EventKind,
    ForkSummary, GraphNode, GraphRow, LogEntry, StreamEvent,
};
pub use timers::{parse_timers, TimerMatch};
