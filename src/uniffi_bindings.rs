//! UniFFI bindings for recipe-fork
//!
//! This module provides FFI-compatible types and functions for use with iOS and Android.
//! Grocery functions persist to a JSON file and run on their own tokio runtime.

use std::fmt;

use crate::diff::{LineDiff, LineStatus, SectionDiff};
use crate::error::ForkError;
use crate::grocery::{GroceryService, JsonFileBackend, MergedItem};
use crate::ingredients::ParsedIngredient;
use crate::sections::Section;
use crate::stream::StreamEvent;
use crate::timers::TimerMatch;

// Re-export UniFFI macro
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();

/// FFI-compatible parsed ingredient
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiIngredient {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub name: String,
    pub display_text: String,
    pub original: String,
    /// Matching key, see `ingredient_key`
    pub key: String,
}

impl From<ParsedIngredient> for FfiIngredient {
    fn from(parsed: ParsedIngredient) -> Self {
        FfiIngredient {
            key: parsed.key(),
            quantity: parsed.quantity,
            unit: parsed.unit,
            name: parsed.name,
            display_text: parsed.display_text,
            original: parsed.original,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiSection {
    pub name: String,
    pub content: String,
}

impl From<Section> for FfiSection {
    fn from(section: Section) -> Self {
        FfiSection {
            name: section.name,
            content: section.content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
pub enum FfiLineStatus {
    Unchanged,
    Added,
    Removed,
    Modified,
}

impl From<LineStatus> for FfiLineStatus {
    fn from(status: LineStatus) -> Self {
        match status {
            LineStatus::Unchanged => FfiLineStatus::Unchanged,
            LineStatus::Added => FfiLineStatus::Added,
            LineStatus::Removed => FfiLineStatus::Removed,
            LineStatus::Modified => FfiLineStatus::Modified,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiLineDiff {
    pub status: FfiLineStatus,
    pub fork_line: Option<String>,
    pub base_line: Option<String>,
    pub annotation: Option<String>,
}

impl From<LineDiff> for FfiLineDiff {
    fn from(line: LineDiff) -> Self {
        FfiLineDiff {
            status: line.status.into(),
            fork_line: line.fork_line,
            base_line: line.base_line,
            annotation: line.annotation,
        }
    }
}

/// FFI-compatible section diff (maps aren't ordered across UniFFI, so a list)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiSectionDiff {
    pub section_name: String,
    pub lines: Vec<FfiLineDiff>,
    pub has_changes: bool,
}

impl From<SectionDiff> for FfiSectionDiff {
    fn from(diff: SectionDiff) -> Self {
        FfiSectionDiff {
            section_name: diff.section_name,
            lines: diff.lines.into_iter().map(Into::into).collect(),
            has_changes: diff.has_changes,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiTimer {
    /// Byte offset into the UTF-8 text
    pub start_index: u64,
    pub end_index: u64,
    pub original_text: String,
    pub total_seconds: u64,
    pub label: String,
}

impl From<TimerMatch> for FfiTimer {
    fn from(timer: TimerMatch) -> Self {
        FfiTimer {
            start_index: timer.start_index as u64,
            end_index: timer.end_index as u64,
            original_text: timer.original_text,
            total_seconds: timer.total_seconds,
            label: timer.label,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct FfiGroceryItem {
    pub key: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub name: String,
    pub display_text: String,
    pub sources: Vec<String>,
    pub checked: bool,
}

impl From<MergedItem> for FfiGroceryItem {
    fn from(item: MergedItem) -> Self {
        FfiGroceryItem {
            key: item.key,
            quantity: item.quantity,
            unit: item.unit,
            name: item.name,
            display_text: item.display_text,
            sources: item.sources,
            checked: item.checked,
        }
    }
}

/// FFI-compatible error type
#[derive(Debug, Clone)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Error))]
pub enum FfiForkError {
    /// Grocery list could not be read or written
    StorageError { message: String },
    /// JSON input or stored data was malformed
    SerializationError { message: String },
    /// Invalid input provided
    InvalidInput { message: String },
    /// Configuration error
    ConfigError { message: String },
    /// Runtime error (tokio)
    RuntimeError { message: String },
}

impl fmt::Display for FfiForkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfiForkError::StorageError { message } => write!(f, "Storage error: {}", message),
            FfiForkError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
            FfiForkError::InvalidInput { message } => write!(f, "Invalid input: {}", message),
            FfiForkError::ConfigError { message } => write!(f, "Config error: {}", message),
            FfiForkError::RuntimeError { message } => write!(f, "Runtime error: {}", message),
        }
    }
}

impl std::error::Error for FfiForkError {}

impl From<ForkError> for FfiForkError {
    fn from(err: ForkError) -> Self {
        match err {
            ForkError::StorageError(e) => FfiForkError::StorageError {
                message: e.to_string(),
            },
            ForkError::SerializationError(e) => FfiForkError::SerializationError {
                message: e.to_string(),
            },
            ForkError::ConfigError(e) => FfiForkError::ConfigError {
                message: e.to_string(),
            },
            ForkError::InvalidInput(msg) => FfiForkError::InvalidInput { message: msg },
        }
    }
}

impl From<serde_json::Error> for FfiForkError {
    fn from(err: serde_json::Error) -> Self {
        ForkError::from(err).into()
    }
}

/// Create a new tokio runtime for FFI calls
fn create_runtime() -> Result<tokio::runtime::Runtime, FfiForkError> {
    tokio::runtime::Runtime::new().map_err(|e| FfiForkError::RuntimeError {
        message: format!("Failed to create async runtime: {}", e),
    })
}

/// Parse one ingredient line
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn parse_ingredient_line(line: String) -> FfiIngredient {
    crate::parse_ingredient(&line).into()
}

/// Re-render an ingredient line with its quantity scaled
///
/// # Arguments
/// * `line` - The ingredient line as written in the recipe
/// * `scale_factor` - Multiplier, e.g. `2.0` to double the recipe
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn scale_ingredient_line(line: String, scale_factor: f64) -> String {
    crate::format_ingredient(&crate::parse_ingredient(&line), scale_factor)
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn normalize_ingredient_line(line: String) -> String {
    crate::normalize_ingredient(&line)
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn split_sections(markdown: String) -> Vec<FfiSection> {
    crate::parse_sections(&markdown)
        .into_iter()
        .map(Into::into)
        .collect()
}

/// Base recipe with the fork's sections substituted in
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn merge_fork_content(base_markdown: String, fork_markdown: String) -> String {
    crate::merge_content(&base_markdown, &fork_markdown)
}

/// Section diffs of a fork against its base, in fork section order
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn diff_fork_sections(base_markdown: String, fork_markdown: String) -> Vec<FfiSectionDiff> {
    crate::compute_section_diffs(&base_markdown, &fork_markdown)
        .into_values()
        .map(Into::into)
        .collect()
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn find_timers(text: String) -> Vec<FfiTimer> {
    crate::parse_timers(&text).into_iter().map(Into::into).collect()
}

/// Build the branch graph for a JSON array of stream events
///
/// # Returns
/// A JSON object `{ "rows": [...], "totalColumns": n }`
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn build_graph_json(events_json: String) -> Result<String, FfiForkError> {
    let events: Vec<StreamEvent> = serde_json::from_str(&events_json)?;
    let rows = crate::build_graph(&events);
    let output = serde_json::json!({
        "totalColumns": crate::total_columns(&rows),
        "rows": rows,
    });
    Ok(output.to_string())
}

fn grocery_service(path: &str) -> Result<GroceryService, FfiForkError> {
    if path.trim().is_empty() {
        return Err(FfiForkError::InvalidInput {
            message: "Grocery list path is empty".to_string(),
        });
    }
    Ok(GroceryService::new(Box::new(JsonFileBackend::new(path))))
}

/// Merged grocery list stored at `path`
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn grocery_items(path: String) -> Result<Vec<FfiGroceryItem>, FfiForkError> {
    let service = grocery_service(&path)?;
    let rt = create_runtime()?;
    let store = rt.block_on(service.load())?;
    Ok(store.merged_items().into_iter().map(Into::into).collect())
}

/// Add (or replace) a recipe's ingredients in the grocery list at `path`
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn grocery_add_recipe(
    path: String,
    slug: String,
    title: String,
    ingredients: Vec<String>,
    fork: Option<String>,
    servings: Option<String>,
) -> Result<Vec<FfiGroceryItem>, FfiForkError> {
    let service = grocery_service(&path)?;
    let rt = create_runtime()?;
    let store = rt.block_on(service.update(|store| {
        store.add_recipe(
            &slug,
            &title,
            &ingredients,
            fork.as_deref(),
            servings.as_deref(),
        )
    }))?;
    Ok(store.merged_items().into_iter().map(Into::into).collect())
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn grocery_remove_recipe(
    path: String,
    slug: String,
) -> Result<Vec<FfiGroceryItem>, FfiForkError> {
    let service = grocery_service(&path)?;
    let rt = create_runtime()?;
    let store = rt.block_on(service.update(|store| {
        store.remove_recipe(&slug);
    }))?;
    Ok(store.merged_items().into_iter().map(Into::into).collect())
}

#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn grocery_toggle_checked(
    path: String,
    key: String,
) -> Result<Vec<FfiGroceryItem>, FfiForkError> {
    let service = grocery_service(&path)?;
    let rt = create_runtime()?;
    let store = rt.block_on(service.update(|store| {
        store.toggle_checked(&key);
    }))?;
    Ok(store.merged_items().into_iter().map(Into::into).collect())
}

/// Plain-text export of the grocery list at `path`
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn grocery_export(path: String) -> Result<String, FfiForkError> {
    let service = grocery_service(&path)?;
    let rt = create_runtime()?;
    Ok(rt.block_on(service.load())?.export_text())
}

/// Get the library version
#[cfg_attr(feature = "uniffi", uniffi::export)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
