use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::StreamConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Edited,
    Forked,
    Merged,
    Unmerged,
}

/// A historical fact about a recipe, as delivered by the history layer.
///
/// The wire shape is flat; use [`StreamEvent::transition`] to get the
/// fields each kind actually guarantees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub date: String,
    pub message: String,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub fork_name: Option<String>,
    #[serde(default)]
    pub fork_slug: Option<String>,
}

/// How an event moves the branch graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<'a> {
    /// A fork was created; `label` falls back to the slug
    Fork { slug: &'a str, label: &'a str },
    /// An edit on a fork branch
    BranchEdit { slug: &'a str },
    /// A fork merged back; the target may still need resolving
    Merge(BranchRef<'a>),
    /// A merge was undone; the target may still need resolving
    Unmerge(BranchRef<'a>),
    /// Anything that lives on the main line
    Mainline,
}

/// What a merge or unmerge event knows about its branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchRef<'a> {
    Slug(&'a str),
    Name(&'a str),
    Unknown { message: &'a str },
}

static LEGACY_MERGE_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Merged?|Unmerged?) fork '(.+)'").expect("valid merge message pattern")
});

/// Fork name out of a legacy `Merged fork '<name>'` commit message.
pub fn legacy_fork_name(message: &str) -> Option<&str> {
    LEGACY_MERGE_MESSAGE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl StreamEvent {
    pub fn new(kind: EventKind, date: impl Into<String>, message: impl Into<String>) -> Self {
        StreamEvent {
            kind,
            date: date.into(),
            message: message.into(),
            commit: None,
            fork_name: None,
            fork_slug: None,
        }
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn with_fork(mut self, slug: Option<&str>, name: Option<&str>) -> Self {
        self.fork_slug = slug.map(String::from);
        self.fork_name = name.map(String::from);
        self
    }

    fn branch_ref(&self) -> BranchRef<'_> {
        if let Some(slug) = non_empty(&self.fork_slug) {
            BranchRef::Slug(slug)
        } else if let Some(name) = non_empty(&self.fork_name) {
            BranchRef::Name(name)
        } else {
            BranchRef::Unknown {
                message: &self.message,
            }
        }
    }

    pub fn transition(&self) -> Transition<'_> {
        match (self.kind, non_empty(&self.fork_slug)) {
            (EventKind::Forked, Some(slug)) => Transition::Fork {
                slug,
                label: non_empty(&self.fork_name).unwrap_or(slug),
            },
            (EventKind::Edited, Some(slug)) => Transition::BranchEdit { slug },
            (EventKind::Merged, _) => Transition::Merge(self.branch_ref()),
            (EventKind::Unmerged, _) => Transition::Unmerge(self.branch_ref()),
            _ => Transition::Mainline,
        }
    }
}

/// One commit touching the base recipe file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub hash: String,
    pub date: String,
    pub message: String,
}

/// What the history layer knows about one fork of the recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkSummary {
    /// Fork slug
    pub name: String,
    /// Display name
    pub fork_name: String,
    #[serde(default)]
    pub date_added: Option<String>,
    #[serde(default)]
    pub merged_at: Option<String>,
}

fn classify_commit(entry: &LogEntry) -> StreamEvent {
    let message = entry.message.as_str();
    if message.starts_with("Create recipe") || message == "Initial commit" {
        return StreamEvent::new(EventKind::Created, &entry.date, message)
            .with_commit(&entry.hash);
    }
    if message.starts_with("Merge fork") {
        let fork_name = message.split('\'').nth(1);
        return StreamEvent::new(EventKind::Merged, &entry.date, message)
            .with_commit(&entry.hash)
            .with_fork(None, fork_name);
    }
    StreamEvent::new(EventKind::Edited, &entry.date, message).with_commit(&entry.hash)
}

/// Assemble the chronological stream for a recipe.
///
/// Commits of the base file become created/merged/edited events (noise
/// commits such as cook logs are dropped), and each fork contributes its
/// creation and, when the log has no merge commit for it, its merge.
/// Events are stably sorted by date.
pub fn events_from_history(
    log_entries: &[LogEntry],
    forks: &[ForkSummary],
    config: &StreamConfig,
) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = log_entries
        .iter()
        .take(config.max_events)
        .filter(|entry| {
            !config
                .noise_prefixes
                .iter()
                .any(|prefix| entry.message.starts_with(prefix.as_str()))
        })
        .map(classify_commit)
        .collect();

    for fork in forks {
        if let Some(date_added) = &fork.date_added {
            events.push(
                StreamEvent::new(
                    EventKind::Forked,
                    date_added,
                    format!("Forked: {}", fork.fork_name),
                )
                .with_fork(Some(fork.name.as_str()), Some(fork.fork_name.as_str())),
            );
        }
        if let Some(merged_at) = &fork.merged_at {
            let has_merge = events.iter().any(|e| {
                e.kind == EventKind::Merged
                    && e.fork_name.as_deref() == Some(fork.fork_name.as_str())
            });
            if !has_merge {
                events.push(
                    StreamEvent::new(
                        EventKind::Merged,
                        merged_at,
                        format!("Merged: {}", fork.fork_name),
                    )
                    .with_fork(Some(fork.name.as_str()), Some(fork.fork_name.as_str())),
                );
            }
        }
    }

    events.sort_by(|a, b| a.date.cmp(&b.date));
    debug!("Assembled {} stream events", events.len());
    events
}
