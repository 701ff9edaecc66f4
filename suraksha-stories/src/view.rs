//! Read-side shapes: stories with their comments, counts and relative ages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Comment, Story};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub time_ago: String,
}

impl CommentView {
    pub fn of(comment: &Comment, now: DateTime<Utc>) -> Self {
        Self {
            comment: comment.clone(),
            time_ago: time_ago(comment.created_at, now),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryView {
    #[serde(flatten)]
    pub story: Story,
    pub comments: Vec<CommentView>,
    pub comment_count: usize,
    pub like_count: usize,
    pub time_ago: String,
}

impl StoryView {
    pub fn of(story: Story, now: DateTime<Utc>) -> Self {
        Self {
            comments: story
                .comments
                .iter()
                .map(|comment| CommentView::of(comment, now))
                .collect(),
            comment_count: story.comments.len(),
            like_count: story.liked_by.len(),
            time_ago: time_ago(story.created_at, now),
            story,
        }
    }
}

const UNITS: [(&str, i64); 7] = [
    ("year", 31_536_000),
    ("month", 2_592_000),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// "3 days ago" style age of `then`. Anything under 30 seconds, or in the
/// future, is "just now".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 30 {
        return "just now".to_string();
    }

    UNITS
        .iter()
        .find_map(|(unit, size)| {
            let count = seconds / size;
            (count >= 1).then(|| {
                let plural = if count == 1 { "" } else { "s" };
                format!("{count} {unit}{plural} ago")
            })
        })
        .unwrap_or_else(|| "just now".to_string())
}
