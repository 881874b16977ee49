//! Tag metrics: latest-tag summary and the per-tag listing.

use serde::Serialize;

use crate::github::{Repository, Tag};
use crate::sink::TableRow;

/// Sentinel for a repository with no tags in the latest-tag table.
pub const NO_TAG: &str = "none";

/// Sentinel emitted in the per-tag listing when a repository has no tags.
/// Kept as the literal string "null" for compatibility with downstream
/// consumers of `dim_tags.csv`.
pub const NULL_TAG: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestTagRow {
    pub repository_id: u64,
    pub repository_name: String,
    pub latest_tag: String,
}

impl TableRow for LatestTagRow {
    const HEADERS: &'static [&'static str] = &["Repository ID", "Repository Name", "Latest Tag"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    pub repository_id: u64,
    pub repository: String,
    pub tag_name: String,
}

impl TableRow for TagRow {
    const HEADERS: &'static [&'static str] = &["Repository ID", "Repository", "Tag Name"];
}

/// The latest tag is the first element of the platform's default ordering.
pub fn latest_tag_row(repo: &Repository, tags: &[Tag]) -> LatestTagRow {
    LatestTagRow {
        repository_id: repo.id,
        repository_name: repo.name.clone(),
        latest_tag: tags
            .first()
            .map(|t| t.name.clone())
            .unwrap_or_else(|| NO_TAG.to_string()),
    }
}

/// One row per tag; a repository with zero tags still gets a single row
/// carrying the [`NULL_TAG`] sentinel rather than being omitted.
pub fn tag_rows(repo: &Repository, tags: &[Tag]) -> Vec<TagRow> {
    if tags.is_empty() {
        return vec![TagRow {
            repository_id: repo.id,
            repository: repo.name.clone(),
            tag_name: NULL_TAG.to_string(),
        }];
    }
    tags.iter()
        .map(|tag| TagRow {
            repository_id: repo.id,
            repository: repo.name.clone(),
            tag_name: tag.name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repository {
        serde_json::from_str(r#"{"id": 9, "name": "widget"}"#).unwrap()
    }

    fn tags(names: &[&str]) -> Vec<Tag> {
        names
            .iter()
            .map(|n| Tag {
                name: (*n).to_string(),
            })
            .collect()
    }

    #[test]
    fn latest_tag_is_first_in_platform_order() {
        let row = latest_tag_row(&repo(), &tags(&["v2.1.0", "v2.0.0", "v1.0.0"]));
        assert_eq!(row.latest_tag, "v2.1.0");
        assert_eq!(row.repository_id, 9);
    }

    #[test]
    fn empty_tag_list_uses_sentinel_instead_of_omitting_the_row() {
        let row = latest_tag_row(&repo(), &[]);
        assert_eq!(row.latest_tag, NO_TAG);
    }

    #[test]
    fn tag_rows_emit_one_row_per_tag() {
        let rows = tag_rows(&repo(), &tags(&["v1.0.0", "v0.9.0"]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tag_name, "v1.0.0");
        assert_eq!(rows[1].tag_name, "v0.9.0");
    }

    #[test]
    fn headers_match_published_columns() {
        assert_eq!(
            LatestTagRow::HEADERS,
            ["Repository ID", "Repository Name", "Latest Tag"]
        );
        assert_eq!(TagRow::HEADERS, ["Repository ID", "Repository", "Tag Name"]);
    }

    #[test]
    fn tag_rows_emit_null_sentinel_for_untagged_repository() {
        let rows = tag_rows(&repo(), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag_name, NULL_TAG);
    }
}
