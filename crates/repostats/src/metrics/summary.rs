//! Repository summary facts: commit, tag and branch counts.

use serde::Serialize;

use crate::github::Repository;
use crate::sink::TableRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryFactRow {
    pub repository_id: u64,
    pub name: String,
    pub description: Option<String>,
    pub commits_count: usize,
    pub tags_count: usize,
    pub branches_count: usize,
}

impl TableRow for RepositoryFactRow {
    const HEADERS: &'static [&'static str] = &[
        "Repository ID",
        "Name",
        "Description",
        "Commits Count",
        "Tags Count",
        "Branches Count",
    ];
}

pub fn fact_row(
    repo: &Repository,
    commits_count: usize,
    tags_count: usize,
    branches_count: usize,
) -> RepositoryFactRow {
    RepositoryFactRow {
        repository_id: repo.id,
        name: repo.name.clone(),
        description: repo.description.clone(),
        commits_count,
        tags_count,
        branches_count,
    }
}
