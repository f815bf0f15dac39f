//! Global search and category listing.

use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use diary_core::defaults::{
    NOTE_CATEGORIES, SEARCH_MIN_QUERY_CHARS, SEARCH_NOTE_LIMIT, SEARCH_PEOPLE_LIMIT,
};
use diary_db::{CategoryCount, NoteRepository, PersonSearch, SearchResults};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Substring search over note title/content and person name/notes.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let q = query.q.unwrap_or_default();
    if q.chars().count() < SEARCH_MIN_QUERY_CHARS {
        return Err(ApiError::BadRequest(
            "Query must be at least 2 characters".to_string(),
        ));
    }

    let (notes, people) = futures::try_join!(
        state.db.notes.search(&q, SEARCH_NOTE_LIMIT),
        PersonSearch::search(&state.db.people, &q, SEARCH_PEOPLE_LIMIT),
    )?;

    Ok(Json(SearchResults { notes, people }))
}

/// Used categories by count, then the unused defaults with count 0.
pub async fn categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    let counts = state.db.notes.category_counts().await?;
    Ok(Json(with_default_categories(counts)))
}

fn with_default_categories(mut counts: Vec<CategoryCount>) -> Vec<CategoryCount> {
    let used: HashSet<String> = counts.iter().map(|c| c.category.clone()).collect();
    counts.extend(
        NOTE_CATEGORIES
            .iter()
            .filter(|name| !used.contains(**name))
            .map(|name| CategoryCount {
                category: name.to_string(),
                count: 0,
            }),
    );
    counts
}
