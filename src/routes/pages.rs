//! Public HTML pages. Drafts are never shown here.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    models::{MovieFilter, Pagination},
    templates::{self, ListSelection},
};

#[derive(Debug)]
pub struct PageError(AppError);

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let message = match &self.0 {
            AppError::Db(_) | AppError::Internal(_) => {
                tracing::error!(error = %self.0, "page failed");
                "Something went wrong.".to_string()
            },
            other => other.to_string(),
        };
        (status, Html(templates::error_page(message))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndexQuery {
    category: Option<String>,
    genre: Option<String>,
    page: Option<u64>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(q): Query<IndexQuery>,
) -> Result<Html<String>, PageError> {
    let mut filter = MovieFilter::default();
    if let Some(url) = q.category.as_deref() {
        let category = state
            .catalog
            .category_by_url(url)
            .await?
            .ok_or_else(|| AppError::not_found(crate::entities::category::VERBOSE_NAME, url))?;
        filter.category = Some(category.id);
    }
    if let Some(url) = q.genre.as_deref() {
        let genre = state
            .catalog
            .genre_by_url(url)
            .await?
            .ok_or_else(|| AppError::not_found(crate::entities::genre::VERBOSE_NAME, url))?;
        filter.genre = Some(genre.id);
    }

    let pagination =
        Pagination::resolve(q.page, None, state.config.page_size, state.config.max_page_size);
    let movies = state.catalog.list_movies(filter, pagination).await?;
    let categories = state.catalog.all_categories().await?;
    let genres = state.catalog.all_genres().await?;

    let selection = ListSelection { category: q.category.as_deref(), genre: q.genre.as_deref() };
    Ok(Html(templates::index_page(
        &movies.items,
        &categories,
        &genres,
        selection,
        &state.config.media_url,
    )))
}

pub async fn movie(
    State(state): State<Arc<AppState>>,
    Path(url): Path<String>,
) -> Result<Html<String>, PageError> {
    let movie = state.catalog.movie_by_url(&url).await?;
    if movie.draft {
        return Err(AppError::not_found(crate::entities::movie::VERBOSE_NAME, url).into());
    }
    let detail = state.catalog.expand_movie(movie).await?;
    Ok(Html(templates::movie_page(&detail, &state.config.media_url)))
}
