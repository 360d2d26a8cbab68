//! JSON endpoints, one resource per catalog entity.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    AppState,
    entities::{actor, category, genre, movie, movie_shots, rating, rating_star, reviews},
    error::AppResult,
    models::{
        ActorForm, CategoryForm, GenreForm, MovieDetail, MovieFilter, MovieForm, MovieListQuery,
        MovieScopedQuery, Page, PageQuery, RatingForm, RatingStarForm, ReviewForm, ReviewNode,
        ShotForm,
    },
};

type Shared = State<Arc<AppState>>;

/// Human-readable name of a record.
#[derive(Debug, Serialize)]
pub struct Label {
    pub label: String,
}
type Created<T> = AppResult<(StatusCode, Json<T>)>;

fn created<T>(value: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(value)))
}

// categories

pub async fn list_categories(
    State(state): Shared,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Page<category::Model>>> {
    Ok(Json(state.catalog.list_categories(state.pagination(q.page, q.per_page)).await?))
}

pub async fn create_category(
    State(state): Shared,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Created<category::Model> {
    created(state.catalog.create_category(form).await?)
}

pub async fn get_category(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<category::Model>> {
    Ok(Json(state.catalog.get_category(id).await?))
}

pub async fn update_category(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<CategoryForm>,
) -> AppResult<Json<category::Model>> {
    Ok(Json(state.catalog.update_category(id, form).await?))
}

pub async fn delete_category(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// actors

pub async fn list_actors(
    State(state): Shared,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Page<actor::Model>>> {
    Ok(Json(state.catalog.list_actors(state.pagination(q.page, q.per_page)).await?))
}

pub async fn create_actor(State(state): Shared, ApiJson(form): ApiJson<ActorForm>) -> Created<actor::Model> {
    created(state.catalog.create_actor(form).await?)
}

pub async fn get_actor(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<actor::Model>> {
    Ok(Json(state.catalog.get_actor(id).await?))
}

pub async fn update_actor(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<ActorForm>,
) -> AppResult<Json<actor::Model>> {
    Ok(Json(state.catalog.update_actor(id, form).await?))
}

pub async fn delete_actor(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_actor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn actor_directed(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Vec<movie::Model>>> {
    Ok(Json(state.catalog.movies_directed_by(id).await?))
}

pub async fn actor_starred(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Vec<movie::Model>>> {
    Ok(Json(state.catalog.movies_starring(id).await?))
}

// genres

pub async fn list_genres(
    State(state): Shared,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Page<genre::Model>>> {
    Ok(Json(state.catalog.list_genres(state.pagination(q.page, q.per_page)).await?))
}

pub async fn create_genre(State(state): Shared, ApiJson(form): ApiJson<GenreForm>) -> Created<genre::Model> {
    created(state.catalog.create_genre(form).await?)
}

pub async fn get_genre(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<genre::Model>> {
    Ok(Json(state.catalog.get_genre(id).await?))
}

pub async fn update_genre(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<GenreForm>,
) -> AppResult<Json<genre::Model>> {
    Ok(Json(state.catalog.update_genre(id, form).await?))
}

pub async fn delete_genre(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// movies

pub async fn list_movies(
    State(state): Shared,
    ApiQuery(q): ApiQuery<MovieListQuery>,
) -> AppResult<Json<Page<movie::Model>>> {
    let pagination = state.pagination(q.page, q.per_page);
    Ok(Json(state.catalog.list_movies(MovieFilter::from(&q), pagination).await?))
}

pub async fn create_movie(State(state): Shared, ApiJson(form): ApiJson<MovieForm>) -> Created<MovieDetail> {
    created(state.catalog.create_movie(form).await?)
}

pub async fn get_movie(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.movie_detail(id).await?))
}

pub async fn update_movie(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<MovieForm>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.update_movie(id, form).await?))
}

pub async fn delete_movie(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_movie(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn movie_reviews(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<Vec<ReviewNode>>> {
    Ok(Json(state.catalog.movie_reviews(id).await?))
}

// movie stills

pub async fn list_shots(
    State(state): Shared,
    ApiQuery(q): ApiQuery<MovieScopedQuery>,
) -> AppResult<Json<Page<movie_shots::Model>>> {
    let pagination = state.pagination(q.page, q.per_page);
    Ok(Json(state.catalog.list_shots(q.movie, pagination).await?))
}

pub async fn create_shot(State(state): Shared, ApiJson(form): ApiJson<ShotForm>) -> Created<movie_shots::Model> {
    created(state.catalog.create_shot(form).await?)
}

pub async fn get_shot(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<movie_shots::Model>> {
    Ok(Json(state.catalog.get_shot(id).await?))
}

pub async fn update_shot(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<ShotForm>,
) -> AppResult<Json<movie_shots::Model>> {
    Ok(Json(state.catalog.update_shot(id, form).await?))
}

pub async fn delete_shot(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_shot(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// rating stars

pub async fn list_rating_stars(
    State(state): Shared,
    ApiQuery(q): ApiQuery<PageQuery>,
) -> AppResult<Json<Page<rating_star::Model>>> {
    Ok(Json(state.catalog.list_rating_stars(state.pagination(q.page, q.per_page)).await?))
}

pub async fn create_rating_star(
    State(state): Shared,
    ApiJson(form): ApiJson<RatingStarForm>,
) -> Created<rating_star::Model> {
    created(state.catalog.create_rating_star(form).await?)
}

pub async fn get_rating_star(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<rating_star::Model>> {
    Ok(Json(state.catalog.get_rating_star(id).await?))
}

pub async fn update_rating_star(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<RatingStarForm>,
) -> AppResult<Json<rating_star::Model>> {
    Ok(Json(state.catalog.update_rating_star(id, form).await?))
}

pub async fn delete_rating_star(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_rating_star(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ratings

pub async fn list_ratings(
    State(state): Shared,
    ApiQuery(q): ApiQuery<MovieScopedQuery>,
) -> AppResult<Json<Page<rating::Model>>> {
    let pagination = state.pagination(q.page, q.per_page);
    Ok(Json(state.catalog.list_ratings(q.movie, pagination).await?))
}

pub async fn create_rating(State(state): Shared, ApiJson(form): ApiJson<RatingForm>) -> Created<rating::Model> {
    created(state.catalog.create_rating(form).await?)
}

pub async fn get_rating(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<rating::Model>> {
    Ok(Json(state.catalog.get_rating(id).await?))
}

pub async fn update_rating(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<RatingForm>,
) -> AppResult<Json<rating::Model>> {
    Ok(Json(state.catalog.update_rating(id, form).await?))
}

pub async fn rating_label(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<Label>> {
    Ok(Json(Label { label: state.catalog.rating_label(id).await? }))
}

pub async fn delete_rating(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_rating(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// reviews

pub async fn list_reviews(
    State(state): Shared,
    ApiQuery(q): ApiQuery<MovieScopedQuery>,
) -> AppResult<Json<Page<reviews::Model>>> {
    let pagination = state.pagination(q.page, q.per_page);
    Ok(Json(state.catalog.list_reviews(q.movie, pagination).await?))
}

pub async fn create_review(State(state): Shared, ApiJson(form): ApiJson<ReviewForm>) -> Created<reviews::Model> {
    created(state.catalog.create_review(form).await?)
}

pub async fn get_review(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<reviews::Model>> {
    Ok(Json(state.catalog.get_review(id).await?))
}

pub async fn update_review(
    State(state): Shared,
    ApiPath(id): ApiPath<i32>,
    ApiJson(form): ApiJson<ReviewForm>,
) -> AppResult<Json<reviews::Model>> {
    Ok(Json(state.catalog.update_review(id, form).await?))
}

pub async fn review_label(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<Json<Label>> {
    Ok(Json(Label { label: state.catalog.review_label(id).await? }))
}

pub async fn delete_review(State(state): Shared, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.catalog.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
