//! Request payloads and response shapes for the catalog.

use serde::{Deserialize, Serialize};

use crate::{
    entities::{actor, category, genre, movie, movie_shots, reviews},
    validation::{FieldErrors, SMALL_UINT_MAX, UINT_MAX},
};

pub const DEFAULT_MOVIE_YEAR: i64 = 2023;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub url: String,
}

impl CategoryForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name, Some(150));
        errors.required("description", &self.description, None);
        errors.slug("url", &self.url);
        errors
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActorForm {
    pub name: String,
    pub age: i64,
    pub description: String,
    pub image: String,
}

impl ActorForm {
    /// Returns the normalized image path alongside any errors.
    pub fn validate(&self) -> (FieldErrors, String) {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name, Some(100));
        errors.range("age", self.age, 0, SMALL_UINT_MAX);
        errors.required("description", &self.description, None);
        let image = errors.media_path("image", &self.image, actor::UPLOAD_TO);
        (errors, image)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenreForm {
    pub name: String,
    pub description: String,
    pub url: String,
}

impl GenreForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name, Some(100));
        errors.required("description", &self.description, None);
        errors.slug("url", &self.url);
        errors
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MovieForm {
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub poster: String,
    pub year: i64,
    pub country: String,
    /// `YYYY-MM-DD`; today when omitted.
    pub world_premiere: Option<String>,
    pub budget: i64,
    pub fees_in_usa: i64,
    pub fees_in_world: i64,
    pub category_id: Option<i32>,
    pub url: String,
    pub draft: bool,
    pub directors: Vec<i32>,
    pub actors: Vec<i32>,
    pub genres: Vec<i32>,
}

impl Default for MovieForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            tagline: String::new(),
            description: String::new(),
            poster: String::new(),
            year: DEFAULT_MOVIE_YEAR,
            country: String::new(),
            world_premiere: None,
            budget: 0,
            fees_in_usa: 0,
            fees_in_world: 0,
            category_id: None,
            url: String::new(),
            draft: false,
            directors: Vec::new(),
            actors: Vec::new(),
            genres: Vec::new(),
        }
    }
}

/// Movie fields after validation, ready to be written.
#[derive(Clone, Debug)]
pub struct CleanMovie {
    pub poster: String,
    pub world_premiere: jiff::civil::Date,
}

impl MovieForm {
    pub fn validate(&self, today: jiff::civil::Date) -> (FieldErrors, CleanMovie) {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title, Some(100));
        errors.max_len("tagline", &self.tagline, 100);
        errors.required("description", &self.description, None);
        let poster = errors.media_path("poster", &self.poster, movie::UPLOAD_TO);
        errors.range("year", self.year, 0, SMALL_UINT_MAX);
        errors.required("country", &self.country, Some(30));
        let world_premiere = match self.world_premiere.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                errors.date("world_premiere", raw).unwrap_or(today)
            },
            _ => today,
        };
        errors.range("budget", self.budget, 0, UINT_MAX);
        errors.range("fees_in_usa", self.fees_in_usa, 0, UINT_MAX);
        errors.range("fees_in_world", self.fees_in_world, 0, UINT_MAX);
        errors.slug("url", &self.url);
        (errors, CleanMovie { poster, world_premiere })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShotForm {
    pub title: String,
    pub description: String,
    pub image: String,
    pub movie_id: i32,
}

impl ShotForm {
    pub fn validate(&self) -> (FieldErrors, String) {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title, Some(100));
        errors.required("description", &self.description, None);
        let image = errors.media_path("image", &self.image, movie_shots::UPLOAD_TO);
        (errors, image)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatingStarForm {
    pub value: i64,
}

impl RatingStarForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.range("value", self.value, i16::MIN.into(), i16::MAX.into());
        errors
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatingForm {
    pub ip: String,
    pub star_id: i32,
    pub movie_id: i32,
}

impl RatingForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.ip("ip", &self.ip);
        errors
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub email: String,
    pub name: String,
    pub text: String,
    pub parent_id: Option<i32>,
    pub movie_id: i32,
}

impl ReviewForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.email("email", &self.email);
        errors.required("name", &self.name, Some(100));
        errors.required("text", &self.text, Some(reviews::TEXT_MAX_LEN));
        errors
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// List filter for records that belong to a movie.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MovieScopedQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub movie: Option<i32>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub category: Option<i32>,
    pub genre: Option<i32>,
    pub year: Option<i16>,
    pub include_drafts: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovieFilter {
    pub category: Option<i32>,
    pub genre: Option<i32>,
    pub year: Option<i16>,
    pub include_drafts: bool,
}

impl From<&MovieListQuery> for MovieFilter {
    fn from(q: &MovieListQuery) -> Self {
        Self {
            category: q.category,
            genre: q.genre,
            year: q.year,
            include_drafts: q.include_drafts,
        }
    }
}

/// 1-based page selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    /// `page * per_page` always fits the SQL offset.
    pub fn resolve(page: Option<u64>, per_page: Option<u64>, default: u64, max: u64) -> Self {
        let per_page = per_page.unwrap_or(default).clamp(1, max.max(1));
        let last_page = i64::MAX as u64 / per_page;
        Self { page: page.unwrap_or(1).clamp(1, last_page), per_page }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub votes: u64,
    pub average: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewNode {
    #[serde(flatten)]
    pub review: reviews::Model,
    pub replies: Vec<ReviewNode>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: movie::Model,
    pub category: Option<category::Model>,
    pub directors: Vec<actor::Model>,
    pub actors: Vec<actor::Model>,
    pub genres: Vec<genre::Model>,
    pub shots: Vec<movie_shots::Model>,
    pub rating: RatingSummary,
    pub reviews: Vec<ReviewNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> jiff::civil::Date {
        jiff::civil::date(2024, 5, 17)
    }

    #[test]
    fn movie_form_defaults_match_catalog_defaults() {
        let form: MovieForm = serde_json::from_str(r#"{"title": "Inception"}"#).unwrap();
        assert_eq!(form.year, DEFAULT_MOVIE_YEAR);
        assert_eq!(form.tagline, "");
        assert_eq!(form.budget, 0);
        assert!(!form.draft);
        assert!(form.directors.is_empty());
    }

    #[test]
    fn movie_form_rejects_negative_money_and_bad_date() {
        let form = MovieForm {
            title: "Inception".into(),
            description: "Dreams within dreams".into(),
            poster: "inception.jpg".into(),
            country: "USA".into(),
            url: "inception".into(),
            budget: -1,
            fees_in_world: UINT_MAX + 1,
            world_premiere: Some("2010-13-40".into()),
            ..MovieForm::default()
        };

        let (errors, clean) = form.validate(today());
        assert!(errors.contains("budget"));
        assert!(errors.contains("fees_in_world"));
        assert!(errors.contains("world_premiere"));
        assert!(!errors.contains("fees_in_usa"));
        assert_eq!(clean.poster, "movies/inception.jpg");
    }

    #[test]
    fn movie_premiere_defaults_to_today() {
        let form = MovieForm { world_premiere: Some("  ".into()), ..MovieForm::default() };
        let (_, clean) = form.validate(today());
        assert_eq!(clean.world_premiere, today());
    }

    #[test]
    fn review_text_is_capped() {
        let form = ReviewForm {
            email: "a@b.co".into(),
            name: "Ann".into(),
            text: "x".repeat(reviews::TEXT_MAX_LEN + 1),
            parent_id: None,
            movie_id: 1,
        };
        let errors = form.validate();
        assert!(errors.contains("text"));
        assert!(!errors.contains("email"));
    }

    #[test]
    fn pagination_clamps_inputs() {
        assert_eq!(
            Pagination::resolve(Some(0), Some(1000), 20, 100),
            Pagination { page: 1, per_page: 100 }
        );
        assert_eq!(Pagination::resolve(None, None, 20, 100), Pagination { page: 1, per_page: 20 });
        assert_eq!(
            Pagination::resolve(Some(u64::MAX), Some(20), 20, 100),
            Pagination { page: i64::MAX as u64 / 20, per_page: 20 }
        );
    }
}
