//! Records owned by a movie: stills, star ratings and review threads.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use super::{Catalog, delete_required, find_required, paginate};
use crate::{
    entities::{movie, movie_shots, rating, rating_star, reviews},
    error::AppResult,
    models::{Page, Pagination, RatingForm, RatingSummary, ReviewForm, ReviewNode, ShotForm},
    validation::FieldErrors,
};

impl Catalog {
    pub async fn create_shot(&self, form: ShotForm) -> AppResult<movie_shots::Model> {
        let (mut errors, image) = form.validate();
        errors.merge(self.check_movie(form.movie_id).await?);
        errors.into_result()?;
        let model = movie_shots::ActiveModel {
            id: NotSet,
            title: Set(form.title.trim().to_string()),
            description: Set(form.description),
            image: Set(image),
            movie_id: Set(form.movie_id),
        }
        .insert(&self.db)
        .await?;
        debug!(shot_id = model.id, movie_id = model.movie_id, "created movie still");
        Ok(model)
    }

    pub async fn get_shot(&self, id: i32) -> AppResult<movie_shots::Model> {
        find_required::<movie_shots::Entity, _>(&self.db, id, movie_shots::VERBOSE_NAME).await
    }

    pub async fn list_shots(
        &self,
        movie_id: Option<i32>,
        pagination: Pagination,
    ) -> AppResult<Page<movie_shots::Model>> {
        let mut select = movie_shots::Entity::find().order_by_asc(movie_shots::Column::Id);
        if let Some(movie_id) = movie_id {
            select = select.filter(movie_shots::Column::MovieId.eq(movie_id));
        }
        paginate(&self.db, select, pagination).await
    }

    pub async fn update_shot(&self, id: i32, form: ShotForm) -> AppResult<movie_shots::Model> {
        let existing = self.get_shot(id).await?;
        let (mut errors, image) = form.validate();
        errors.merge(self.check_movie(form.movie_id).await?);
        errors.into_result()?;
        let mut active: movie_shots::ActiveModel = existing.into();
        active.title = Set(form.title.trim().to_string());
        active.description = Set(form.description);
        active.image = Set(image);
        active.movie_id = Set(form.movie_id);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_shot(&self, id: i32) -> AppResult<()> {
        delete_required::<movie_shots::Entity, _>(&self.db, id, movie_shots::VERBOSE_NAME).await
    }

    pub async fn create_rating(&self, form: RatingForm) -> AppResult<rating::Model> {
        self.validate_rating(&form).await?;
        let model = rating::ActiveModel {
            id: NotSet,
            ip: Set(form.ip.trim().to_string()),
            star_id: Set(form.star_id),
            movie_id: Set(form.movie_id),
        }
        .insert(&self.db)
        .await?;
        debug!(rating_id = model.id, movie_id = model.movie_id, star_id = model.star_id, "recorded rating");
        Ok(model)
    }

    pub async fn get_rating(&self, id: i32) -> AppResult<rating::Model> {
        find_required::<rating::Entity, _>(&self.db, id, rating::VERBOSE_NAME).await
    }

    pub async fn list_ratings(
        &self,
        movie_id: Option<i32>,
        pagination: Pagination,
    ) -> AppResult<Page<rating::Model>> {
        let mut select = rating::Entity::find().order_by_asc(rating::Column::Id);
        if let Some(movie_id) = movie_id {
            select = select.filter(rating::Column::MovieId.eq(movie_id));
        }
        paginate(&self.db, select, pagination).await
    }

    pub async fn update_rating(&self, id: i32, form: RatingForm) -> AppResult<rating::Model> {
        let existing = self.get_rating(id).await?;
        self.validate_rating(&form).await?;
        let mut active: rating::ActiveModel = existing.into();
        active.ip = Set(form.ip.trim().to_string());
        active.star_id = Set(form.star_id);
        active.movie_id = Set(form.movie_id);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_rating(&self, id: i32) -> AppResult<()> {
        delete_required::<rating::Entity, _>(&self.db, id, rating::VERBOSE_NAME).await
    }

    /// `"{star} - {movie}"` for a stored rating.
    pub async fn rating_label(&self, id: i32) -> AppResult<String> {
        let vote = self.get_rating(id).await?;
        let star = self.get_rating_star(vote.star_id).await?;
        let movie = self.get_movie(vote.movie_id).await?;
        Ok(rating::label(&star, &movie))
    }

    pub async fn rating_summary(&self, movie_id: i32) -> AppResult<RatingSummary> {
        let votes = rating::Entity::find()
            .filter(rating::Column::MovieId.eq(movie_id))
            .find_also_related(rating_star::Entity)
            .all(&self.db)
            .await?;

        let values: Vec<i64> =
            votes.iter().filter_map(|(_, star)| star.as_ref().map(|s| i64::from(s.value))).collect();
        let average = if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
        };

        Ok(RatingSummary { votes: values.len() as u64, average })
    }

    async fn validate_rating(&self, form: &RatingForm) -> AppResult<()> {
        let mut errors = form.validate();
        if rating_star::Entity::find_by_id(form.star_id).one(&self.db).await?.is_none() {
            errors.add("star_id", format!("Rating star {} does not exist.", form.star_id));
        }
        errors.merge(self.check_movie(form.movie_id).await?);
        errors.into_result()
    }

    pub async fn create_review(&self, form: ReviewForm) -> AppResult<reviews::Model> {
        self.validate_review(&form, None).await?;
        let model = reviews::ActiveModel {
            id: NotSet,
            email: Set(form.email.trim().to_string()),
            name: Set(form.name.trim().to_string()),
            text: Set(form.text),
            parent_id: Set(form.parent_id),
            movie_id: Set(form.movie_id),
        }
        .insert(&self.db)
        .await?;
        debug!(review_id = model.id, movie_id = model.movie_id, parent_id = ?model.parent_id, "created review");
        Ok(model)
    }

    pub async fn get_review(&self, id: i32) -> AppResult<reviews::Model> {
        find_required::<reviews::Entity, _>(&self.db, id, reviews::VERBOSE_NAME).await
    }

    pub async fn list_reviews(
        &self,
        movie_id: Option<i32>,
        pagination: Pagination,
    ) -> AppResult<Page<reviews::Model>> {
        let mut select = reviews::Entity::find().order_by_asc(reviews::Column::Id);
        if let Some(movie_id) = movie_id {
            select = select.filter(reviews::Column::MovieId.eq(movie_id));
        }
        paginate(&self.db, select, pagination).await
    }

    pub async fn update_review(&self, id: i32, form: ReviewForm) -> AppResult<reviews::Model> {
        let existing = self.get_review(id).await?;
        self.validate_review(&form, Some(&existing)).await?;
        let mut active: reviews::ActiveModel = existing.into();
        active.email = Set(form.email.trim().to_string());
        active.name = Set(form.name.trim().to_string());
        active.text = Set(form.text);
        active.parent_id = Set(form.parent_id);
        Ok(active.update(&self.db).await?)
    }

    /// Replies to the deleted review become top-level reviews.
    pub async fn delete_review(&self, id: i32) -> AppResult<()> {
        delete_required::<reviews::Entity, _>(&self.db, id, reviews::VERBOSE_NAME).await?;
        debug!(review_id = id, "deleted review");
        Ok(())
    }

    pub async fn review_label(&self, id: i32) -> AppResult<String> {
        let review = self.get_review(id).await?;
        let movie = self.get_movie(review.movie_id).await?;
        Ok(reviews::label(&review, &movie))
    }

    /// Reply tree for an existing movie.
    pub async fn movie_reviews(&self, movie_id: i32) -> AppResult<Vec<ReviewNode>> {
        self.get_movie(movie_id).await?;
        self.review_tree(movie_id).await
    }

    pub(super) async fn review_tree(&self, movie_id: i32) -> AppResult<Vec<ReviewNode>> {
        let flat = reviews::Entity::find()
            .filter(reviews::Column::MovieId.eq(movie_id))
            .order_by_asc(reviews::Column::Id)
            .all(&self.db)
            .await?;
        Ok(build_review_tree(flat))
    }

    async fn validate_review(
        &self,
        form: &ReviewForm,
        existing: Option<&reviews::Model>,
    ) -> AppResult<()> {
        let mut errors = form.validate();

        match existing {
            Some(review) if review.movie_id != form.movie_id => {
                errors.add("movie_id", "A review cannot be moved to another movie.");
            },
            Some(_) => {},
            None => errors.merge(self.check_movie(form.movie_id).await?),
        }

        if let Some(parent_id) = form.parent_id {
            match reviews::Entity::find_by_id(parent_id).one(&self.db).await? {
                None => errors.add("parent_id", format!("Review {parent_id} does not exist.")),
                Some(parent) if parent.movie_id != form.movie_id => {
                    errors.add("parent_id", "The parent review belongs to another movie.");
                },
                Some(parent) => {
                    if let Some(review) = existing {
                        if self.is_descendant_or_self(parent, review.id).await? {
                            errors.add("parent_id", "A review cannot reply to itself or its replies.");
                        }
                    }
                },
            }
        }

        errors.into_result()
    }

    /// Walks up from `start` looking for `ancestor`.
    async fn is_descendant_or_self(&self, start: reviews::Model, ancestor: i32) -> AppResult<bool> {
        let mut current = start;
        let mut seen = HashSet::new();
        loop {
            if current.id == ancestor {
                return Ok(true);
            }
            if !seen.insert(current.id) {
                return Ok(false);
            }
            let Some(parent_id) = current.parent_id else {
                return Ok(false);
            };
            match reviews::Entity::find_by_id(parent_id).one(&self.db).await? {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    async fn check_movie(&self, movie_id: i32) -> AppResult<FieldErrors> {
        let mut errors = FieldErrors::new();
        if movie::Entity::find_by_id(movie_id).one(&self.db).await?.is_none() {
            errors.add("movie_id", format!("Movie {movie_id} does not exist."));
        }
        Ok(errors)
    }
}

/// Arranges a movie's reviews into threads, oldest first. A review whose
/// parent is not among `flat` is treated as a root.
pub fn build_review_tree(flat: Vec<reviews::Model>) -> Vec<ReviewNode> {
    let ids: HashSet<i32> = flat.iter().map(|r| r.id).collect();
    let mut by_parent: HashMap<Option<i32>, Vec<reviews::Model>> = HashMap::new();
    for review in flat {
        let parent = review.parent_id.filter(|p| ids.contains(p));
        by_parent.entry(parent).or_default().push(review);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|r| r.id);
    }
    attach_replies(None, &mut by_parent)
}

fn attach_replies(
    parent: Option<i32>,
    by_parent: &mut HashMap<Option<i32>, Vec<reviews::Model>>,
) -> Vec<ReviewNode> {
    let Some(children) = by_parent.remove(&parent) else {
        return Vec::new();
    };
    children
        .into_iter()
        .map(|review| {
            let replies = attach_replies(Some(review.id), by_parent);
            ReviewNode { review, replies }
        })
        .collect()
}
