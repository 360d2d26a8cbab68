//! Reference data: categories, actors, genres and rating stars.

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use super::{Catalog, delete_required, find_required, paginate};
use crate::{
    entities::{actor, category, genre, rating_star},
    error::AppResult,
    models::{ActorForm, CategoryForm, GenreForm, Page, Pagination, RatingStarForm},
    validation::FieldErrors,
};

impl Catalog {
    pub async fn create_category(&self, form: CategoryForm) -> AppResult<category::Model> {
        form.validate().into_result()?;
        let model = category::ActiveModel {
            id: NotSet,
            name: Set(form.name.trim().to_string()),
            description: Set(form.description),
            url: Set(form.url),
        }
        .insert(&self.db)
        .await?;
        debug!(category_id = model.id, url = %model.url, "created category");
        Ok(model)
    }

    pub async fn get_category(&self, id: i32) -> AppResult<category::Model> {
        find_required::<category::Entity, _>(&self.db, id, category::VERBOSE_NAME).await
    }

    /// Category urls are not unique; the lowest id wins.
    pub async fn category_by_url(&self, url: &str) -> AppResult<Option<category::Model>> {
        Ok(category::Entity::find()
            .filter(category::Column::Url.eq(url))
            .order_by_asc(category::Column::Id)
            .one(&self.db)
            .await?)
    }

    pub async fn list_categories(&self, pagination: Pagination) -> AppResult<Page<category::Model>> {
        paginate(&self.db, category::Entity::find().order_by_asc(category::Column::Name), pagination)
            .await
    }

    pub async fn all_categories(&self) -> AppResult<Vec<category::Model>> {
        Ok(category::Entity::find().order_by_asc(category::Column::Name).all(&self.db).await?)
    }

    pub async fn update_category(&self, id: i32, form: CategoryForm) -> AppResult<category::Model> {
        let existing = self.get_category(id).await?;
        form.validate().into_result()?;
        let mut active: category::ActiveModel = existing.into();
        active.name = Set(form.name.trim().to_string());
        active.description = Set(form.description);
        active.url = Set(form.url);
        Ok(active.update(&self.db).await?)
    }

    /// Movies in the category keep existing with no category.
    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        delete_required::<category::Entity, _>(&self.db, id, category::VERBOSE_NAME).await?;
        debug!(category_id = id, "deleted category");
        Ok(())
    }

    pub async fn create_actor(&self, form: ActorForm) -> AppResult<actor::Model> {
        let (errors, image) = form.validate();
        errors.into_result()?;
        let model = actor::ActiveModel {
            id: NotSet,
            name: Set(form.name.trim().to_string()),
            age: Set(form.age as i16),
            description: Set(form.description),
            image: Set(image),
        }
        .insert(&self.db)
        .await?;
        debug!(actor_id = model.id, "created actor");
        Ok(model)
    }

    pub async fn get_actor(&self, id: i32) -> AppResult<actor::Model> {
        find_required::<actor::Entity, _>(&self.db, id, actor::VERBOSE_NAME).await
    }

    pub async fn list_actors(&self, pagination: Pagination) -> AppResult<Page<actor::Model>> {
        paginate(&self.db, actor::Entity::find().order_by_asc(actor::Column::Name), pagination).await
    }

    pub async fn update_actor(&self, id: i32, form: ActorForm) -> AppResult<actor::Model> {
        let existing = self.get_actor(id).await?;
        let (errors, image) = form.validate();
        errors.into_result()?;
        let mut active: actor::ActiveModel = existing.into();
        active.name = Set(form.name.trim().to_string());
        active.age = Set(form.age as i16);
        active.description = Set(form.description);
        active.image = Set(image);
        Ok(active.update(&self.db).await?)
    }

    /// Also drops the actor from every movie's directors and cast.
    pub async fn delete_actor(&self, id: i32) -> AppResult<()> {
        delete_required::<actor::Entity, _>(&self.db, id, actor::VERBOSE_NAME).await?;
        debug!(actor_id = id, "deleted actor");
        Ok(())
    }

    pub async fn create_genre(&self, form: GenreForm) -> AppResult<genre::Model> {
        let mut errors = form.validate();
        errors.merge(self.genre_url_conflict(&form.url, None).await?);
        errors.into_result()?;
        let model = genre::ActiveModel {
            id: NotSet,
            name: Set(form.name.trim().to_string()),
            description: Set(form.description),
            url: Set(form.url),
        }
        .insert(&self.db)
        .await?;
        debug!(genre_id = model.id, url = %model.url, "created genre");
        Ok(model)
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<genre::Model> {
        find_required::<genre::Entity, _>(&self.db, id, genre::VERBOSE_NAME).await
    }

    pub async fn genre_by_url(&self, url: &str) -> AppResult<Option<genre::Model>> {
        Ok(genre::Entity::find().filter(genre::Column::Url.eq(url)).one(&self.db).await?)
    }

    pub async fn list_genres(&self, pagination: Pagination) -> AppResult<Page<genre::Model>> {
        paginate(&self.db, genre::Entity::find().order_by_asc(genre::Column::Name), pagination).await
    }

    pub async fn all_genres(&self) -> AppResult<Vec<genre::Model>> {
        Ok(genre::Entity::find().order_by_asc(genre::Column::Name).all(&self.db).await?)
    }

    pub async fn update_genre(&self, id: i32, form: GenreForm) -> AppResult<genre::Model> {
        let existing = self.get_genre(id).await?;
        let mut errors = form.validate();
        errors.merge(self.genre_url_conflict(&form.url, Some(id)).await?);
        errors.into_result()?;
        let mut active: genre::ActiveModel = existing.into();
        active.name = Set(form.name.trim().to_string());
        active.description = Set(form.description);
        active.url = Set(form.url);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        delete_required::<genre::Entity, _>(&self.db, id, genre::VERBOSE_NAME).await?;
        debug!(genre_id = id, "deleted genre");
        Ok(())
    }

    async fn genre_url_conflict(&self, url: &str, exclude: Option<i32>) -> AppResult<FieldErrors> {
        let mut query = genre::Entity::find().filter(genre::Column::Url.eq(url));
        if let Some(id) = exclude {
            query = query.filter(genre::Column::Id.ne(id));
        }
        let mut errors = FieldErrors::new();
        if query.count(&self.db).await? > 0 {
            errors.add("url", "Genre with this url already exists.");
        }
        Ok(errors)
    }

    pub async fn create_rating_star(&self, form: RatingStarForm) -> AppResult<rating_star::Model> {
        form.validate().into_result()?;
        let model = rating_star::ActiveModel { id: NotSet, value: Set(form.value as i16) }
            .insert(&self.db)
            .await?;
        debug!(star_id = model.id, value = model.value, "created rating star");
        Ok(model)
    }

    pub async fn get_rating_star(&self, id: i32) -> AppResult<rating_star::Model> {
        find_required::<rating_star::Entity, _>(&self.db, id, rating_star::VERBOSE_NAME).await
    }

    pub async fn list_rating_stars(
        &self,
        pagination: Pagination,
    ) -> AppResult<Page<rating_star::Model>> {
        paginate(
            &self.db,
            rating_star::Entity::find().order_by_desc(rating_star::Column::Value),
            pagination,
        )
        .await
    }

    pub async fn update_rating_star(
        &self,
        id: i32,
        form: RatingStarForm,
    ) -> AppResult<rating_star::Model> {
        let existing = self.get_rating_star(id).await?;
        form.validate().into_result()?;
        let mut active: rating_star::ActiveModel = existing.into();
        active.value = Set(form.value as i16);
        Ok(active.update(&self.db).await?)
    }

    /// Removes every rating cast with this star.
    pub async fn delete_rating_star(&self, id: i32) -> AppResult<()> {
        delete_required::<rating_star::Entity, _>(&self.db, id, rating_star::VERBOSE_NAME).await?;
        debug!(star_id = id, "deleted rating star");
        Ok(())
    }
}
