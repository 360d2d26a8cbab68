use std::collections::BTreeSet;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Query,
};
use tracing::debug;

use super::{Catalog, delete_required, find_required, id_list, missing_ids, paginate};
use crate::{
    entities::{actor, category, genre, movie, movie_actors, movie_directors, movie_genres, movie_shots},
    error::{AppError, AppResult},
    models::{CleanMovie, MovieDetail, MovieFilter, MovieForm, Page, Pagination},
};

impl Catalog {
    pub async fn create_movie(&self, form: MovieForm) -> AppResult<MovieDetail> {
        let txn = self.db.begin().await?;
        let clean = validate_movie(&txn, &form, None).await?;

        let model = movie::ActiveModel {
            id: NotSet,
            title: Set(form.title.trim().to_string()),
            tagline: Set(form.tagline.clone()),
            description: Set(form.description.clone()),
            poster: Set(clean.poster),
            year: Set(form.year as i16),
            country: Set(form.country.trim().to_string()),
            world_premiere: Set(clean.world_premiere.to_string()),
            budget: Set(form.budget),
            fees_in_usa: Set(form.fees_in_usa),
            fees_in_world: Set(form.fees_in_world),
            category_id: Set(form.category_id),
            url: Set(form.url.clone()),
            draft: Set(form.draft),
        }
        .insert(&txn)
        .await?;

        replace_links(&txn, model.id, &form).await?;
        txn.commit().await?;

        debug!(movie_id = model.id, url = %model.url, "created movie");
        self.movie_detail(model.id).await
    }

    pub async fn get_movie(&self, id: i32) -> AppResult<movie::Model> {
        find_required::<movie::Entity, _>(&self.db, id, movie::VERBOSE_NAME).await
    }

    pub async fn movie_by_url(&self, url: &str) -> AppResult<movie::Model> {
        movie::Entity::find()
            .filter(movie::Column::Url.eq(url))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found(movie::VERBOSE_NAME, url))
    }

    /// The movie with everything that hangs off it.
    pub async fn movie_detail(&self, id: i32) -> AppResult<MovieDetail> {
        let movie = self.get_movie(id).await?;
        self.expand_movie(movie).await
    }

    pub async fn expand_movie(&self, movie: movie::Model) -> AppResult<MovieDetail> {
        let category = movie.find_related(category::Entity).one(&self.db).await?;
        let directors = movie
            .find_linked(movie::Directors)
            .order_by_asc(actor::Column::Name)
            .all(&self.db)
            .await?;
        let actors =
            movie.find_linked(movie::Cast).order_by_asc(actor::Column::Name).all(&self.db).await?;
        let genres =
            movie.find_related(genre::Entity).order_by_asc(genre::Column::Name).all(&self.db).await?;
        let shots = movie
            .find_related(movie_shots::Entity)
            .order_by_asc(movie_shots::Column::Id)
            .all(&self.db)
            .await?;
        let rating = self.rating_summary(movie.id).await?;
        let reviews = self.review_tree(movie.id).await?;

        Ok(MovieDetail { movie, category, directors, actors, genres, shots, rating, reviews })
    }

    pub async fn list_movies(
        &self,
        filter: MovieFilter,
        pagination: Pagination,
    ) -> AppResult<Page<movie::Model>> {
        let mut select = movie::Entity::find();
        if !filter.include_drafts {
            select = select.filter(movie::Column::Draft.eq(false));
        }
        if let Some(category_id) = filter.category {
            select = select.filter(movie::Column::CategoryId.eq(category_id));
        }
        if let Some(year) = filter.year {
            select = select.filter(movie::Column::Year.eq(year));
        }
        if let Some(genre_id) = filter.genre {
            select = select.filter(
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_genres::Column::MovieId)
                        .from(movie_genres::Entity)
                        .and_where(movie_genres::Column::GenreId.eq(genre_id))
                        .to_owned(),
                ),
            );
        }
        let select = select.order_by_desc(movie::Column::Year).order_by_asc(movie::Column::Title);
        paginate(&self.db, select, pagination).await
    }

    pub async fn update_movie(&self, id: i32, form: MovieForm) -> AppResult<MovieDetail> {
        let txn = self.db.begin().await?;
        let existing = find_required::<movie::Entity, _>(&txn, id, movie::VERBOSE_NAME).await?;
        let clean = validate_movie(&txn, &form, Some(id)).await?;

        let mut active: movie::ActiveModel = existing.into();
        active.title = Set(form.title.trim().to_string());
        active.tagline = Set(form.tagline.clone());
        active.description = Set(form.description.clone());
        active.poster = Set(clean.poster);
        active.year = Set(form.year as i16);
        active.country = Set(form.country.trim().to_string());
        active.world_premiere = Set(clean.world_premiere.to_string());
        active.budget = Set(form.budget);
        active.fees_in_usa = Set(form.fees_in_usa);
        active.fees_in_world = Set(form.fees_in_world);
        active.category_id = Set(form.category_id);
        active.url = Set(form.url.clone());
        active.draft = Set(form.draft);
        active.update(&txn).await?;

        replace_links(&txn, id, &form).await?;
        txn.commit().await?;

        debug!(movie_id = id, "updated movie");
        self.movie_detail(id).await
    }

    /// Stills, ratings, reviews and cast links go with the movie.
    pub async fn delete_movie(&self, id: i32) -> AppResult<()> {
        delete_required::<movie::Entity, _>(&self.db, id, movie::VERBOSE_NAME).await?;
        debug!(movie_id = id, "deleted movie");
        Ok(())
    }

    pub async fn movies_directed_by(&self, actor_id: i32) -> AppResult<Vec<movie::Model>> {
        let person = self.get_actor(actor_id).await?;
        Ok(person.find_linked(actor::DirectedMovies).all(&self.db).await?)
    }

    pub async fn movies_starring(&self, actor_id: i32) -> AppResult<Vec<movie::Model>> {
        let person = self.get_actor(actor_id).await?;
        Ok(person.find_linked(actor::ActedMovies).all(&self.db).await?)
    }
}

async fn validate_movie<C>(db: &C, form: &MovieForm, id: Option<i32>) -> AppResult<CleanMovie>
where
    C: ConnectionTrait,
{
    let today = jiff::Zoned::now().date();
    let (mut errors, clean) = form.validate(today);

    if let Some(category_id) = form.category_id {
        if category::Entity::find_by_id(category_id).one(db).await?.is_none() {
            errors.add("category_id", format!("Category {category_id} does not exist."));
        }
    }

    let mut conflict = movie::Entity::find().filter(movie::Column::Url.eq(form.url.as_str()));
    if let Some(id) = id {
        conflict = conflict.filter(movie::Column::Id.ne(id));
    }
    if !form.url.is_empty() && conflict.count(db).await? > 0 {
        errors.add("url", "Movie with this url already exists.");
    }

    for (field, ids) in [("directors", &form.directors), ("actors", &form.actors)] {
        let wanted: BTreeSet<i32> = ids.iter().copied().collect();
        let missing = missing_ids::<actor::Entity, _>(db, actor::Column::Id, &wanted).await?;
        if !missing.is_empty() {
            errors.add(field, format!("Unknown actor id(s): {}.", id_list(&missing)));
        }
    }

    let wanted: BTreeSet<i32> = form.genres.iter().copied().collect();
    let missing = missing_ids::<genre::Entity, _>(db, genre::Column::Id, &wanted).await?;
    if !missing.is_empty() {
        errors.add("genres", format!("Unknown genre id(s): {}.", id_list(&missing)));
    }

    errors.into_result()?;
    Ok(clean)
}

async fn replace_links<C>(db: &C, movie_id: i32, form: &MovieForm) -> AppResult<()>
where
    C: ConnectionTrait,
{
    movie_directors::Entity::delete_many()
        .filter(movie_directors::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;
    movie_actors::Entity::delete_many()
        .filter(movie_actors::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;
    movie_genres::Entity::delete_many()
        .filter(movie_genres::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;

    let directors: BTreeSet<i32> = form.directors.iter().copied().collect();
    if !directors.is_empty() {
        movie_directors::Entity::insert_many(directors.into_iter().map(|actor_id| {
            movie_directors::ActiveModel { movie_id: Set(movie_id), actor_id: Set(actor_id) }
        }))
        .exec_without_returning(db)
        .await?;
    }

    let cast: BTreeSet<i32> = form.actors.iter().copied().collect();
    if !cast.is_empty() {
        movie_actors::Entity::insert_many(cast.into_iter().map(|actor_id| {
            movie_actors::ActiveModel { movie_id: Set(movie_id), actor_id: Set(actor_id) }
        }))
        .exec_without_returning(db)
        .await?;
    }

    let genres: BTreeSet<i32> = form.genres.iter().copied().collect();
    if !genres.is_empty() {
        movie_genres::Entity::insert_many(genres.into_iter().map(|genre_id| {
            movie_genres::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) }
        }))
        .exec_without_returning(db)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::fixtures,
        entities::{rating, reviews},
        models::{RatingForm, ReviewForm, ShotForm},
        validation::UINT_MAX,
    };

    fn page() -> Pagination {
        Pagination { page: 1, per_page: 50 }
    }

    #[tokio::test]
    async fn duplicate_movie_url_fails_validation() {
        let catalog = fixtures::catalog().await;
        fixtures::movie(&catalog, "inception").await;

        let err = catalog.create_movie(fixtures::movie_form("inception")).await.unwrap_err();
        let AppError::Validation(errors) = err else { panic!("expected validation error") };
        assert_eq!(errors.get("url").unwrap(), ["Movie with this url already exists."]);
    }

    #[tokio::test]
    async fn money_fields_must_be_non_negative() {
        let catalog = fixtures::catalog().await;
        let form = MovieForm {
            budget: -5,
            fees_in_usa: -1,
            fees_in_world: UINT_MAX + 1,
            ..fixtures::movie_form("tenet")
        };
        let AppError::Validation(errors) = catalog.create_movie(form).await.unwrap_err() else {
            panic!("expected validation error");
        };
        for field in ["budget", "fees_in_usa", "fees_in_world"] {
            assert!(errors.contains(field));
        }
        assert_eq!(catalog.list_movies(MovieFilter::default(), page()).await.unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn directors_and_cast_are_separate_roles() {
        let catalog = fixtures::catalog().await;
        let nolan = fixtures::actor(&catalog, "Christopher Nolan").await;
        let leo = fixtures::actor(&catalog, "Leonardo DiCaprio").await;
        let scifi = fixtures::genre(&catalog, "sci-fi").await;

        let detail = catalog
            .create_movie(MovieForm {
                directors: vec![nolan.id],
                actors: vec![leo.id, leo.id],
                genres: vec![scifi.id],
                ..fixtures::movie_form("inception")
            })
            .await
            .unwrap();

        assert_eq!(detail.directors, vec![nolan.clone()]);
        assert_eq!(detail.actors, vec![leo.clone()]);
        assert_eq!(detail.genres, vec![scifi]);
        assert_eq!(detail.movie.world_premiere, "2010-07-16");
        assert_eq!(detail.movie.poster, "movies/inception.jpg");

        assert_eq!(catalog.movies_directed_by(nolan.id).await.unwrap().len(), 1);
        assert!(catalog.movies_starring(nolan.id).await.unwrap().is_empty());
        assert_eq!(catalog.movies_starring(leo.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_links_are_reported_per_field() {
        let catalog = fixtures::catalog().await;
        let form = MovieForm {
            directors: vec![7],
            genres: vec![8, 9],
            category_id: Some(3),
            ..fixtures::movie_form("memento")
        };
        let AppError::Validation(errors) = catalog.create_movie(form).await.unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("directors").unwrap(), ["Unknown actor id(s): 7."]);
        assert_eq!(errors.get("genres").unwrap(), ["Unknown genre id(s): 8, 9."]);
        assert!(errors.contains("category_id"));
        assert!(!errors.contains("actors"));
    }

    #[tokio::test]
    async fn update_replaces_links_and_keeps_own_url() {
        let catalog = fixtures::catalog().await;
        let a = fixtures::actor(&catalog, "A").await;
        let b = fixtures::actor(&catalog, "B").await;
        let created = catalog
            .create_movie(MovieForm { actors: vec![a.id], ..fixtures::movie_form("heat") })
            .await
            .unwrap();

        let updated = catalog
            .update_movie(
                created.movie.id,
                MovieForm { actors: vec![b.id], draft: true, ..fixtures::movie_form("heat") },
            )
            .await
            .unwrap();
        assert_eq!(updated.actors, vec![b]);
        assert!(updated.movie.draft);
    }

    #[tokio::test]
    async fn deleting_category_nulls_movie_category() {
        let catalog = fixtures::catalog().await;
        let films = fixtures::category(&catalog, "films").await;
        let created = catalog
            .create_movie(MovieForm { category_id: Some(films.id), ..fixtures::movie_form("alien") })
            .await
            .unwrap();
        assert_eq!(created.category.as_ref().map(|c| c.id), Some(films.id));

        catalog.delete_category(films.id).await.unwrap();

        let movie = catalog.get_movie(created.movie.id).await.unwrap();
        assert_eq!(movie.category_id, None);
    }

    #[tokio::test]
    async fn deleting_movie_cascades_to_dependents() {
        let catalog = fixtures::catalog().await;
        let movie = fixtures::movie(&catalog, "inception").await;
        let star = fixtures::star(&catalog, 5).await;
        let nolan = fixtures::actor(&catalog, "Christopher Nolan").await;
        catalog
            .update_movie(movie.id, MovieForm { directors: vec![nolan.id], ..fixtures::movie_form("inception") })
            .await
            .unwrap();

        catalog
            .create_shot(ShotForm {
                title: "Top".into(),
                description: "Spinning".into(),
                image: "top.jpg".into(),
                movie_id: movie.id,
            })
            .await
            .unwrap();
        catalog
            .create_rating(RatingForm { ip: "10.0.0.1".into(), star_id: star.id, movie_id: movie.id })
            .await
            .unwrap();
        let root = catalog
            .create_review(ReviewForm {
                email: "a@example.com".into(),
                name: "Ann".into(),
                text: "Great".into(),
                parent_id: None,
                movie_id: movie.id,
            })
            .await
            .unwrap();
        catalog
            .create_review(ReviewForm {
                email: "b@example.com".into(),
                name: "Bob".into(),
                text: "Agreed".into(),
                parent_id: Some(root.id),
                movie_id: movie.id,
            })
            .await
            .unwrap();

        catalog.delete_movie(movie.id).await.unwrap();

        let db = catalog.db();
        assert_eq!(movie_shots::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(rating::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(reviews::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(movie_directors::Entity::find().count(db).await.unwrap(), 0);
        // reference data survives
        assert!(catalog.get_rating_star(star.id).await.is_ok());
        assert!(catalog.get_actor(nolan.id).await.is_ok());
    }

    #[tokio::test]
    async fn list_hides_drafts_and_filters() {
        let catalog = fixtures::catalog().await;
        let drama = fixtures::genre(&catalog, "drama").await;
        let films = fixtures::category(&catalog, "films").await;
        catalog
            .create_movie(MovieForm {
                genres: vec![drama.id],
                category_id: Some(films.id),
                year: 1995,
                ..fixtures::movie_form("heat")
            })
            .await
            .unwrap();
        fixtures::movie(&catalog, "tenet").await;
        catalog
            .create_movie(MovieForm { draft: true, ..fixtures::movie_form("draft-cut") })
            .await
            .unwrap();

        let published = catalog.list_movies(MovieFilter::default(), page()).await.unwrap();
        assert_eq!(published.total_items, 2);

        let all = catalog
            .list_movies(MovieFilter { include_drafts: true, ..MovieFilter::default() }, page())
            .await
            .unwrap();
        assert_eq!(all.total_items, 3);

        let by_genre = catalog
            .list_movies(MovieFilter { genre: Some(drama.id), ..MovieFilter::default() }, page())
            .await
            .unwrap();
        assert_eq!(by_genre.items.iter().map(|m| m.url.as_str()).collect::<Vec<_>>(), ["heat"]);

        let by_category_and_year = catalog
            .list_movies(
                MovieFilter { category: Some(films.id), year: Some(1995), ..MovieFilter::default() },
                page(),
            )
            .await
            .unwrap();
        assert_eq!(by_category_and_year.total_items, 1);
    }

    #[tokio::test]
    async fn movie_by_url_reports_missing_slug() {
        let catalog = fixtures::catalog().await;
        fixtures::movie(&catalog, "inception").await;
        assert_eq!(catalog.movie_by_url("inception").await.unwrap().title, "Movie inception");
        assert!(matches!(catalog.movie_by_url("nope").await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn genres_and_movies_resolve_through_join_table() {
        let catalog = fixtures::catalog().await;
        let drama = fixtures::genre(&catalog, "drama").await;
        let heat = catalog
            .create_movie(MovieForm { genres: vec![drama.id], ..fixtures::movie_form("heat") })
            .await
            .unwrap()
            .movie;

        let movies = drama.find_related(movie::Entity).all(catalog.db()).await.unwrap();
        assert_eq!(movies, vec![heat.clone()]);
        let genres = heat.find_related(genre::Entity).all(catalog.db()).await.unwrap();
        assert_eq!(genres, vec![drama]);
    }
}
