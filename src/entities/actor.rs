//! Actors and directors share one table; the role is decided by which
//! join table links them to a movie.

use std::fmt;

use sea_orm::entity::prelude::*;
use serde::Serialize;

pub const VERBOSE_NAME: &str = "actor or director";
pub const UPLOAD_TO: &str = "actors/";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "actor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub age: i16,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub image: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movie_directors::Entity")]
    MovieDirectors,
    #[sea_orm(has_many = "super::movie_actors::Entity")]
    MovieActors,
}

impl Related<super::movie_directors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieDirectors.def()
    }
}

impl Related<super::movie_actors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MovieActors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Movies this person directed.
pub struct DirectedMovies;

impl Linked for DirectedMovies {
    type FromEntity = Entity;
    type ToEntity = super::movie::Entity;

    fn link(&self) -> Vec<RelationDef> {
        vec![
            super::movie_directors::Relation::Actor.def().rev(),
            super::movie_directors::Relation::Movie.def(),
        ]
    }
}

/// Movies this person appears in.
pub struct ActedMovies;

impl Linked for ActedMovies {
    type FromEntity = Entity;
    type ToEntity = super::movie::Entity;

    fn link(&self) -> Vec<RelationDef> {
        vec![
            super::movie_actors::Relation::Actor.def().rev(),
            super::movie_actors::Relation::Movie.def(),
        ]
    }
}
