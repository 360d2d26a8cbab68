//! Catalog operations over the sea-orm entities.
//!
//! `Catalog` is the only component that touches the database. Every write
//! validates the full payload first and reports all field errors together;
//! referential rules (cascade and null-on-delete) are enforced by the
//! schema's foreign keys.

mod feedback;
mod movies;
mod reference;

use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    PrimaryKeyTrait, QueryFilter, QuerySelect, Select,
};

use crate::{
    error::{AppError, AppResult},
    models::{Page, Pagination},
};

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

async fn find_required<E, C>(db: &C, id: i32, entity: &'static str) -> AppResult<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id).one(db).await?.ok_or_else(|| AppError::not_found(entity, id))
}

async fn delete_required<E, C>(db: &C, id: i32, entity: &'static str) -> AppResult<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let res = E::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(AppError::not_found(entity, id));
    }
    Ok(())
}

async fn paginate<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    pagination: Pagination,
) -> AppResult<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, pagination.per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = if pagination.page > totals.number_of_pages {
        Vec::new()
    } else {
        paginator.fetch_page(pagination.page - 1).await?
    };
    Ok(Page {
        items,
        page: pagination.page,
        per_page: pagination.per_page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// Ids from `wanted` with no row in `E`, in ascending order.
async fn missing_ids<E, C>(db: &C, id_column: E::Column, wanted: &BTreeSet<i32>) -> AppResult<Vec<i32>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    let found: BTreeSet<i32> = E::find()
        .select_only()
        .column(id_column)
        .filter(id_column.is_in(wanted.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    Ok(wanted.difference(&found).copied().collect())
}

fn id_list(ids: &[i32]) -> String {
    ids.iter().map(i32::to_string).collect::<Vec<_>>().join(", ")
}
