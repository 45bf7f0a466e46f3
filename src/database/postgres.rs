use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    AssociationRow, Benefit, BenefitInput, BenefitRow, Category, CategoryInput, Child, ChildInput, FilterRow,
};
use super::store::{AssociationStore, BenefitStore, CategoryStore, ChildStore, FilterStore, Store, StoreResult};
use crate::filter::{
    Association, FilterAssignment, FilterDefinition, FilterDefinitionInput, FilterValue, OwnerKind, Window,
};

const FILTER_COLUMNS: &str = "id, name, hint, filter_type, allowed_values";
const BENEFIT_COLUMNS: &str = "id, title, content, bonus, video_url, source_url";
const CHILD_COLUMNS: &str = "id, first_name, last_name, birth_date, user_id, created_at";

/// Postgres-backed store over a sqlx pool
#[derive(Clone)]
pub struct PgStore {
    db: DatabaseManager,
}

impl PgStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }

    fn pool(&self) -> &PgPool {
        self.db.pool()
    }
}

/// `LIMIT NULL` is unlimited in Postgres
fn limit_param(window: Window) -> Option<i64> {
    (window.limit > 0).then_some(window.limit as i64)
}

fn select_associations(kind: OwnerKind) -> String {
    format!(
        "SELECT id, {owner} AS owner_id, filter_id, value, range_from, range_to FROM {table}",
        owner = kind.owner_column(),
        table = kind.table()
    )
}

async fn insert_association(
    conn: &mut PgConnection,
    kind: OwnerKind,
    owner_id: i64,
    filter_id: i64,
    value: &FilterValue,
) -> StoreResult<Association> {
    let sql = format!(
        "INSERT INTO {table} ({owner}, filter_id, value, range_from, range_to) VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, {owner} AS owner_id, filter_id, value, range_from, range_to",
        owner = kind.owner_column(),
        table = kind.table()
    );
    let row = sqlx::query_as::<_, AssociationRow>(&sql)
        .bind(owner_id)
        .bind(filter_id)
        .bind(&value.value)
        .bind(&value.from)
        .bind(&value.to)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.into())
}

async fn delete_associations(conn: &mut PgConnection, kind: OwnerKind, owner_id: i64) -> StoreResult<u64> {
    let sql = format!("DELETE FROM {} WHERE {} = $1", kind.table(), kind.owner_column());
    let result = sqlx::query(&sql).bind(owner_id).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

async fn replace_associations(
    conn: &mut PgConnection,
    kind: OwnerKind,
    owner_id: i64,
    assignments: &[FilterAssignment],
) -> StoreResult<Vec<Association>> {
    delete_associations(conn, kind, owner_id).await?;
    let mut created = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        created.push(insert_association(conn, kind, owner_id, assignment.filter_id, &assignment.value).await?);
    }
    Ok(created)
}

async fn set_benefit_categories(conn: &mut PgConnection, benefit_id: i64, categories: &[i64]) -> StoreResult<()> {
    sqlx::query("DELETE FROM benefit_categories WHERE benefit_id = $1")
        .bind(benefit_id)
        .execute(&mut *conn)
        .await?;
    for category_id in categories {
        sqlx::query("INSERT INTO benefit_categories (benefit_id, category_id) VALUES ($1, $2)")
            .bind(benefit_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
struct BenefitCategoryRow {
    benefit_id: i64,
    id: i64,
    name: String,
    description: Option<String>,
}

impl PgStore {
    /// Attach filters and categories to a set of benefit rows with two queries
    async fn hydrate(&self, rows: Vec<BenefitRow>) -> StoreResult<Vec<Benefit>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let sql = format!("{} WHERE benefit_id = ANY($1) ORDER BY id", select_associations(OwnerKind::Benefit));
        let mut filters: HashMap<i64, Vec<Association>> = HashMap::new();
        for row in sqlx::query_as::<_, AssociationRow>(&sql)
            .bind(&ids)
            .fetch_all(self.pool())
            .await?
        {
            filters.entry(row.owner_id).or_default().push(row.into());
        }

        let mut categories: HashMap<i64, Vec<Category>> = HashMap::new();
        for row in sqlx::query_as::<_, BenefitCategoryRow>(
            "SELECT bc.benefit_id, c.id, c.name, c.description FROM benefit_categories bc \
             JOIN categories c ON c.id = bc.category_id WHERE bc.benefit_id = ANY($1) ORDER BY c.id",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await?
        {
            categories.entry(row.benefit_id).or_default().push(Category {
                id: row.id,
                name: row.name,
                description: row.description,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_benefit(
                    filters.remove(&id).unwrap_or_default(),
                    categories.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }
}

#[async_trait]
impl FilterStore for PgStore {
    async fn create_filter(&self, input: &FilterDefinitionInput) -> StoreResult<FilterDefinition> {
        let sql = format!(
            "INSERT INTO filters (name, hint, filter_type, allowed_values) VALUES ($1, $2, $3, $4) RETURNING {}",
            FILTER_COLUMNS
        );
        let row = sqlx::query_as::<_, FilterRow>(&sql)
            .bind(&input.name)
            .bind(&input.hint)
            .bind(input.filter_type.as_str())
            .bind(Json(&input.values))
            .fetch_one(self.pool())
            .await?;
        row.try_into()
    }

    async fn get_filter(&self, id: i64) -> StoreResult<FilterDefinition> {
        let sql = format!("SELECT {} FROM filters WHERE id = $1", FILTER_COLUMNS);
        sqlx::query_as::<_, FilterRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("filter {}", id)))?
            .try_into()
    }

    async fn list_filters(&self, search: Option<&str>) -> StoreResult<Vec<FilterDefinition>> {
        let search = search.filter(|s| !s.is_empty());
        // strpos keeps the match case-sensitive and free of LIKE wildcards
        let sql = format!(
            "SELECT {} FROM filters WHERE $1::text IS NULL OR strpos(name, $1) > 0 ORDER BY id",
            FILTER_COLUMNS
        );
        sqlx::query_as::<_, FilterRow>(&sql)
            .bind(search)
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .map(FilterDefinition::try_from)
            .collect()
    }

    async fn update_filter(&self, id: i64, input: &FilterDefinitionInput) -> StoreResult<FilterDefinition> {
        let sql = format!(
            "UPDATE filters SET name = $2, hint = $3, filter_type = $4, allowed_values = $5 WHERE id = $1 RETURNING {}",
            FILTER_COLUMNS
        );
        sqlx::query_as::<_, FilterRow>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(&input.hint)
            .bind(input.filter_type.as_str())
            .bind(Json(&input.values))
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("filter {}", id)))?
            .try_into()
    }

    async fn delete_filter(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        for kind in OwnerKind::ALL {
            let sql = format!("DELETE FROM {} WHERE filter_id = $1", kind.table());
            sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        }
        let result = sqlx::query("DELETE FROM filters WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("filter {}", id)));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AssociationStore for PgStore {
    async fn get_association(&self, kind: OwnerKind, owner_id: i64, filter_id: i64) -> StoreResult<Association> {
        let sql = format!(
            "{} WHERE {} = $1 AND filter_id = $2",
            select_associations(kind),
            kind.owner_column()
        );
        sqlx::query_as::<_, AssociationRow>(&sql)
            .bind(owner_id)
            .bind(filter_id)
            .fetch_optional(self.pool())
            .await?
            .map(Association::from)
            .ok_or_else(|| DatabaseError::not_found(format!("{} {} filter {}", kind, owner_id, filter_id)))
    }

    async fn list_associations(&self, kind: OwnerKind, owner_id: i64) -> StoreResult<Vec<Association>> {
        let sql = format!("{} WHERE {} = $1 ORDER BY id", select_associations(kind), kind.owner_column());
        let rows = sqlx::query_as::<_, AssociationRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(Association::from).collect())
    }

    async fn create_association(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> StoreResult<Association> {
        let mut conn = self.pool().acquire().await?;
        insert_association(&mut conn, kind, owner_id, filter_id, value).await
    }

    async fn update_association(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> StoreResult<Association> {
        let sql = format!(
            "UPDATE {table} SET value = $3, range_from = $4, range_to = $5 WHERE {owner} = $1 AND filter_id = $2 \
             RETURNING id, {owner} AS owner_id, filter_id, value, range_from, range_to",
            owner = kind.owner_column(),
            table = kind.table()
        );
        sqlx::query_as::<_, AssociationRow>(&sql)
            .bind(owner_id)
            .bind(filter_id)
            .bind(&value.value)
            .bind(&value.from)
            .bind(&value.to)
            .fetch_optional(self.pool())
            .await?
            .map(Association::from)
            .ok_or_else(|| DatabaseError::not_found(format!("{} {} filter {}", kind, owner_id, filter_id)))
    }

    async fn replace_all(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        assignments: &[FilterAssignment],
    ) -> StoreResult<Vec<Association>> {
        let mut tx = self.pool().begin().await?;
        let created = replace_associations(&mut tx, kind, owner_id, assignments).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn delete_all(&self, kind: OwnerKind, owner_id: i64) -> StoreResult<u64> {
        let mut conn = self.pool().acquire().await?;
        delete_associations(&mut conn, kind, owner_id).await
    }
}

#[async_trait]
impl BenefitStore for PgStore {
    async fn create_benefit(&self, input: &BenefitInput) -> StoreResult<Benefit> {
        let mut tx = self.pool().begin().await?;
        let sql = format!(
            "INSERT INTO benefits (title, content, bonus, video_url, source_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            BENEFIT_COLUMNS
        );
        let row = sqlx::query_as::<_, BenefitRow>(&sql)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.bonus)
            .bind(&input.video_url)
            .bind(&input.source_url)
            .fetch_one(&mut *tx)
            .await?;
        replace_associations(&mut tx, OwnerKind::Benefit, row.id, &input.filters).await?;
        if let Some(categories) = &input.categories {
            set_benefit_categories(&mut tx, row.id, categories).await?;
        }
        tx.commit().await?;

        self.get_benefit(row.id).await
    }

    async fn get_benefit(&self, id: i64) -> StoreResult<Benefit> {
        let sql = format!("SELECT {} FROM benefits WHERE id = $1", BENEFIT_COLUMNS);
        let row = sqlx::query_as::<_, BenefitRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("benefit {}", id)))?;
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| DatabaseError::not_found(format!("benefit {}", id)))
    }

    async fn list_benefits(&self) -> StoreResult<Vec<Benefit>> {
        let sql = format!("SELECT {} FROM benefits ORDER BY id", BENEFIT_COLUMNS);
        let rows = sqlx::query_as::<_, BenefitRow>(&sql).fetch_all(self.pool()).await?;
        self.hydrate(rows).await
    }

    async fn update_benefit(&self, id: i64, input: &BenefitInput) -> StoreResult<Benefit> {
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            "UPDATE benefits SET title = $2, content = $3, bonus = $4, video_url = $5, source_url = $6 WHERE id = $1",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.bonus)
        .bind(&input.video_url)
        .bind(&input.source_url)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("benefit {}", id)));
        }
        replace_associations(&mut tx, OwnerKind::Benefit, id, &input.filters).await?;
        if let Some(categories) = &input.categories {
            set_benefit_categories(&mut tx, id, categories).await?;
        }
        tx.commit().await?;

        self.get_benefit(id).await
    }

    async fn delete_benefit(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        delete_associations(&mut tx, OwnerKind::Benefit, id).await?;
        set_benefit_categories(&mut tx, id, &[]).await?;
        let result = sqlx::query("DELETE FROM benefits WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("benefit {}", id)));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ChildStore for PgStore {
    async fn create_child(&self, user_id: i64, input: &ChildInput) -> StoreResult<Child> {
        let sql = format!(
            "INSERT INTO children (first_name, last_name, birth_date, user_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            CHILD_COLUMNS
        );
        let child = sqlx::query_as::<_, Child>(&sql)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.birth_date)
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;
        Ok(child)
    }

    async fn get_child(&self, id: i64) -> StoreResult<Child> {
        let sql = format!("SELECT {} FROM children WHERE id = $1", CHILD_COLUMNS);
        sqlx::query_as::<_, Child>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("child {}", id)))
    }

    async fn list_children(&self, user_id: i64, window: Window) -> StoreResult<(Vec<Child>, usize)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM children WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await?;
        let sql = format!(
            "SELECT {} FROM children WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            CHILD_COLUMNS
        );
        let children = sqlx::query_as::<_, Child>(&sql)
            .bind(user_id)
            .bind(limit_param(window))
            .bind(window.offset as i64)
            .fetch_all(self.pool())
            .await?;
        Ok((children, total as usize))
    }

    async fn update_child(&self, id: i64, input: &ChildInput) -> StoreResult<Child> {
        let sql = format!(
            "UPDATE children SET first_name = $2, last_name = $3, birth_date = $4 WHERE id = $1 RETURNING {}",
            CHILD_COLUMNS
        );
        sqlx::query_as::<_, Child>(&sql)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.birth_date)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("child {}", id)))
    }

    async fn delete_child(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        delete_associations(&mut tx, OwnerKind::Child, id).await?;
        let result = sqlx::query("DELETE FROM children WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("child {}", id)));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn create_category(&self, input: &CategoryInput) -> StoreResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(self.pool())
        .await?;
        Ok(category)
    }

    async fn get_category(&self, id: i64) -> StoreResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("category {}", id)))
    }

    async fn list_categories(&self, search: Option<&str>, window: Window) -> StoreResult<(Vec<Category>, usize)> {
        let search = search.filter(|s| !s.is_empty());
        const MATCH: &str = "($1::text IS NULL OR strpos(name, $1) > 0 OR strpos(coalesce(description, ''), $1) > 0)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM categories WHERE {}", MATCH))
            .bind(search)
            .fetch_one(self.pool())
            .await?;
        let sql = format!(
            "SELECT id, name, description FROM categories WHERE {} ORDER BY id LIMIT $2 OFFSET $3",
            MATCH
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(search)
            .bind(limit_param(window))
            .bind(window.offset as i64)
            .fetch_all(self.pool())
            .await?;
        Ok((categories, total as usize))
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> StoreResult<Category> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, description = $3 WHERE id = $1 RETURNING id, name, description",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::not_found(format!("category {}", id)))
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("category {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.db.health_check().await
    }
}
