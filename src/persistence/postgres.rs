//! PostgreSQL implementation of the store traits using `sqlx::PgPool`.
//!
//! Membership transitions rely on `SELECT ... FOR UPDATE`:
//! [`StoreTx::lock_pool`] takes a row lock on the pool so concurrent
//! joins, leaves, and deletes of the same pool serialize at the
//! database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use crate::config::AppConfig;
use crate::domain::{
    CreatorProfile, Gender, Membership, MembershipId, Pool, PoolDetail, PoolDraft, PoolId,
    PoolMember, User, UserId,
};
use crate::persistence::{CarpoolStore, NewUser, PoolFilter, StoreError, StoreTx};

/// PostgreSQL-backed [`CarpoolStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool with the configured limits.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the database is unreachable.
    pub async fn connect(config: &AppConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .map_err(map_db_err)?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if a migration fails to apply.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Attaches creator profile and ordered roster to each pool row.
    async fn load_details(&self, pools: Vec<Pool>) -> Result<Vec<PoolDetail>, StoreError> {
        if pools.is_empty() {
            return Ok(Vec::new());
        }
        let pool_ids: Vec<PoolId> = pools.iter().map(|p| p.id).collect();
        let creator_ids: Vec<UserId> = pools.iter().map(|p| p.created_by).collect();

        let creators: Vec<CreatorProfile> = sqlx::query_as(
            "SELECT id, full_name, email, phone_number, gender \
             FROM users WHERE id = ANY($1)",
        )
        .bind(&creator_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        let creators: HashMap<UserId, CreatorProfile> =
            creators.into_iter().map(|c| (c.id, c)).collect();

        let members: Vec<PoolMember> = sqlx::query_as(
            "SELECT m.id, m.pool_id, m.user_id, m.is_creator, m.joined_at, \
                    u.full_name, u.phone_number, u.gender \
             FROM pool_members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.pool_id = ANY($1) \
             ORDER BY m.joined_at ASC",
        )
        .bind(&pool_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        let mut rosters: HashMap<PoolId, Vec<PoolMember>> = HashMap::new();
        for member in members {
            rosters.entry(member.pool_id).or_default().push(member);
        }

        pools
            .into_iter()
            .map(|pool| {
                let creator = creators.get(&pool.created_by).cloned().ok_or_else(|| {
                    StoreError::Database(format!("missing creator row for pool {}", pool.id))
                })?;
                let members = rosters.remove(&pool.id).unwrap_or_default();
                Ok(PoolDetail {
                    pool,
                    creator,
                    members,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CarpoolStore for PgStore {
    type Tx = PgStoreTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self.pool.begin().await.map_err(map_db_err)?;
        Ok(PgStoreTx { tx })
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        sqlx::query_as(
            "SELECT id, email, full_name, phone_number, gender, provider_subject, date_joined \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as(
            "SELECT id, email, full_name, phone_number, gender, provider_subject, date_joined \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as(
            "SELECT id, email, full_name, phone_number, gender, provider_subject, date_joined \
             FROM users WHERE phone_number = $1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn list_pools(&self, filter: &PoolFilter) -> Result<Vec<PoolDetail>, StoreError> {
        let day = filter.departure_date.map(day_bounds);
        let pools: Vec<Pool> = sqlx::query_as(
            "SELECT id, start_point, end_point, departure_time, arrival_time, transport_mode, \
                    total_persons, current_persons, total_fare, is_female_only, created_by, \
                    created_at \
             FROM pools \
             WHERE ($1::text IS NULL OR start_point ILIKE '%' || $1 || '%') \
               AND ($2::text IS NULL OR end_point ILIKE '%' || $2 || '%') \
               AND ($3::transport_mode IS NULL OR transport_mode = $3) \
               AND ($4::timestamptz IS NULL OR departure_time >= $4) \
               AND ($5::timestamptz IS NULL OR departure_time < $5) \
               AND ($6::boolean IS NULL OR is_female_only = $6) \
             ORDER BY departure_time ASC",
        )
        .bind(filter.start_point.as_deref())
        .bind(filter.end_point.as_deref())
        .bind(filter.transport_mode)
        .bind(day.map(|(start, _)| start))
        .bind(day.map(|(_, end)| end))
        .bind(filter.is_female_only)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        self.load_details(pools).await
    }

    async fn pool_detail(&self, id: PoolId) -> Result<Option<PoolDetail>, StoreError> {
        let pool: Option<Pool> = sqlx::query_as(
            "SELECT id, start_point, end_point, departure_time, arrival_time, transport_mode, \
                    total_persons, current_persons, total_fare, is_female_only, created_by, \
                    created_at \
             FROM pools WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        let Some(pool) = pool else {
            return Ok(None);
        };
        let mut details = self.load_details(vec![pool]).await?;
        Ok(details.pop())
    }

    async fn pools_created_by(&self, user: UserId) -> Result<Vec<PoolDetail>, StoreError> {
        let pools: Vec<Pool> = sqlx::query_as(
            "SELECT id, start_point, end_point, departure_time, arrival_time, transport_mode, \
                    total_persons, current_persons, total_fare, is_female_only, created_by, \
                    created_at \
             FROM pools WHERE created_by = $1 \
             ORDER BY departure_time ASC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        self.load_details(pools).await
    }

    async fn pools_joined_by(&self, user: UserId) -> Result<Vec<PoolDetail>, StoreError> {
        let pools: Vec<Pool> = sqlx::query_as(
            "SELECT p.id, p.start_point, p.end_point, p.departure_time, p.arrival_time, \
                    p.transport_mode, p.total_persons, p.current_persons, p.total_fare, \
                    p.is_female_only, p.created_by, p.created_at \
             FROM pools p \
             JOIN pool_members m ON m.pool_id = p.id \
             WHERE m.user_id = $1 AND m.is_creator = FALSE \
             ORDER BY p.departure_time ASC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        self.load_details(pools).await
    }
}

/// One open PostgreSQL transaction.
#[derive(Debug)]
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_db_err)
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        sqlx::query_as(
            "INSERT INTO users (id, email, full_name, provider_subject) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, email, full_name, phone_number, gender, provider_subject, date_joined",
        )
        .bind(UserId::new())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.provider_subject.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn update_onboarding(
        &mut self,
        id: UserId,
        phone: &str,
        gender: Gender,
    ) -> Result<Option<User>, StoreError> {
        sqlx::query_as(
            "UPDATE users SET phone_number = $2, gender = $3 \
             WHERE id = $1 \
             RETURNING id, email, full_name, phone_number, gender, provider_subject, date_joined",
        )
        .bind(id)
        .bind(phone)
        .bind(gender)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn lock_pool(&mut self, id: PoolId) -> Result<Option<Pool>, StoreError> {
        sqlx::query_as(
            "SELECT id, start_point, end_point, departure_time, arrival_time, transport_mode, \
                    total_persons, current_persons, total_fare, is_female_only, created_by, \
                    created_at \
             FROM pools WHERE id = $1 \
             FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn insert_pool(
        &mut self,
        draft: &PoolDraft,
        created_by: UserId,
    ) -> Result<Pool, StoreError> {
        sqlx::query_as(
            "INSERT INTO pools (id, start_point, end_point, departure_time, arrival_time, \
                                transport_mode, total_persons, current_persons, total_fare, \
                                is_female_only, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 1, $8, $9, $10) \
             RETURNING id, start_point, end_point, departure_time, arrival_time, transport_mode, \
                       total_persons, current_persons, total_fare, is_female_only, created_by, \
                       created_at",
        )
        .bind(PoolId::new())
        .bind(&draft.start_point)
        .bind(&draft.end_point)
        .bind(draft.departure_time)
        .bind(draft.arrival_time)
        .bind(draft.transport_mode)
        .bind(draft.total_persons)
        .bind(draft.total_fare)
        .bind(draft.is_female_only)
        .bind(created_by)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn delete_pool(&mut self, id: PoolId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pools WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_occupancy(&mut self, id: PoolId, current_persons: i32) -> Result<(), StoreError> {
        sqlx::query("UPDATE pools SET current_persons = $2 WHERE id = $1")
            .bind(id)
            .bind(current_persons)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn find_membership(
        &mut self,
        pool: PoolId,
        user: UserId,
    ) -> Result<Option<Membership>, StoreError> {
        sqlx::query_as(
            "SELECT id, pool_id, user_id, is_creator, joined_at \
             FROM pool_members WHERE pool_id = $1 AND user_id = $2",
        )
        .bind(pool)
        .bind(user)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn insert_membership(
        &mut self,
        pool: PoolId,
        user: UserId,
        is_creator: bool,
    ) -> Result<Membership, StoreError> {
        sqlx::query_as(
            "INSERT INTO pool_members (id, pool_id, user_id, is_creator) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, pool_id, user_id, is_creator, joined_at",
        )
        .bind(MembershipId::new())
        .bind(pool)
        .bind(user)
        .bind(is_creator)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_err)
    }

    async fn delete_membership(&mut self, pool: PoolId, user: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pool_members WHERE pool_id = $1 AND user_id = $2")
            .bind(pool)
            .bind(user)
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

/// UTC day window `[midnight, next midnight)` for a departure-date filter.
fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date
        .checked_add_days(Days::new(1))
        .map_or(DateTime::<Utc>::MAX_UTC, |next| {
            next.and_time(NaiveTime::MIN).and_utc()
        });
    (start, end)
}

fn map_db_err(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return StoreError::Duplicate(db.constraint().unwrap_or_default().to_string());
    }
    StoreError::Database(err.to_string())
}
