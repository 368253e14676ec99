//! # Service Repository
//!
//! Database operations for billable services.
//!
//! ## Price Changes
//! Editing a price only affects schedulings saved (or explicitly recomputed)
//! afterwards. Totals already stored on a scheduling are left as they were.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{like_pattern, search_key};
use crate::error::{DbError, DbResult};
use daycare_core::validation::{validate_name, validate_price, validate_search_query};
use daycare_core::{Money, Service};

const SERVICE_COLUMNS: &str = "id, name, description, price, created_at, updated_at";

/// Input for creating or editing a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
}

impl NewService {
    pub fn new(name: impl Into<String>, price: Money) -> Self {
        NewService {
            name: name.into(),
            description: None,
            price,
        }
    }
}

/// Repository for service database operations.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    /// Creates a new ServiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Inserts a new service.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let bath = db.services().insert(&NewService::new("Bath", "40.00".parse()?)).await?;
    /// ```
    pub async fn insert(&self, input: &NewService) -> DbResult<Service> {
        validate_name(&input.name)?;
        validate_price(input.price)?;

        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            price: input.price,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %service.id, name = %service.name, price = %service.price, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (id, name, search_name, description, price, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(search_key(&service.name))
        .bind(&service.description)
        .bind(service.price)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(service)
    }

    /// Updates a service. Existing scheduling totals are not recomputed.
    pub async fn update(&self, id: &str, input: &NewService) -> DbResult<Service> {
        validate_name(&input.name)?;
        validate_price(input.price)?;

        debug!(id = %id, price = %input.price, "Updating service");

        let result = sqlx::query(
            r#"
            UPDATE services SET
                name = ?2,
                description = ?3,
                price = ?4,
                updated_at = ?5,
                search_name = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(Utc::now())
        .bind(search_key(&input.name))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Service", id))
    }

    /// Gets a service by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Service>> {
        let sql = format!("SELECT {} FROM services WHERE id = ?1", SERVICE_COLUMNS);
        let service = sqlx::query_as::<_, Service>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(service)
    }

    /// Case-insensitive substring search on the name, ordered by name.
    ///
    /// An empty query lists every service, which is what the scheduling form
    /// offers as choices.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Service>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, "Searching services");

        let sql = format!(
            "SELECT {} FROM services WHERE search_name LIKE ?1 ESCAPE '\\' ORDER BY name",
            SERVICE_COLUMNS
        );
        let services = sqlx::query_as::<_, Service>(&sql)
            .bind(like_pattern(&query))
            .fetch_all(&self.pool)
            .await?;

        Ok(services)
    }

    /// Services attached to a scheduling, ordered by name.
    pub async fn of_scheduling(&self, scheduling_id: &str) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT s.id, s.name, s.description, s.price, s.created_at, s.updated_at
            FROM services s
            INNER JOIN scheduling_services ss ON ss.service_id = s.id
            WHERE ss.scheduling_id = ?1
            ORDER BY s.name
            "#,
        )
        .bind(scheduling_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Deletes a service and detaches it from every scheduling.
    ///
    /// Like a price change, this leaves stored totals alone until the
    /// affected schedulings are saved or recomputed.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting service");

        let result = sqlx::query("DELETE FROM services WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
