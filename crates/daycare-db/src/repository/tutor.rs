//! # Tutor Repository
//!
//! Database operations for tutors (pet owners).
//!
//! ## Address Rule
//! ```text
//! state_id   city_id    result
//! ────────   ───────    ──────────────────────────────
//! None       None       ok
//! Some(SP)   None       ok
//! Some(SP)   Campinas   ok (Campinas is in SP)
//! Some(RJ)   Campinas   CityStateMismatch
//! None       Campinas   Required { field: "state" }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{like_pattern, search_key};
use crate::error::{DbError, DbResult};
use daycare_core::validation::{
    validate_city_in_state, validate_cpf, validate_email, validate_name, validate_search_query,
};
use daycare_core::{City, ReferralSource, Tutor};

const TUTOR_COLUMNS: &str = "id, name, cpf, phone_number, email, address, state_id, city_id, \
                             referral_source, created_at, updated_at";

/// Input for creating or editing a tutor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTutor {
    pub name: String,
    pub cpf: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state_id: Option<String>,
    pub city_id: Option<String>,
    pub referral_source: Option<ReferralSource>,
}

/// Repository for tutor database operations.
#[derive(Debug, Clone)]
pub struct TutorRepository {
    pool: SqlitePool,
}

impl TutorRepository {
    /// Creates a new TutorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TutorRepository { pool }
    }

    /// Inserts a new tutor.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(..))` - invalid name, CPF, e-mail or address pairing
    /// * `Err(DbError::UniqueViolation)` - CPF already registered
    pub async fn insert(&self, input: &NewTutor) -> DbResult<Tutor> {
        self.validate(input).await?;

        let now = Utc::now();
        let tutor = Tutor {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            cpf: input.cpf.trim().to_string(),
            phone_number: input.phone_number.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            state_id: input.state_id.clone(),
            city_id: input.city_id.clone(),
            referral_source: input.referral_source,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %tutor.id, name = %tutor.name, "Inserting tutor");

        sqlx::query(
            r#"
            INSERT INTO tutors (
                id, name, search_name, cpf, phone_number, email, address,
                state_id, city_id, referral_source, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&tutor.id)
        .bind(&tutor.name)
        .bind(search_key(&tutor.name))
        .bind(&tutor.cpf)
        .bind(&tutor.phone_number)
        .bind(&tutor.email)
        .bind(&tutor.address)
        .bind(&tutor.state_id)
        .bind(&tutor.city_id)
        .bind(tutor.referral_source)
        .bind(tutor.created_at)
        .bind(tutor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| cpf_conflict(e, &tutor.cpf))?;

        Ok(tutor)
    }

    /// Replaces the editable fields of an existing tutor.
    pub async fn update(&self, id: &str, input: &NewTutor) -> DbResult<Tutor> {
        self.validate(input).await?;

        debug!(id = %id, "Updating tutor");

        let cpf = input.cpf.trim().to_string();
        let result = sqlx::query(
            r#"
            UPDATE tutors SET
                name = ?2,
                cpf = ?3,
                phone_number = ?4,
                email = ?5,
                address = ?6,
                state_id = ?7,
                city_id = ?8,
                referral_source = ?9,
                updated_at = ?10,
                search_name = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&cpf)
        .bind(&input.phone_number)
        .bind(&input.email)
        .bind(&input.address)
        .bind(&input.state_id)
        .bind(&input.city_id)
        .bind(input.referral_source)
        .bind(Utc::now())
        .bind(search_key(&input.name))
        .execute(&self.pool)
        .await
        .map_err(|e| cpf_conflict(e, &cpf))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tutor", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Tutor", id))
    }

    /// Gets a tutor by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Tutor>> {
        let sql = format!("SELECT {} FROM tutors WHERE id = ?1", TUTOR_COLUMNS);
        let tutor = sqlx::query_as::<_, Tutor>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tutor)
    }

    /// Case-insensitive substring search on the name, ordered by name.
    ///
    /// An empty query lists every tutor.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Tutor>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, "Searching tutors");

        let sql = format!(
            "SELECT {} FROM tutors WHERE search_name LIKE ?1 ESCAPE '\\' ORDER BY name",
            TUTOR_COLUMNS
        );
        let tutors = sqlx::query_as::<_, Tutor>(&sql)
            .bind(like_pattern(&query))
            .fetch_all(&self.pool)
            .await?;

        Ok(tutors)
    }

    /// Deletes a tutor. Their pets and schedulings go with them.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting tutor");

        let result = sqlx::query("DELETE FROM tutors WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tutor", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tutors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn validate(&self, input: &NewTutor) -> DbResult<()> {
        validate_name(&input.name)?;
        validate_cpf(&input.cpf)?;
        validate_email(input.email.as_deref())?;

        if let Some(city_id) = &input.city_id {
            let city = sqlx::query_as::<_, City>("SELECT id, state_id, name FROM cities WHERE id = ?1")
                .bind(city_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("City", city_id))?;

            validate_city_in_state(&city, input.state_id.as_deref())?;
        }

        Ok(())
    }
}

fn cpf_conflict(err: sqlx::Error, cpf: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("cpf", cpf),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
