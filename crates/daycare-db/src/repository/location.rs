//! # Location Repository
//!
//! States and cities, the reference data behind a tutor's address.
//!
//! A tutor picks a state first and the city list is narrowed to that state
//! ([`LocationRepository::cities_of`]). The pairing itself is enforced when a
//! tutor is saved.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use daycare_core::validation::{validate_abbreviation, validate_name};
use daycare_core::{City, State};

/// Repository for states and cities.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    /// Creates a new LocationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    // =========================================================================
    // States
    // =========================================================================

    /// Inserts a state. The abbreviation is stored upper-cased.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - abbreviation already used
    pub async fn insert_state(&self, name: &str, abbreviation: &str) -> DbResult<State> {
        validate_name(name)?;
        validate_abbreviation(abbreviation)?;

        let state = State {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            abbreviation: abbreviation.trim().to_uppercase(),
        };

        debug!(abbreviation = %state.abbreviation, "Inserting state");

        sqlx::query("INSERT INTO states (id, name, abbreviation) VALUES (?1, ?2, ?3)")
            .bind(&state.id)
            .bind(&state.name)
            .bind(&state.abbreviation)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => {
                    DbError::duplicate(field, state.abbreviation.clone())
                }
                other => other,
            })?;

        Ok(state)
    }

    /// Lists all states ordered by name.
    pub async fn list_states(&self) -> DbResult<Vec<State>> {
        let states = sqlx::query_as::<_, State>(
            "SELECT id, name, abbreviation FROM states ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(states)
    }

    pub async fn get_state(&self, id: &str) -> DbResult<Option<State>> {
        let state = sqlx::query_as::<_, State>(
            "SELECT id, name, abbreviation FROM states WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Looks a state up by its two-letter code, case-insensitively.
    pub async fn get_state_by_abbreviation(&self, abbreviation: &str) -> DbResult<Option<State>> {
        let state = sqlx::query_as::<_, State>(
            "SELECT id, name, abbreviation FROM states WHERE abbreviation = ?1",
        )
        .bind(abbreviation.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    /// Deletes a state and, by cascade, its cities.
    pub async fn delete_state(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting state");

        let result = sqlx::query("DELETE FROM states WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("State", id));
        }

        Ok(())
    }

    // =========================================================================
    // Cities
    // =========================================================================

    /// Inserts a city into an existing state.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - state does not exist
    pub async fn insert_city(&self, state_id: &str, name: &str) -> DbResult<City> {
        validate_name(name)?;

        let city = City {
            id: Uuid::new_v4().to_string(),
            state_id: state_id.to_string(),
            name: name.trim().to_string(),
        };

        debug!(state_id = %state_id, name = %city.name, "Inserting city");

        sqlx::query("INSERT INTO cities (id, state_id, name) VALUES (?1, ?2, ?3)")
            .bind(&city.id)
            .bind(&city.state_id)
            .bind(&city.name)
            .execute(&self.pool)
            .await?;

        Ok(city)
    }

    pub async fn get_city(&self, id: &str) -> DbResult<Option<City>> {
        let city = sqlx::query_as::<_, City>("SELECT id, state_id, name FROM cities WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(city)
    }

    /// Lists every city ordered by name.
    pub async fn list_cities(&self) -> DbResult<Vec<City>> {
        let cities =
            sqlx::query_as::<_, City>("SELECT id, state_id, name FROM cities ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(cities)
    }

    /// Cities of one state, ordered by name. Drives the chained city picker.
    pub async fn cities_of(&self, state_id: &str) -> DbResult<Vec<City>> {
        let cities = sqlx::query_as::<_, City>(
            "SELECT id, state_id, name FROM cities WHERE state_id = ?1 ORDER BY name",
        )
        .bind(state_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cities)
    }

    pub async fn delete_city(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting city");

        let result = sqlx::query("DELETE FROM cities WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("City", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
