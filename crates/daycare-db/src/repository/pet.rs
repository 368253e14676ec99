//! # Pet Repository
//!
//! Database operations for pets. Every pet belongs to exactly one tutor.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{like_pattern, search_key};
use crate::error::{DbError, DbResult};
use daycare_core::validation::{validate_name, validate_required, validate_search_query};
use daycare_core::{Pet, PetSex, ValidationError, MAX_NAME_LEN};

const PET_COLUMNS: &str = "id, tutor_id, name, species, breed, age, sex, weight, \
                           medical_observations, photo_path, created_at, updated_at";

/// Input for creating or editing a pet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPet {
    pub tutor_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub sex: Option<PetSex>,
    pub weight: Option<f64>,
    pub medical_observations: Option<String>,
    pub photo_path: Option<String>,
}

impl NewPet {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_required("tutor", &self.tutor_id, 64)?;
        validate_name(&self.name)?;
        validate_required("species", &self.species, MAX_NAME_LEN)?;

        if let Some(weight) = self.weight {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ValidationError::InvalidFormat {
                    field: "weight".to_string(),
                    reason: "must be a non-negative number of kilograms".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Repository for pet database operations.
#[derive(Debug, Clone)]
pub struct PetRepository {
    pool: SqlitePool,
}

impl PetRepository {
    /// Creates a new PetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PetRepository { pool }
    }

    /// Inserts a new pet.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - tutor does not exist
    pub async fn insert(&self, input: &NewPet) -> DbResult<Pet> {
        input.validate()?;

        let now = Utc::now();
        let pet = Pet {
            id: Uuid::new_v4().to_string(),
            tutor_id: input.tutor_id.clone(),
            name: input.name.trim().to_string(),
            species: input.species.trim().to_string(),
            breed: input.breed.clone(),
            age: input.age.clone(),
            sex: input.sex,
            weight: input.weight,
            medical_observations: input.medical_observations.clone(),
            photo_path: input.photo_path.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %pet.id, tutor_id = %pet.tutor_id, name = %pet.name, "Inserting pet");

        sqlx::query(
            r#"
            INSERT INTO pets (
                id, tutor_id, name, species, breed, age, sex, weight,
                medical_observations, photo_path, created_at, updated_at, search_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&pet.id)
        .bind(&pet.tutor_id)
        .bind(&pet.name)
        .bind(&pet.species)
        .bind(&pet.breed)
        .bind(&pet.age)
        .bind(pet.sex)
        .bind(pet.weight)
        .bind(&pet.medical_observations)
        .bind(&pet.photo_path)
        .bind(pet.created_at)
        .bind(pet.updated_at)
        .bind(search_key(&pet.name))
        .execute(&self.pool)
        .await?;

        Ok(pet)
    }

    /// Replaces the editable fields of an existing pet.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(..))` - `PetHasSchedulings` when the tutor
    ///   changes while schedulings still reference the pet
    /// * `Err(DbError::NotFound)` - no such pet
    pub async fn update(&self, id: &str, input: &NewPet) -> DbResult<Pet> {
        input.validate()?;

        debug!(id = %id, tutor_id = %input.tutor_id, "Updating pet");

        // Every scheduling of a pet is booked under the pet's tutor
        let result = sqlx::query(
            r#"
            UPDATE pets SET
                tutor_id = ?2,
                name = ?3,
                species = ?4,
                breed = ?5,
                age = ?6,
                sex = ?7,
                weight = ?8,
                medical_observations = ?9,
                photo_path = ?10,
                updated_at = ?11,
                search_name = ?12
            WHERE id = ?1
              AND (tutor_id = ?2
                   OR NOT EXISTS (SELECT 1 FROM schedulings WHERE pet_id = ?1))
            "#,
        )
        .bind(id)
        .bind(&input.tutor_id)
        .bind(input.name.trim())
        .bind(input.species.trim())
        .bind(&input.breed)
        .bind(&input.age)
        .bind(input.sex)
        .bind(input.weight)
        .bind(&input.medical_observations)
        .bind(&input.photo_path)
        .bind(Utc::now())
        .bind(search_key(&input.name))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(id).await);
        }

        self.get(id).await?.ok_or_else(|| DbError::not_found("Pet", id))
    }

    /// Gets a pet by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Pet>> {
        let sql = format!("SELECT {} FROM pets WHERE id = ?1", PET_COLUMNS);
        let pet = sqlx::query_as::<_, Pet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(pet)
    }

    /// Pets owned by one tutor, ordered by name.
    pub async fn of_tutor(&self, tutor_id: &str) -> DbResult<Vec<Pet>> {
        let sql = format!(
            "SELECT {} FROM pets WHERE tutor_id = ?1 ORDER BY name",
            PET_COLUMNS
        );
        let pets = sqlx::query_as::<_, Pet>(&sql)
            .bind(tutor_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(pets)
    }

    /// Case-insensitive substring search on the name, ordered by name.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Pet>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, "Searching pets");

        let sql = format!(
            "SELECT {} FROM pets WHERE search_name LIKE ?1 ESCAPE '\\' ORDER BY name",
            PET_COLUMNS
        );
        let pets = sqlx::query_as::<_, Pet>(&sql)
            .bind(like_pattern(&query))
            .fetch_all(&self.pool)
            .await?;

        Ok(pets)
    }

    /// Deletes a pet and its schedulings.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting pet");

        let result = sqlx::query("DELETE FROM pets WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pet", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Explains why a guarded UPDATE touched no row.
    async fn rejected_update(&self, id: &str) -> DbError {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pets WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await;
        let schedulings =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM schedulings WHERE pet_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await;

        match (exists, schedulings) {
            (Ok(0), _) => DbError::not_found("Pet", id),
            (Ok(_), Ok(schedulings)) => ValidationError::PetHasSchedulings {
                pet_id: id.to_string(),
                schedulings,
            }
            .into(),
            (Err(err), _) | (_, Err(err)) => err.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
