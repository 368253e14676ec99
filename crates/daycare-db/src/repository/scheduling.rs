//! # Scheduling Repository
//!
//! Saving a scheduling is the one place where the stored totals are written.
//!
//! ## Save Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(draft)                                                            │
//! │                                                                         │
//! │  validate_scheduling_draft (discount range, required ids)               │
//! │       │                                                                 │
//! │  BEGIN IMMEDIATE ───────────────────────────────────────────────┐       │
//! │       │                                                         │       │
//! │       ▼                                                         │       │
//! │  load pet ── pet.tutor_id != draft.tutor_id ──► PetTutorMismatch│       │
//! │       │                                                         │       │
//! │       ▼                                                         │       │
//! │  INSERT / UPDATE scalar row                                    │       │
//! │  (UPDATE first checks allows_status)                           │ any   │
//! │       │                                                         │ error │
//! │       ▼                                                         │   =   │
//! │  replace scheduling_services rows (FK checks service ids)      │ ROLL  │
//! │       │                                                         │ BACK  │
//! │       ▼                                                         │       │
//! │  SELECT prices of attached services                            │       │
//! │  pricing::recompute → gross_total_value, total_value           │       │
//! │       │                                                         │       │
//! │       ▼                                                         │       │
//! │  UPDATE totals                                                 │       │
//! │       │                                                         │       │
//! │  COMMIT ◄───────────────────────────────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are computed once, after the association is in place, so what is
//! committed always matches the attached services.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::{begin_write, like_pattern};
use super::note::load_note_for;
use crate::error::{DbError, DbResult};
use daycare_core::pricing;
use daycare_core::validation::{
    validate_pet_owner, validate_scheduling_draft, validate_search_query,
};
use daycare_core::{
    CoreError, DashboardSummary, IssuanceState, Money, PaymentStatus, Pet, Scheduling,
    SchedulingDraft, SchedulingFilter, DASHBOARD_UPCOMING_LIMIT,
};

const SCHEDULING_COLUMNS: &str = "s.id, s.tutor_id, s.pet_id, s.date_scheduling, s.status, \
                                  s.percentage_discount, s.observations, s.gross_total_value, \
                                  s.total_value, s.created_at, s.updated_at";

/// Repository for schedulings, their services and their totals.
#[derive(Debug, Clone)]
pub struct SchedulingRepository {
    pool: SqlitePool,
}

impl SchedulingRepository {
    /// Creates a new SchedulingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SchedulingRepository { pool }
    }

    /// Creates (`draft.id == None`) or edits a scheduling, then recomputes
    /// and stores its totals, all in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Scheduling)` - the committed row, totals included
    /// * `Err(DbError::Domain(..))` - validation failure, pet of another
    ///   tutor, or pending status on a scheduling that already has a note
    /// * `Err(DbError::NotFound)` - pet or edited scheduling does not exist
    /// * `Err(DbError::ForeignKeyViolation)` - unknown tutor or service id
    ///
    /// Nothing is written unless `Ok` is returned.
    pub async fn save(&self, draft: &SchedulingDraft) -> DbResult<Scheduling> {
        validate_scheduling_draft(draft)?;

        let service_ids = draft.unique_service_ids();
        let mut tx = begin_write(&self.pool).await?;

        let pet = sqlx::query_as::<_, Pet>(
            r#"
            SELECT id, tutor_id, name, species, breed, age, sex, weight,
                   medical_observations, photo_path, created_at, updated_at
            FROM pets WHERE id = ?1
            "#,
        )
        .bind(&draft.pet_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Pet", &draft.pet_id))?;

        validate_pet_owner(&pet, &draft.tutor_id)?;

        let now = Utc::now();
        let id = match &draft.id {
            Some(id) => {
                debug!(id = %id, status = %draft.status, "Updating scheduling");

                check_status_change(&mut *tx, id, draft.status).await?;

                let result = sqlx::query(
                    r#"
                    UPDATE schedulings SET
                        tutor_id = ?2,
                        pet_id = ?3,
                        date_scheduling = ?4,
                        status = ?5,
                        percentage_discount = ?6,
                        observations = ?7,
                        updated_at = ?8
                    WHERE id = ?1
                    "#,
                )
                .bind(id)
                .bind(&draft.tutor_id)
                .bind(&draft.pet_id)
                .bind(draft.date_scheduling)
                .bind(draft.status)
                .bind(draft.percentage_discount)
                .bind(&draft.observations)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::not_found("Scheduling", id));
                }

                id.clone()
            }
            None => {
                let id = Uuid::new_v4().to_string();
                debug!(id = %id, tutor_id = %draft.tutor_id, pet_id = %draft.pet_id, "Inserting scheduling");

                sqlx::query(
                    r#"
                    INSERT INTO schedulings (
                        id, tutor_id, pet_id, date_scheduling, status,
                        percentage_discount, observations,
                        gross_total_value, total_value, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, ?8, ?8)
                    "#,
                )
                .bind(&id)
                .bind(&draft.tutor_id)
                .bind(&draft.pet_id)
                .bind(draft.date_scheduling)
                .bind(draft.status)
                .bind(draft.percentage_discount)
                .bind(&draft.observations)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                id
            }
        };

        sqlx::query("DELETE FROM scheduling_services WHERE scheduling_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        for service_id in &service_ids {
            sqlx::query("INSERT INTO scheduling_services (scheduling_id, service_id) VALUES (?1, ?2)")
                .bind(&id)
                .bind(service_id)
                .execute(&mut *tx)
                .await?;
        }

        let scheduling = apply_totals(&mut *tx, &id).await?;

        tx.commit().await?;

        info!(
            id = %scheduling.id,
            services = scheduling.service_ids.len(),
            gross = %scheduling.gross_total_value,
            total = %scheduling.total_value,
            "Scheduling saved"
        );

        Ok(scheduling)
    }

    /// Recomputes and stores the totals of an existing scheduling from the
    /// current prices of its services.
    ///
    /// Idempotent. Use it to reconcile a scheduling after service prices
    /// changed or after a failed write.
    pub async fn recompute_totals(&self, id: &str) -> DbResult<Scheduling> {
        let mut tx = begin_write(&self.pool).await?;
        let scheduling = apply_totals(&mut *tx, id).await?;
        tx.commit().await?;

        debug!(id = %id, total = %scheduling.total_value, "Totals recomputed");
        Ok(scheduling)
    }

    /// Gets a scheduling with its service ids.
    pub async fn get(&self, id: &str) -> DbResult<Option<Scheduling>> {
        let mut conn = self.pool.acquire().await?;
        load_scheduling(&mut *conn, id).await
    }

    /// Lists schedulings, most recent date first.
    ///
    /// `filter.tutor_name` matches a case-insensitive substring of the
    /// tutor's name; `filter.status` matches exactly.
    pub async fn list(&self, filter: &SchedulingFilter) -> DbResult<Vec<Scheduling>> {
        let tutor_pattern = match &filter.tutor_name {
            Some(name) => Some(validate_search_query(name)?)
                .filter(|q| !q.is_empty())
                .map(|q| like_pattern(&q)),
            None => None,
        };

        debug!(tutor = ?filter.tutor_name, status = ?filter.status, "Listing schedulings");

        let sql = format!(
            r#"
            SELECT {}
            FROM schedulings s
            INNER JOIN tutors t ON t.id = s.tutor_id
            WHERE (?1 IS NULL OR t.search_name LIKE ?1 ESCAPE '\')
              AND (?2 IS NULL OR s.status = ?2)
            ORDER BY s.date_scheduling DESC, s.created_at DESC
            "#,
            SCHEDULING_COLUMNS
        );

        let mut conn = self.pool.acquire().await?;
        let mut schedulings = sqlx::query_as::<_, Scheduling>(&sql)
            .bind(tutor_pattern)
            .bind(filter.status)
            .fetch_all(&mut *conn)
            .await?;

        for scheduling in &mut schedulings {
            scheduling.service_ids = load_service_ids(&mut *conn, &scheduling.id).await?;
        }

        Ok(schedulings)
    }

    /// Changes only the payment status. Totals do not depend on it.
    ///
    /// ## Returns
    /// * `Err(CoreError::InvalidStatusChange)` - moving to pending after a
    ///   note was issued
    pub async fn set_status(&self, id: &str, status: PaymentStatus) -> DbResult<Scheduling> {
        debug!(id = %id, status = %status, "Setting scheduling status");

        let mut tx = begin_write(&self.pool).await?;

        check_status_change(&mut *tx, id, status).await?;

        sqlx::query("UPDATE schedulings SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let scheduling = load_scheduling(&mut *tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Scheduling", id))?;
        tx.commit().await?;

        Ok(scheduling)
    }

    /// Deletes a scheduling together with its service links and note.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting scheduling");

        let result = sqlx::query("DELETE FROM schedulings WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Scheduling", id));
        }

        Ok(())
    }

    /// Joint payment/note state of a scheduling.
    pub async fn issuance_state(&self, id: &str) -> DbResult<IssuanceState> {
        let mut conn = self.pool.acquire().await?;
        load_issuance_state(&mut *conn, id).await
    }

    /// Staff dashboard figures.
    ///
    /// `upcoming` holds the next schedulings dated on or after `from`,
    /// soonest first.
    pub async fn dashboard(&self, from: NaiveDate) -> DbResult<DashboardSummary> {
        let mut conn = self.pool.acquire().await?;

        let total_pets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pets")
            .fetch_one(&mut *conn)
            .await?;
        let total_tutors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tutors")
            .fetch_one(&mut *conn)
            .await?;

        let by_status = sqlx::query_as::<_, (PaymentStatus, i64, Money)>(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(total_value), 0)
            FROM schedulings
            GROUP BY status
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut summary = DashboardSummary {
            total_pets,
            total_tutors,
            paid_count: 0,
            pending_count: 0,
            total_paid: Money::zero(),
            total_pending: Money::zero(),
            average_ticket: Money::zero(),
            upcoming: Vec::new(),
        };

        for (status, count, total) in by_status {
            match status {
                PaymentStatus::Paid => {
                    summary.paid_count = count;
                    summary.total_paid = total;
                }
                PaymentStatus::Pending => {
                    summary.pending_count = count;
                    summary.total_pending = total;
                }
            }
        }

        summary.average_ticket = Money::average(
            summary.total_paid.saturating_add(summary.total_pending),
            summary.paid_count + summary.pending_count,
        );

        let sql = format!(
            r#"
            SELECT {}
            FROM schedulings s
            WHERE s.date_scheduling >= ?1
            ORDER BY s.date_scheduling ASC, s.created_at ASC
            LIMIT ?2
            "#,
            SCHEDULING_COLUMNS
        );
        let mut upcoming = sqlx::query_as::<_, Scheduling>(&sql)
            .bind(from)
            .bind(DASHBOARD_UPCOMING_LIMIT)
            .fetch_all(&mut *conn)
            .await?;

        for scheduling in &mut upcoming {
            scheduling.service_ids = load_service_ids(&mut *conn, &scheduling.id).await?;
        }
        summary.upcoming = upcoming;

        Ok(summary)
    }
}

// =============================================================================
// Connection-level helpers (shared with the note repository)
// =============================================================================

/// Loads a scheduling and its service ids on an existing connection or
/// transaction.
pub(crate) async fn load_scheduling(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Scheduling>> {
    let sql = format!("SELECT {} FROM schedulings s WHERE s.id = ?1", SCHEDULING_COLUMNS);
    let scheduling = sqlx::query_as::<_, Scheduling>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match scheduling {
        Some(mut scheduling) => {
            scheduling.service_ids = load_service_ids(conn, id).await?;
            Ok(Some(scheduling))
        }
        None => Ok(None),
    }
}

async fn load_service_ids(conn: &mut SqliteConnection, scheduling_id: &str) -> DbResult<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT service_id FROM scheduling_services WHERE scheduling_id = ?1 ORDER BY service_id",
    )
    .bind(scheduling_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

/// Reads the attached prices, runs the pricing engine and writes both
/// totals back. Must run inside the caller's transaction.
async fn apply_totals(conn: &mut SqliteConnection, id: &str) -> DbResult<Scheduling> {
    let mut scheduling = load_scheduling(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Scheduling", id))?;

    let prices: Vec<Money> = sqlx::query_scalar(
        r#"
        SELECT s.price
        FROM services s
        INNER JOIN scheduling_services ss ON ss.service_id = s.id
        WHERE ss.scheduling_id = ?1
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let totals = pricing::recompute(&mut scheduling, prices);

    sqlx::query("UPDATE schedulings SET gross_total_value = ?2, total_value = ?3 WHERE id = ?1")
        .bind(id)
        .bind(totals.gross_total_value)
        .bind(totals.total_value)
        .execute(&mut *conn)
        .await?;

    Ok(scheduling)
}

async fn load_issuance_state(conn: &mut SqliteConnection, id: &str) -> DbResult<IssuanceState> {
    let status: PaymentStatus = sqlx::query_scalar("SELECT status FROM schedulings WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Scheduling", id))?;

    let note = load_note_for(conn, id).await?;
    Ok(IssuanceState::of(status, note.as_ref()))
}

/// Refuses a status that the scheduling's issuance state does not allow.
///
/// Must run inside a `begin_write` transaction so no note can be issued
/// between this check and the caller's UPDATE.
async fn check_status_change(
    conn: &mut SqliteConnection,
    id: &str,
    status: PaymentStatus,
) -> DbResult<()> {
    let state = load_issuance_state(conn, id).await?;

    match state {
        IssuanceState::Issued { note_number } if !state.allows_status(status) => {
            Err(CoreError::InvalidStatusChange {
                scheduling_id: id.to_string(),
                note_number,
            }
            .into())
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::pet::NewPet;
    use crate::repository::service::NewService;
    use crate::repository::tutor::NewTutor;
    use daycare_core::{Actor, DiscountRate, ModelPermissions, ValidationError};

    struct Fixture {
        db: Database,
        tutor_id: String,
        pet_id: String,
        bath: String,
        grooming: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tutor = db
            .tutors()
            .insert(&NewTutor {
                name: "Ana Souza".to_string(),
                cpf: "12345678909".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let pet = db
            .pets()
            .insert(&NewPet {
                tutor_id: tutor.id.clone(),
                name: "Rex".to_string(),
                species: "Dog".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let bath = db
            .services()
            .insert(&NewService::new("Bath", Money::from_cents(4000)))
            .await
            .unwrap();
        let grooming = db
            .services()
            .insert(&NewService::new("Grooming", Money::from_cents(2500)))
            .await
            .unwrap();

        Fixture {
            db,
            tutor_id: tutor.id,
            pet_id: pet.id,
            bath: bath.id,
            grooming: grooming.id,
        }
    }

    fn draft(f: &Fixture, services: &[&str], discount: DiscountRate) -> SchedulingDraft {
        SchedulingDraft {
            id: None,
            tutor_id: f.tutor_id.clone(),
            pet_id: f.pet_id.clone(),
            service_ids: services.iter().map(|s| s.to_string()).collect(),
            date_scheduling: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            status: PaymentStatus::Pending,
            percentage_discount: discount,
            observations: None,
        }
    }

    #[tokio::test]
    async fn test_save_computes_totals() {
        let f = fixture().await;
        let saved = f
            .db
            .schedulings()
            .save(&draft(&f, &[&f.bath, &f.grooming], DiscountRate::from_percent(20)))
            .await
            .unwrap();

        assert_eq!(saved.gross_total_value.cents(), 6500);
        assert_eq!(saved.total_value.cents(), 5200);

        let loaded = f.db.schedulings().get(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.gross_total_value.cents(), 6500);
        assert_eq!(loaded.total_value.cents(), 5200);
        assert_eq!(loaded.service_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_service_set_totals_zero() {
        let f = fixture().await;
        let saved = f
            .db
            .schedulings()
            .save(&draft(&f, &[], DiscountRate::from_percent(10)))
            .await
            .unwrap();

        assert!(saved.gross_total_value.is_zero());
        assert!(saved.total_value.is_zero());
    }

    #[tokio::test]
    async fn test_most_expensive_services_sum_exactly() {
        use daycare_core::MAX_PRICE_CENTS;

        let f = fixture().await;
        let a = f
            .db
            .services()
            .insert(&NewService::new("Suite A", Money::from_cents(MAX_PRICE_CENTS)))
            .await
            .unwrap();
        let b = f
            .db
            .services()
            .insert(&NewService::new("Suite B", Money::from_cents(MAX_PRICE_CENTS)))
            .await
            .unwrap();

        let saved = f
            .db
            .schedulings()
            .save(&draft(&f, &[&a.id, &b.id], DiscountRate::from_percent(50)))
            .await
            .unwrap();

        assert_eq!(saved.gross_total_value.cents(), 2 * MAX_PRICE_CENTS);
        assert_eq!(saved.total_value.cents(), MAX_PRICE_CENTS);
    }

    #[tokio::test]
    async fn test_duplicate_service_ids_collapse() {
        let f = fixture().await;
        let saved = f
            .db
            .schedulings()
            .save(&draft(&f, &[&f.bath, &f.bath], DiscountRate::zero()))
            .await
            .unwrap();

        assert_eq!(saved.service_ids, vec![f.bath.clone()]);
        assert_eq!(saved.gross_total_value.cents(), 4000);
    }

    #[tokio::test]
    async fn test_edit_replaces_services_and_recomputes() {
        let f = fixture().await;
        let repo = f.db.schedulings();

        let saved = repo
            .save(&draft(&f, &[&f.bath, &f.grooming], DiscountRate::zero()))
            .await
            .unwrap();

        let mut edit = draft(&f, &[&f.grooming], DiscountRate::from_percent(10));
        edit.id = Some(saved.id.clone());
        let edited = repo.save(&edit).await.unwrap();

        assert_eq!(edited.id, saved.id);
        assert_eq!(edited.service_ids, vec![f.grooming.clone()]);
        assert_eq!(edited.gross_total_value.cents(), 2500);
        assert_eq!(edited.total_value.cents(), 2250);
    }

    #[tokio::test]
    async fn test_pet_of_other_tutor_rejected() {
        let f = fixture().await;
        let other = f
            .db
            .tutors()
            .insert(&NewTutor {
                name: "Bia".to_string(),
                cpf: "98765432100".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut bad = draft(&f, &[&f.bath], DiscountRate::zero());
        bad.tutor_id = other.id;

        let err = f.db.schedulings().save(&bad).await.unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::PetTutorMismatch { .. })
        ));
        assert!(f.db.schedulings().list(&SchedulingFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discount_over_hundred_rejected() {
        let f = fixture().await;
        let err = f
            .db
            .schedulings()
            .save(&draft(&f, &[&f.bath], DiscountRate::from_bps(10_001)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_service_rolls_back() {
        let f = fixture().await;
        let err = f
            .db
            .schedulings()
            .save(&draft(&f, &[&f.bath, "no-such-service"], DiscountRate::zero()))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(f.db.schedulings().list(&SchedulingFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_missing_scheduling() {
        let f = fixture().await;
        let mut edit = draft(&f, &[&f.bath], DiscountRate::zero());
        edit.id = Some("missing".to_string());

        let err = f.db.schedulings().save(&edit).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_price_change_needs_explicit_recompute() {
        let f = fixture().await;
        let saved = f
            .db
            .schedulings()
            .save(&draft(&f, &[&f.bath], DiscountRate::zero()))
            .await
            .unwrap();

        f.db
            .services()
            .update(&f.bath, &NewService::new("Bath", Money::from_cents(5000)))
            .await
            .unwrap();

        let stale = f.db.schedulings().get(&saved.id).await.unwrap().unwrap();
        assert_eq!(stale.total_value.cents(), 4000);

        let fresh = f.db.schedulings().recompute_totals(&saved.id).await.unwrap();
        assert_eq!(fresh.total_value.cents(), 5000);

        let again = f.db.schedulings().recompute_totals(&saved.id).await.unwrap();
        assert_eq!(again.total_value, fresh.total_value);
        assert_eq!(again.gross_total_value, fresh.gross_total_value);
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let f = fixture().await;
        let repo = f.db.schedulings();

        let mut early = draft(&f, &[&f.bath], DiscountRate::zero());
        early.date_scheduling = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        early.status = PaymentStatus::Paid;
        repo.save(&early).await.unwrap();

        let late = draft(&f, &[&f.grooming], DiscountRate::zero());
        repo.save(&late).await.unwrap();

        let all = repo.list(&SchedulingFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].date_scheduling > all[1].date_scheduling);

        let paid = repo
            .list(&SchedulingFilter {
                tutor_name: None,
                status: Some(PaymentStatus::Paid),
            })
            .await
            .unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].status, PaymentStatus::Paid);

        let by_name = repo
            .list(&SchedulingFilter {
                tutor_name: Some("souza".to_string()),
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let nobody = repo
            .list(&SchedulingFilter {
                tutor_name: Some("Carlos".to_string()),
                status: None,
            })
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn test_list_matches_accented_tutor_name() {
        let f = fixture().await;
        let angela = f
            .db
            .tutors()
            .insert(&NewTutor {
                name: "Ângela Souza".to_string(),
                cpf: "98765432100".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let luna = f
            .db
            .pets()
            .insert(&NewPet {
                tutor_id: angela.id.clone(),
                name: "Luna".to_string(),
                species: "Cat".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut hers = draft(&f, &[&f.bath], DiscountRate::zero());
        hers.tutor_id = angela.id.clone();
        hers.pet_id = luna.id;
        f.db.schedulings().save(&hers).await.unwrap();
        f.db.schedulings()
            .save(&draft(&f, &[&f.grooming], DiscountRate::zero()))
            .await
            .unwrap();

        for name in ["Ângela", "ângela"] {
            let found = f
                .db
                .schedulings()
                .list(&SchedulingFilter {
                    tutor_name: Some(name.to_string()),
                    status: None,
                })
                .await
                .unwrap();
            assert_eq!(found.len(), 1, "filter {name:?}");
            assert_eq!(found[0].tutor_id, angela.id);
        }
    }

    #[tokio::test]
    async fn test_status_locked_after_issue() {
        let f = fixture().await;
        let repo = f.db.schedulings();

        let saved = repo.save(&draft(&f, &[&f.bath], DiscountRate::zero())).await.unwrap();
        assert_eq!(
            repo.issuance_state(&saved.id).await.unwrap(),
            IssuanceState::Unissued {
                status: PaymentStatus::Pending
            }
        );

        repo.set_status(&saved.id, PaymentStatus::Paid).await.unwrap();
        let note = f
            .db
            .notes()
            .issue(&saved.id, &Actor::superuser("admin"), &ModelPermissions)
            .await
            .unwrap();

        assert_eq!(
            repo.issuance_state(&saved.id).await.unwrap(),
            IssuanceState::Issued {
                note_number: note.note_number
            }
        );

        let err = repo.set_status(&saved.id, PaymentStatus::Pending).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATUS");

        let mut edit = draft(&f, &[&f.bath], DiscountRate::zero());
        edit.id = Some(saved.id.clone());
        let err = repo.save(&edit).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidStatusChange { note_number, .. }) if note_number == note.note_number
        ));

        // Still paid, still issued
        let loaded = repo.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let f = fixture().await;
        let repo = f.db.schedulings();

        let mut paid = draft(&f, &[&f.bath], DiscountRate::zero());
        paid.status = PaymentStatus::Paid;
        let saved = repo.save(&paid).await.unwrap();
        f.db
            .notes()
            .issue(&saved.id, &Actor::superuser("admin"), &ModelPermissions)
            .await
            .unwrap();

        repo.delete(&saved.id).await.unwrap();
        assert!(repo.get(&saved.id).await.unwrap().is_none());
        assert!(f.db.notes().get_for_scheduling(&saved.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&saved.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let f = fixture().await;
        let repo = f.db.schedulings();

        let empty = repo
            .dashboard(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(empty.total_pets, 1);
        assert_eq!(empty.total_tutors, 1);
        assert!(empty.average_ticket.is_zero());
        assert!(empty.upcoming.is_empty());

        // 40.00 paid, 25.00 pending, 65.00 pending
        let mut paid = draft(&f, &[&f.bath], DiscountRate::zero());
        paid.status = PaymentStatus::Paid;
        paid.date_scheduling = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        repo.save(&paid).await.unwrap();
        repo.save(&draft(&f, &[&f.grooming], DiscountRate::zero()))
            .await
            .unwrap();
        let mut both = draft(&f, &[&f.bath, &f.grooming], DiscountRate::zero());
        both.date_scheduling = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        repo.save(&both).await.unwrap();

        let summary = repo
            .dashboard(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.total_paid.cents(), 4000);
        assert_eq!(summary.total_pending.cents(), 9000);
        // 130.00 / 3 = 43.333..
        assert_eq!(summary.average_ticket.cents(), 4333);

        let dates: Vec<_> = summary.upcoming.iter().map(|s| s.date_scheduling).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            ]
        );
    }
}
