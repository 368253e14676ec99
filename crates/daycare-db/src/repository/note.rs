//! # Note Repository
//!
//! Issuance and lookup of payment-confirmation notes.
//!
//! ## Issuance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue(scheduling_id, actor, authorizer)                                │
//! │                                                                         │
//! │  1. authorize_issuance (no query yet)      no ──► PermissionDenied      │
//! │  2. load scheduling                        none ──► NotFound            │
//! │  3. check_issuable (existing note, paid)   ──► AlreadyIssued /          │
//! │                                                PaymentPending           │
//! │  4. INSERT note ... WHERE scheduling is paid                            │
//! │       │                                                                 │
//! │       ├── UNIQUE(scheduling_id) fails ──► another caller won:           │
//! │       │                                  AlreadyIssued(their number)    │
//! │       ├── 0 rows ──► status changed meanwhile: PaymentPending           │
//! │       └── 1 row  ──► Note { note_number = last_insert_rowid }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 4 is a single statement, so two concurrent callers can never both
//! create a note: SQLite lets exactly one INSERT through and the other sees
//! the unique violation.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::scheduling::load_scheduling;
use crate::error::{DbError, DbResult};
use daycare_core::issuance::{authorize_issuance, check_issuable};
use daycare_core::pricing;
use daycare_core::{Actor, Authorizer, IssuanceError, Note, NoteDetail, Service};

/// Repository for notes.
#[derive(Debug, Clone)]
pub struct NoteRepository {
    pool: SqlitePool,
}

impl NoteRepository {
    /// Creates a new NoteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NoteRepository { pool }
    }

    /// Issues the note of a paid scheduling.
    ///
    /// ## Returns
    /// * `Ok(Note)` - the new note, numbered after every earlier one
    /// * `Err` with code `PERMISSION_DENIED` / `ALREADY_ISSUED` /
    ///   `PAYMENT_PENDING` - nothing was written
    /// * `Err(DbError::NotFound)` - no such scheduling
    ///
    /// `AlreadyIssued` carries the existing note number; callers showing
    /// the note can fetch it with [`NoteRepository::get`].
    pub async fn issue(
        &self,
        scheduling_id: &str,
        actor: &Actor,
        authorizer: &dyn Authorizer,
    ) -> DbResult<Note> {
        // Permission first, before touching the database
        if let Err(err) = authorize_issuance(authorizer, actor, scheduling_id) {
            warn!(user = %actor.username, scheduling_id = %scheduling_id, "Note issuance denied");
            return Err(err.into());
        }

        let mut conn = self.pool.acquire().await?;

        let scheduling = load_scheduling(&mut *conn, scheduling_id)
            .await?
            .ok_or_else(|| DbError::not_found("Scheduling", scheduling_id))?;
        let existing = load_note_for(&mut *conn, scheduling_id).await?;

        if let Err(err) = check_issuable(&scheduling, existing.as_ref()) {
            warn!(scheduling_id = %scheduling_id, reason = %err, "Note issuance rejected");
            return Err(err.into());
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO notes (scheduling_id, issue_date)
            SELECT id, ?2 FROM schedulings WHERE id = ?1 AND status = 'paid'
            "#,
        )
        .bind(scheduling_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await;

        let result = match insert {
            Ok(result) => result,
            Err(err) => {
                return match DbError::from(err) {
                    DbError::UniqueViolation { .. } => {
                        Err(lost_race(&mut *conn, scheduling_id).await)
                    }
                    other => Err(other),
                };
            }
        };

        if result.rows_affected() == 0 {
            warn!(scheduling_id = %scheduling_id, "Scheduling left paid status before issuance");
            return Err(match load_scheduling(&mut *conn, scheduling_id).await? {
                Some(_) => IssuanceError::PaymentPending {
                    scheduling_id: scheduling_id.to_string(),
                }
                .into(),
                None => DbError::not_found("Scheduling", scheduling_id),
            });
        }

        let note = load_note_for(&mut *conn, scheduling_id)
            .await?
            .ok_or_else(|| DbError::Internal("issued note not readable".to_string()))?;

        info!(
            note_number = note.note_number,
            scheduling_id = %scheduling_id,
            user = %actor.username,
            "Note issued"
        );

        Ok(note)
    }

    /// Gets a note by its number.
    pub async fn get(&self, note_number: i64) -> DbResult<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT note_number, scheduling_id, issue_date FROM notes WHERE note_number = ?1",
        )
        .bind(note_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    /// The note of a scheduling, if one was issued.
    pub async fn get_for_scheduling(&self, scheduling_id: &str) -> DbResult<Option<Note>> {
        let mut conn = self.pool.acquire().await?;
        load_note_for(&mut *conn, scheduling_id).await
    }

    /// Everything the printed note shows.
    pub async fn detail(&self, note_number: i64) -> DbResult<NoteDetail> {
        let mut conn = self.pool.acquire().await?;

        let note = sqlx::query_as::<_, Note>(
            "SELECT note_number, scheduling_id, issue_date FROM notes WHERE note_number = ?1",
        )
        .bind(note_number)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Note", note_number.to_string()))?;

        let scheduling = load_scheduling(&mut *conn, &note.scheduling_id)
            .await?
            .ok_or_else(|| DbError::not_found("Scheduling", &note.scheduling_id))?;

        let (tutor_name, pet_name): (String, String) = sqlx::query_as(
            r#"
            SELECT t.name, p.name
            FROM schedulings s
            INNER JOIN tutors t ON t.id = s.tutor_id
            INNER JOIN pets p ON p.id = s.pet_id
            WHERE s.id = ?1
            "#,
        )
        .bind(&scheduling.id)
        .fetch_one(&mut *conn)
        .await?;

        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT s.id, s.name, s.description, s.price, s.created_at, s.updated_at
            FROM services s
            INNER JOIN scheduling_services ss ON ss.service_id = s.id
            WHERE ss.scheduling_id = ?1
            ORDER BY s.name
            "#,
        )
        .bind(&scheduling.id)
        .fetch_all(&mut *conn)
        .await?;

        let discount_amount = pricing::discount_amount(&scheduling);

        Ok(NoteDetail {
            note,
            scheduling,
            tutor_name,
            pet_name,
            services,
            discount_amount,
        })
    }
}

/// Loads the note of a scheduling on an existing connection or transaction.
pub(crate) async fn load_note_for(
    conn: &mut SqliteConnection,
    scheduling_id: &str,
) -> DbResult<Option<Note>> {
    let note = sqlx::query_as::<_, Note>(
        "SELECT note_number, scheduling_id, issue_date FROM notes WHERE scheduling_id = ?1",
    )
    .bind(scheduling_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(note)
}

/// Another caller inserted the note between our check and our insert.
async fn lost_race(conn: &mut SqliteConnection, scheduling_id: &str) -> DbError {
    match load_note_for(conn, scheduling_id).await {
        Ok(Some(note)) => {
            warn!(
                scheduling_id = %scheduling_id,
                note_number = note.note_number,
                "Concurrent issuance lost; note already exists"
            );
            IssuanceError::AlreadyIssued {
                scheduling_id: scheduling_id.to_string(),
                note_number: note.note_number,
            }
            .into()
        }
        Ok(None) => DbError::Internal(format!(
            "note for scheduling {} conflicted but is missing",
            scheduling_id
        )),
        Err(err) => err,
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
    use chrono::NaiveDate;
    use daycare_core::{
        Action, DiscountRate, EntityKind, ModelPermissions, Money, PaymentStatus, Scheduling,
        SchedulingDraft,
    };

    async fn paid_scheduling(status: PaymentStatus) -> (Database, Scheduling) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tutor = db
            .tutors()
            .insert(&NewTutor {
                name: "Ana".to_string(),
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

        let scheduling = db
            .schedulings()
            .save(&SchedulingDraft {
                id: None,
                tutor_id: tutor.id,
                pet_id: pet.id,
                service_ids: vec![bath.id, grooming.id],
                date_scheduling: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                status,
                percentage_discount: DiscountRate::from_percent(20),
                observations: None,
            })
            .await
            .unwrap();

        (db, scheduling)
    }

    fn clerk() -> Actor {
        Actor::new("clerk").with_permission(Action::Add, EntityKind::Note)
    }

    #[tokio::test]
    async fn test_issue_paid_scheduling() {
        let (db, scheduling) = paid_scheduling(PaymentStatus::Paid).await;

        let note = db.notes().issue(&scheduling.id, &clerk(), &ModelPermissions).await.unwrap();
        assert_eq!(note.scheduling_id, scheduling.id);

        let by_number = db.notes().get(note.note_number).await.unwrap().unwrap();
        assert_eq!(by_number, note);
        let by_scheduling = db.notes().get_for_scheduling(&scheduling.id).await.unwrap();
        assert_eq!(by_scheduling, Some(note));
    }

    #[tokio::test]
    async fn test_pending_payment_rejected() {
        let (db, scheduling) = paid_scheduling(PaymentStatus::Pending).await;

        let err = db
            .notes()
            .issue(&scheduling.id, &clerk(), &ModelPermissions)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "PAYMENT_PENDING");
        assert!(db.notes().get_for_scheduling(&scheduling.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_issue_reports_existing_note() {
        let (db, scheduling) = paid_scheduling(PaymentStatus::Paid).await;

        let first = db.notes().issue(&scheduling.id, &clerk(), &ModelPermissions).await.unwrap();
        let err = db
            .notes()
            .issue(&scheduling.id, &clerk(), &ModelPermissions)
            .await
            .unwrap_err();

        assert_eq!(
            err.as_issuance(),
            Some(&IssuanceError::AlreadyIssued {
                scheduling_id: scheduling.id.clone(),
                note_number: first.note_number,
            })
        );
    }

    #[tokio::test]
    async fn test_permission_denied_writes_nothing() {
        let (db, scheduling) = paid_scheduling(PaymentStatus::Paid).await;

        let err = db
            .notes()
            .issue(&scheduling.id, &Actor::new("visitor"), &ModelPermissions)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PERMISSION_DENIED");

        let inactive_admin = Actor::superuser("old-admin").inactive();
        let err = db
            .notes()
            .issue(&scheduling.id, &inactive_admin, &ModelPermissions)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PERMISSION_DENIED");

        assert!(db.notes().get_for_scheduling(&scheduling.id).await.unwrap().is_none());
    }

    /// Allows everything and counts how often it was asked.
    #[derive(Default)]
    struct CountingAuthorizer {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl Authorizer for CountingAuthorizer {
        fn can(&self, _actor: &Actor, _action: Action, _entity: EntityKind) -> bool {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_permission_asked_once_per_issue() {
        let (db, scheduling) = paid_scheduling(PaymentStatus::Paid).await;
        let authorizer = CountingAuthorizer::default();

        db.notes()
            .issue(&scheduling.id, &Actor::new("clerk"), &authorizer)
            .await
            .unwrap();
        assert_eq!(authorizer.calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        db.notes()
            .issue(&scheduling.id, &Actor::new("clerk"), &authorizer)
            .await
            .unwrap_err();
        assert_eq!(authorizer.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_scheduling() {
        let (db, _) = paid_scheduling(PaymentStatus::Paid).await;
        let err = db
            .notes()
            .issue("missing", &clerk(), &ModelPermissions)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Permission is decided before the scheduling is looked up
        let err = db
            .notes()
            .issue("missing", &Actor::new("visitor"), &ModelPermissions)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_issuance(),
            Some(IssuanceError::PermissionDenied { scheduling_id, .. }) if scheduling_id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_note_numbers_increase() {
        let (db, first) = paid_scheduling(PaymentStatus::Paid).await;
        let mut draft = SchedulingDraft {
            id: None,
            tutor_id: first.tutor_id.clone(),
            pet_id: first.pet_id.clone(),
            service_ids: first.service_ids.clone(),
            date_scheduling: first.date_scheduling,
            status: PaymentStatus::Paid,
            percentage_discount: DiscountRate::zero(),
            observations: None,
        };
        let second = db.schedulings().save(&draft).await.unwrap();
        draft.observations = Some("third".to_string());
        let third = db.schedulings().save(&draft).await.unwrap();

        let a = db.notes().issue(&first.id, &clerk(), &ModelPermissions).await.unwrap();
        let b = db.notes().issue(&second.id, &clerk(), &ModelPermissions).await.unwrap();

        // Deleting a scheduling never frees its number
        db.schedulings().delete(&second.id).await.unwrap();
        let c = db.notes().issue(&third.id, &clerk(), &ModelPermissions).await.unwrap();

        assert!(a.note_number < b.note_number);
        assert!(b.note_number < c.note_number);
    }

    #[tokio::test]
    async fn test_detail() {
        let (db, scheduling) = paid_scheduling(PaymentStatus::Paid).await;
        let note = db.notes().issue(&scheduling.id, &clerk(), &ModelPermissions).await.unwrap();

        let detail = db.notes().detail(note.note_number).await.unwrap();

        assert_eq!(detail.note, note);
        assert_eq!(detail.tutor_name, "Ana");
        assert_eq!(detail.pet_name, "Rex");
        assert_eq!(detail.services.len(), 2);
        assert_eq!(detail.scheduling.gross_total_value.cents(), 6500);
        assert_eq!(detail.scheduling.total_value.cents(), 5200);
        assert_eq!(detail.discount_amount.cents(), 1300);

        assert!(matches!(
            db.notes().detail(note.note_number + 100).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
