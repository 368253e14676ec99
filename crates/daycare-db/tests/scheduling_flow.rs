//! End-to-end flow: services → scheduling → payment → note.

use chrono::NaiveDate;
use daycare_core::{
    Action, Actor, DiscountRate, EntityKind, IssuanceError, ModelPermissions, Money,
    PaymentStatus, SchedulingDraft,
};
use daycare_core::SchedulingFilter;
use daycare_db::{Database, DbConfig, DbError, NewPet, NewService, NewTutor};
use std::path::{Path, PathBuf};

struct Seeded {
    db: Database,
    tutor_id: String,
    pet_id: String,
}

async fn seeded(config: DbConfig) -> Seeded {
    let db = Database::new(config).await.unwrap();
    let tutor = db
        .tutors()
        .insert(&NewTutor {
            name: "Ana Souza".to_string(),
            cpf: "123.456.789-09".to_string(),
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

    Seeded {
        db,
        tutor_id: tutor.id,
        pet_id: pet.id,
    }
}

async fn service(db: &Database, name: &str, price: &str) -> String {
    db.services()
        .insert(&NewService::new(name, price.parse::<Money>().unwrap()))
        .await
        .unwrap()
        .id
}

fn draft(s: &Seeded, services: Vec<String>, discount: &str, status: PaymentStatus) -> SchedulingDraft {
    SchedulingDraft {
        id: None,
        tutor_id: s.tutor_id.clone(),
        pet_id: s.pet_id.clone(),
        service_ids: services,
        date_scheduling: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
        status,
        percentage_discount: discount.parse::<DiscountRate>().unwrap(),
        observations: None,
    }
}

fn clerk() -> Actor {
    Actor::new("clerk").with_permission(Action::Add, EntityKind::Note)
}

#[tokio::test]
async fn totals_survive_save_and_read_back() {
    let s = seeded(DbConfig::in_memory()).await;
    let a = service(&s.db, "Bath", "50.00").await;
    let b = service(&s.db, "Grooming", "30.00").await;

    let saved = s
        .db
        .schedulings()
        .save(&draft(&s, vec![a, b], "10", PaymentStatus::Pending))
        .await
        .unwrap();

    let loaded = s.db.schedulings().get(&saved.id).await.unwrap().unwrap();
    assert_eq!(loaded.gross_total_value.to_string(), "R$ 80.00");
    assert_eq!(loaded.total_value.to_string(), "R$ 72.00");
}

#[tokio::test]
async fn pending_then_paid_then_issued_once() {
    let s = seeded(DbConfig::in_memory()).await;
    let bath = service(&s.db, "Bath", "40.00").await;
    let grooming = service(&s.db, "Grooming", "25.00").await;

    let scheduling = s
        .db
        .schedulings()
        .save(&draft(&s, vec![bath, grooming], "20", PaymentStatus::Pending))
        .await
        .unwrap();
    assert_eq!(scheduling.gross_total_value.cents(), 6500);
    assert_eq!(scheduling.total_value.cents(), 5200);

    let err = s
        .db
        .notes()
        .issue(&scheduling.id, &clerk(), &ModelPermissions)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_issuance(),
        Some(&IssuanceError::PaymentPending {
            scheduling_id: scheduling.id.clone()
        })
    );

    s.db
        .schedulings()
        .set_status(&scheduling.id, PaymentStatus::Paid)
        .await
        .unwrap();

    let note = s
        .db
        .notes()
        .issue(&scheduling.id, &clerk(), &ModelPermissions)
        .await
        .unwrap();

    let err = s
        .db
        .notes()
        .issue(&scheduling.id, &clerk(), &ModelPermissions)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_issuance(),
        Some(&IssuanceError::AlreadyIssued {
            scheduling_id: scheduling.id.clone(),
            note_number: note.note_number,
        })
    );

    let detail = s.db.notes().detail(note.note_number).await.unwrap();
    assert_eq!(detail.discount_amount.cents(), 1300);
}

#[tokio::test]
async fn editing_only_the_discount_recomputes() {
    let s = seeded(DbConfig::in_memory()).await;
    let bath = service(&s.db, "Bath", "40.00").await;

    let saved = s
        .db
        .schedulings()
        .save(&draft(&s, vec![bath.clone()], "0", PaymentStatus::Pending))
        .await
        .unwrap();
    assert_eq!(saved.total_value.cents(), 4000);

    let mut edit = draft(&s, vec![bath], "12.5", PaymentStatus::Pending);
    edit.id = Some(saved.id.clone());
    let edited = s.db.schedulings().save(&edit).await.unwrap();

    assert_eq!(edited.gross_total_value.cents(), 4000);
    assert_eq!(edited.total_value.cents(), 3500);
}

#[tokio::test]
async fn failed_edit_leaves_previous_state() {
    let s = seeded(DbConfig::in_memory()).await;
    let bath = service(&s.db, "Bath", "40.00").await;

    let saved = s
        .db
        .schedulings()
        .save(&draft(&s, vec![bath.clone()], "10", PaymentStatus::Pending))
        .await
        .unwrap();

    let mut edit = draft(&s, vec![bath.clone(), "ghost".to_string()], "50", PaymentStatus::Pending);
    edit.id = Some(saved.id.clone());
    let err = s.db.schedulings().save(&edit).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

    let loaded = s.db.schedulings().get(&saved.id).await.unwrap().unwrap();
    assert_eq!(loaded.service_ids, vec![bath]);
    assert_eq!(loaded.percentage_discount, DiscountRate::from_percent(10));
    assert_eq!(loaded.total_value.cents(), 3600);
}

async fn race_for_one_note(db: &Database, scheduling_id: &str, callers: usize) {
    let mut handles = Vec::new();
    for _ in 0..callers {
        let db = db.clone();
        let id = scheduling_id.to_string();
        handles.push(tokio::spawn(async move {
            db.notes().issue(&id, &clerk(), &ModelPermissions).await
        }));
    }

    let mut issued = Vec::new();
    let mut already = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(note) => issued.push(note),
            Err(err) => match err.as_issuance() {
                Some(IssuanceError::AlreadyIssued { note_number, .. }) => already.push(*note_number),
                _ => panic!("unexpected error: {err}"),
            },
        }
    }

    assert_eq!(issued.len(), 1);
    assert_eq!(already.len(), callers - 1);
    assert!(already.iter().all(|n| *n == issued[0].note_number));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_creates_one_note() {
    let s = seeded(DbConfig::in_memory()).await;
    let bath = service(&s.db, "Bath", "40.00").await;
    let scheduling = s
        .db
        .schedulings()
        .save(&draft(&s, vec![bath], "0", PaymentStatus::Paid))
        .await
        .unwrap();

    race_for_one_note(&s.db, &scheduling.id, 8).await;
}

fn temp_db_path(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}.db", prefix, uuid::Uuid::new_v4()))
}

fn remove_db_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_on_shared_file() {
    let path = temp_db_path("daycare-race");
    let s = seeded(DbConfig::new(&path).max_connections(8)).await;
    let bath = service(&s.db, "Bath", "40.00").await;
    let scheduling = s
        .db
        .schedulings()
        .save(&draft(&s, vec![bath], "0", PaymentStatus::Paid))
        .await
        .unwrap();

    race_for_one_note(&s.db, &scheduling.id, 8).await;

    s.db.close().await;
    remove_db_files(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_saves_on_shared_file_all_commit() {
    let path = temp_db_path("daycare-saves");
    let s = seeded(DbConfig::new(&path).max_connections(8)).await;
    let bath = service(&s.db, "Bath", "40.00").await;
    let grooming = service(&s.db, "Grooming", "25.00").await;

    let mut handles = Vec::new();
    for i in 0..64 {
        let db = s.db.clone();
        let services = if i % 2 == 0 {
            vec![bath.clone()]
        } else {
            vec![bath.clone(), grooming.clone()]
        };
        let input = draft(&s, services, "10", PaymentStatus::Pending);
        handles.push(tokio::spawn(async move { db.schedulings().save(&input).await }));
    }

    for handle in handles {
        let saved = match handle.await.unwrap() {
            Ok(saved) => saved,
            Err(err) => panic!("concurrent save failed: {err}"),
        };
        let expected = if saved.service_ids.len() == 1 { 3600 } else { 5850 };
        assert_eq!(saved.total_value.cents(), expected);
    }

    let all = s.db.schedulings().list(&SchedulingFilter::default()).await.unwrap();
    assert_eq!(all.len(), 64);

    // Edits of one scheduling racing each other also all commit
    let target = all[0].id.clone();
    let mut handles = Vec::new();
    for i in 0..16 {
        let db = s.db.clone();
        let mut edit = draft(&s, vec![bath.clone()], if i % 2 == 0 { "0" } else { "50" }, PaymentStatus::Pending);
        edit.id = Some(target.clone());
        handles.push(tokio::spawn(async move { db.schedulings().save(&edit).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let last = s.db.schedulings().get(&target).await.unwrap().unwrap();
    assert_eq!(last.gross_total_value.cents(), 4000);
    assert_eq!(last.total_value, last.gross_total_value.apply_discount(last.percentage_discount));

    s.db.close().await;
    remove_db_files(&path);
}
