//! # Seed Data Generator
//!
//! Populates the database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Uses DAYCARE_DB_PATH (default ./daycare.db)
//! cargo run -p daycare-db --bin seed
//!
//! # Specify database path
//! cargo run -p daycare-db --bin seed -- --db ./data/daycare_dev.db
//! ```
//!
//! ## Generated Data
//! - A few states with their main cities
//! - The service catalogue (bath, grooming, day care, ...)
//! - Tutors with one or two pets each
//! - One scheduling per pet, alternating paid/pending, with a note issued
//!   for every paid one

use chrono::{Duration, Utc};
use daycare_core::{
    Actor, DiscountRate, ModelPermissions, Money, PaymentStatus, PetSex, ReferralSource,
    SchedulingDraft,
};
use daycare_db::{Database, DbConfig, NewPet, NewService, NewTutor};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// States and cities: (name, abbreviation, cities)
const LOCATIONS: &[(&str, &str, &[&str])] = &[
    ("São Paulo", "SP", &["São Paulo", "Campinas", "Santos"]),
    ("Rio de Janeiro", "RJ", &["Rio de Janeiro", "Niterói"]),
    ("Minas Gerais", "MG", &["Belo Horizonte", "Uberlândia"]),
];

/// Service catalogue: (name, description, price)
const SERVICES: &[(&str, &str, &str)] = &[
    ("Bath", "Bath with neutral shampoo and drying", "40.00"),
    ("Grooming", "Hygienic or full grooming", "25.00"),
    ("Day Care", "Full day with play and rest", "80.00"),
    ("Nail Trim", "Nail trimming and paw care", "15.00"),
    ("Hydration", "Coat hydration treatment", "35.50"),
];

/// Tutors: (name, cpf, referral, pets as (name, species, sex))
const TUTORS: &[(&str, &str, ReferralSource, &[(&str, &str, PetSex)])] = &[
    (
        "Ana Souza",
        "123.456.789-09",
        ReferralSource::Internet,
        &[("Rex", "Dog", PetSex::Male), ("Mia", "Cat", PetSex::Female)],
    ),
    (
        "Bruno Lima",
        "987.654.321-00",
        ReferralSource::Friend,
        &[("Thor", "Dog", PetSex::Male)],
    ),
    (
        "Carla Mendes",
        "111.222.333-96",
        ReferralSource::VetReferral,
        &[("Luna", "Dog", PetSex::Female), ("Nina", "Cat", PetSex::Female)],
    ),
    (
        "Daniel Rocha",
        "444.555.666-72",
        ReferralSource::SocialMedia,
        &[("Bidu", "Dog", PetSex::Male)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,daycare=debug,sqlx=warn")),
        )
        .init();

    let mut config = DbConfig::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1])
                        .max_connections(config.max_connections)
                        .run_migrations(config.run_migrations);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pet Daycare Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $DAYCARE_DB_PATH or ./daycare.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");
    let db = Database::new(config).await?;

    let existing = db.tutors().count().await?;
    if existing > 0 {
        warn!(tutors = existing, "Database already has data; skipping seed");
        return Ok(());
    }

    // Locations
    let mut first_city = None;
    for (name, abbreviation, cities) in LOCATIONS {
        let state = db.locations().insert_state(name, abbreviation).await?;
        for city_name in cities.iter() {
            let city = db.locations().insert_city(&state.id, city_name).await?;
            first_city.get_or_insert((state.id.clone(), city.id));
        }
    }
    info!(states = LOCATIONS.len(), "Locations seeded");

    // Services
    let mut service_ids = Vec::new();
    for (name, description, price) in SERVICES {
        let mut input = NewService::new(*name, price.parse::<Money>()?);
        input.description = Some(description.to_string());
        service_ids.push(db.services().insert(&input).await?.id);
    }
    info!(services = service_ids.len(), "Services seeded");

    // Tutors, pets, schedulings
    let admin = Actor::superuser("seed");
    let today = Utc::now().date_naive();
    let mut scheduled = 0usize;
    let mut issued = 0usize;

    for (tutor_idx, (name, cpf, referral, pets)) in TUTORS.iter().enumerate() {
        let (state_id, city_id) = match &first_city {
            Some((state_id, city_id)) if tutor_idx % 2 == 0 => {
                (Some(state_id.clone()), Some(city_id.clone()))
            }
            _ => (None, None),
        };

        let tutor = db
            .tutors()
            .insert(&NewTutor {
                name: name.to_string(),
                cpf: cpf.to_string(),
                phone_number: Some(format!("(11) 9{:04}-{:04}", 1000 + tutor_idx, 2000 + tutor_idx)),
                email: None,
                address: None,
                state_id,
                city_id,
                referral_source: Some(*referral),
            })
            .await?;

        for (pet_name, species, sex) in pets.iter() {
            let pet = db
                .pets()
                .insert(&NewPet {
                    tutor_id: tutor.id.clone(),
                    name: pet_name.to_string(),
                    species: species.to_string(),
                    sex: Some(*sex),
                    ..Default::default()
                })
                .await?;

            let status = if scheduled % 2 == 0 {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            };
            let services: Vec<String> = service_ids
                .iter()
                .skip(scheduled % service_ids.len())
                .take(2)
                .cloned()
                .collect();

            let scheduling = db
                .schedulings()
                .save(&SchedulingDraft {
                    id: None,
                    tutor_id: tutor.id.clone(),
                    pet_id: pet.id,
                    service_ids: services,
                    date_scheduling: today + Duration::days(scheduled as i64 - 2),
                    status,
                    percentage_discount: DiscountRate::from_percent((scheduled as u32 % 3) * 5),
                    observations: None,
                })
                .await?;
            scheduled += 1;

            if status == PaymentStatus::Paid {
                db.notes().issue(&scheduling.id, &admin, &ModelPermissions).await?;
                issued += 1;
            }
        }
    }

    let summary = db.schedulings().dashboard(today).await?;
    info!(
        tutors = summary.total_tutors,
        pets = summary.total_pets,
        schedulings = scheduled,
        notes = issued,
        paid = %summary.total_paid,
        pending = %summary.total_pending,
        average_ticket = %summary.average_ticket,
        "Seed complete"
    );

    Ok(())
}
