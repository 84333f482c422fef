//! # Seed Data Generator
//!
//! Populates the database with a demo teacher, companies and students,
//! then runs sample placement requests and prints each verdict.
//!
//! ## Usage
//! ```bash
//! # Default database (./staj_dev.db, or STAJ_DB_PATH if set)
//! cargo run -p staj-db --bin seed
//!
//! # Specify database path
//! cargo run -p staj-db --bin seed -- --db ./data/staj.db
//!
//! # More logging
//! RUST_LOG=debug cargo run -p staj-db --bin seed
//! ```
//!
//! ## Sample Requests
//! One request per outcome: accepted, missing insurance, field mismatch,
//! school-day conflict, company closed, double booking, quota full.

use std::env;

use chrono::NaiveDate;
use staj_core::{NewCompany, NewStudent, NewTeacher, PlacementRequest, Weekday, WeekdaySet};
use staj_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED_DB: &str = "./staj_dev.db";

fn days(list: &[Weekday]) -> WeekdaySet {
    list.iter().copied().collect()
}

fn date(month: u32, day: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(2025, month, day)
        .ok_or_else(|| format!("invalid date 2025-{month:02}-{day:02}").into())
}

fn student(name: &str, number: &str, field: &str, school_days: &[Weekday]) -> NewStudent {
    NewStudent {
        full_name: name.to_string(),
        school_number: number.to_string(),
        field_of_study: field.to_string(),
        sub_field: String::new(),
        class_name: "12-A".to_string(),
        school_days: days(school_days),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,staj=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("STAJ_DB_PATH").unwrap_or_else(|_| DEFAULT_SEED_DB.to_string());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Staj Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_SEED_DB})");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Staj Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.students().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} students", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Teacher
    let teacher = db
        .teachers()
        .create(&NewTeacher {
            full_name: "Mehmet Öztürk".to_string(),
            email: "mehmet.ozturk@okul.example".to_string(),
            inspection_days: days(&[Weekday::Thursday]),
        })
        .await?;
    println!("✓ Teacher: {}", teacher.full_name);

    // Companies
    let software = db
        .companies()
        .create(&NewCompany {
            name: "Yazılım A.Ş.".to_string(),
            address: "Ankara".to_string(),
            accepted_fields: vec!["Bilişim".to_string()],
            operating_days: WeekdaySet::workweek(),
            quota: 1,
        })
        .await?;
    let workshop = db
        .companies()
        .create(&NewCompany {
            name: "Elektrik Atölyesi".to_string(),
            address: "İstanbul".to_string(),
            accepted_fields: vec!["Elektrik".to_string()],
            operating_days: days(&[Weekday::Monday, Weekday::Tuesday, Weekday::Wednesday]),
            quota: 3,
        })
        .await?;
    println!("✓ Companies: {}, {}", software.name, workshop.name);

    // Students
    let students = db.students();
    let ayse = students
        .create(&student("Ayşe Yılmaz", "1001", "Bilişim", &[Weekday::Monday, Weekday::Tuesday]))
        .await?;
    let can = students
        .create(&student("Can Demir", "1002", "Bilişim", &[Weekday::Monday]))
        .await?;
    let elif = students
        .create(&student("Elif Kaya", "1003", "Elektrik", &[Weekday::Thursday, Weekday::Friday]))
        .await?;
    let uninsured = students
        .create(&student("Deniz Şahin", "1004", "Bilişim", &[Weekday::Monday]))
        .await?;

    students
        .register_document(&ayse.id, "ISG", "ayse_isg.pdf", "application/pdf")
        .await?;
    students.toggle_insurance_document(&can.id).await?;
    students
        .register_document(&elif.id, "ISG", "elif_isg.pdf", "application/pdf")
        .await?;
    println!("✓ Students: 4 (3 insured)");

    // Sample placement requests
    let wed_to_fri = days(&[Weekday::Wednesday, Weekday::Thursday, Weekday::Friday]);
    let request = |student_id: &str,
                   company_id: &str,
                   start: NaiveDate,
                   end: NaiveDate,
                   intern_days: &WeekdaySet| PlacementRequest {
        student_id: student_id.to_string(),
        company_id: company_id.to_string(),
        teacher_id: String::new(),
        start_date: start,
        end_date: end,
        intern_days: intern_days.clone(),
    };

    let spring = (date(3, 1)?, date(6, 1)?);
    let samples = [
        ("Ayşe → Yazılım", request(&ayse.id, &software.id, spring.0, spring.1, &wed_to_fri)),
        ("Deniz → Yazılım", request(&uninsured.id, &software.id, spring.0, spring.1, &wed_to_fri)),
        ("Can → Atölye", request(&can.id, &workshop.id, spring.0, spring.1, &days(&[Weekday::Wednesday]))),
        ("Elif → Atölye (Thu)", request(&elif.id, &workshop.id, spring.0, spring.1, &days(&[Weekday::Thursday]))),
        ("Elif → Atölye (Mon)", request(&elif.id, &workshop.id, spring.0, spring.1, &days(&[Weekday::Monday, Weekday::Saturday]))),
        ("Ayşe → Yazılım again", request(&ayse.id, &software.id, date(5, 1)?, date(7, 1)?, &wed_to_fri)),
        ("Can → Yazılım", request(&can.id, &software.id, date(4, 1)?, date(4, 30)?, &wed_to_fri)),
        ("Elif → Atölye", request(&elif.id, &workshop.id, spring.0, spring.1, &days(&[Weekday::Tuesday]))),
    ];

    println!();
    println!("Running sample placement requests...");

    let service = db.placement_service();
    for (label, req) in samples {
        let response = service.create_placement(req, &teacher.id).await;
        let mark = if response.success { "✓" } else { "✗" };
        println!("  {mark} {label}: {}", response.message);
    }

    let schedule = db.teachers().inspection_schedule(&teacher.id).await?;
    println!();
    println!(
        "✓ {} coordinates {} placement(s), inspects on {}",
        teacher.full_name,
        schedule.assigned_placements.len(),
        schedule.inspection_days
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
