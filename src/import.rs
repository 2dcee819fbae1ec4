use std::path::Path;

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{MetricsError, Result};
use crate::models::{
    CommunicationEvent, ContactChannel, InstitutionProfile, LeadPriority, LeadRecord, LeadStatus,
    TutorProfile,
};
use crate::repository::{LeadRepository, ProfileRepository};

pub const SEED_INSTITUTION_ID: Uuid = Uuid::from_u128(0x3d7f5d6f_24f7_4e8e_8b4b_3e7e44b4a7b2);
pub const SEED_TUTOR_ID: Uuid = Uuid::from_u128(0x0c22f1f1_9184_4fd4_9b21_28c68a6a89dc);

pub async fn seed<S>(store: &S) -> Result<usize>
where
    S: ProfileRepository + LeadRepository,
{
    let mut institution = InstitutionProfile::new(SEED_INSTITUTION_ID, "Sunrise Academy");
    institution.institution_type = Some("coaching".to_string());
    institution.description = Some("Entrance exam coaching for grades 9-12".to_string());
    institution.city = Some("Pune".to_string());
    institution.state = Some("Maharashtra".to_string());
    institution.phone = Some("020-41234567".to_string());
    institution.email = Some("admissions@sunrise.example.com".to_string());
    institution.established_year = Some(2009);
    institution.courses_offered = vec!["JEE Main".to_string(), "NEET".to_string()];
    institution.has_hostel = Some(false);
    let saved = store.save_institution(&institution).await?;
    info!(id = %saved.id, completion = saved.profile_completion, "seeded institution");

    let mut tutor = TutorProfile::new(SEED_TUTOR_ID, "Jules Moreno");
    tutor.bio = Some("Physics tutor, ten years with board exam students".to_string());
    tutor.city = Some("Pune".to_string());
    tutor.experience_years = Some(10.0);
    tutor.hourly_rate = Some(800.0);
    tutor.subjects = vec!["Physics".to_string(), "Mathematics".to_string()];
    tutor.teaching_modes = vec!["online".to_string(), "home".to_string()];
    tutor.offers_demo_class = Some(true);
    let saved = store.save_tutor(&tutor).await?;
    info!(id = %saved.id, completion = saved.profile_completion, "seeded tutor");

    let first_call = CommunicationEvent {
        occurred_at: Utc
            .with_ymd_and_hms(2026, 10, 2, 11, 0, 0)
            .single()
            .ok_or_else(|| MetricsError::InvalidInput("invalid seed timestamp".to_string()))?,
        channel: ContactChannel::Call,
        note: "Asked about batch timings".to_string(),
    };

    let leads = vec![
        (
            0xa1u128,
            "Avery Lee",
            LeadStatus::New,
            LeadPriority::Medium,
            Vec::new(),
            "2026-10-15",
        ),
        (
            0xa2,
            "Kiara Patel",
            LeadStatus::Interested,
            LeadPriority::High,
            vec![first_call],
            "2026-10-01",
        ),
        (
            0xa3,
            "Rohan Mehta",
            LeadStatus::Closed,
            LeadPriority::Low,
            Vec::new(),
            "2026-08-20",
        ),
    ];

    let mut inserted = 0usize;
    for (suffix, name, status, priority, history, inquiry_date) in leads {
        let lead = LeadRecord {
            id: Uuid::from_u128(SEED_INSTITUTION_ID.as_u128() ^ suffix),
            institution_id: SEED_INSTITUTION_ID,
            student_name: name.to_string(),
            student_email: None,
            phone: None,
            course_interest: Some("JEE Main".to_string()),
            status,
            priority,
            communication_history: history,
            inquiry_date: inquiry_date.to_string(),
        };
        if store.insert_lead(&lead).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    lead_id: Option<Uuid>,
    institution_id: Uuid,
    student_name: String,
    student_email: Option<String>,
    phone: Option<String>,
    course_interest: Option<String>,
    status: String,
    priority: String,
    inquiry_date: String,
}

/// Imports inquiries from CSV; rows whose `lead_id` already exists are skipped.
pub async fn import_csv<S>(store: &S, csv_path: &Path) -> Result<usize>
where
    S: LeadRepository,
{
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let lead = LeadRecord {
            id: row.lead_id.unwrap_or_else(Uuid::new_v4),
            institution_id: row.institution_id,
            student_name: row.student_name,
            student_email: row.student_email,
            phone: row.phone,
            course_interest: row.course_interest,
            status: row.status.parse()?,
            priority: row.priority.parse()?,
            communication_history: Vec::new(),
            inquiry_date: row.inquiry_date,
        };

        if store.insert_lead(&lead).await? {
            inserted += 1;
        } else {
            debug!(lead_id = %lead.id, "lead already present, skipping");
        }
    }

    Ok(inserted)
}
