use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{MetricsError, Result};
use crate::models::{CommunicationEvent, InstitutionProfile, LeadRecord, LeadStatus, TutorProfile};
use crate::repository::{stamp_institution, stamp_tutor, LeadRepository, ProfileRepository};

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

const LEAD_COLUMNS: &str = "id, institution_id, student_name, student_email, phone, \
     course_interest, status, priority, communication_history, inquiry_date";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_lead(&self, query: &str, id: Uuid) -> Result<LeadRecord> {
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MetricsError::not_found("lead", id))?;
        lead_from_row(&row)
    }
}

fn lead_from_row(row: &PgRow) -> Result<LeadRecord> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    let history: Json<Vec<CommunicationEvent>> = row.try_get("communication_history")?;

    Ok(LeadRecord {
        id: row.try_get("id")?,
        institution_id: row.try_get("institution_id")?,
        student_name: row.try_get("student_name")?,
        student_email: row.try_get("student_email")?,
        phone: row.try_get("phone")?,
        course_interest: row.try_get("course_interest")?,
        status: status.parse()?,
        priority: priority.parse()?,
        communication_history: history.0,
        inquiry_date: row.try_get("inquiry_date")?,
    })
}

fn completion_from_row(row: &PgRow) -> Result<u8> {
    let stored: i16 = row.try_get("profile_completion")?;
    Ok(stored.clamp(0, 100) as u8)
}

impl ProfileRepository for PgStore {
    async fn load_institution(&self, id: Uuid) -> Result<InstitutionProfile> {
        let row = sqlx::query(
            r#"
            SELECT id, institution_name, institution_type, description, address, city, state,
                   pincode, phone, email, website, established_year, total_students,
                   courses_offered, facilities, accreditations, has_hostel,
                   offers_online_classes, profile_completion, updated_at
            FROM dashboard.institution_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| MetricsError::not_found("institution profile", id))?;

        Ok(InstitutionProfile {
            id: row.try_get("id")?,
            institution_name: row.try_get("institution_name")?,
            institution_type: row.try_get("institution_type")?,
            description: row.try_get("description")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            pincode: row.try_get("pincode")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            website: row.try_get("website")?,
            established_year: row.try_get("established_year")?,
            total_students: row.try_get("total_students")?,
            courses_offered: row.try_get("courses_offered")?,
            facilities: row.try_get("facilities")?,
            accreditations: row.try_get("accreditations")?,
            has_hostel: row.try_get("has_hostel")?,
            offers_online_classes: row.try_get("offers_online_classes")?,
            profile_completion: completion_from_row(&row)?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn save_institution(&self, profile: &InstitutionProfile) -> Result<InstitutionProfile> {
        let stamped = stamp_institution(profile, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO dashboard.institution_profiles
            (id, institution_name, institution_type, description, address, city, state,
             pincode, phone, email, website, established_year, total_students,
             courses_offered, facilities, accreditations, has_hostel,
             offers_online_classes, profile_completion, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20)
            ON CONFLICT (id) DO UPDATE
            SET institution_name = EXCLUDED.institution_name,
                institution_type = EXCLUDED.institution_type,
                description = EXCLUDED.description,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                pincode = EXCLUDED.pincode,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                website = EXCLUDED.website,
                established_year = EXCLUDED.established_year,
                total_students = EXCLUDED.total_students,
                courses_offered = EXCLUDED.courses_offered,
                facilities = EXCLUDED.facilities,
                accreditations = EXCLUDED.accreditations,
                has_hostel = EXCLUDED.has_hostel,
                offers_online_classes = EXCLUDED.offers_online_classes,
                profile_completion = EXCLUDED.profile_completion,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(stamped.id)
        .bind(&stamped.institution_name)
        .bind(&stamped.institution_type)
        .bind(&stamped.description)
        .bind(&stamped.address)
        .bind(&stamped.city)
        .bind(&stamped.state)
        .bind(&stamped.pincode)
        .bind(&stamped.phone)
        .bind(&stamped.email)
        .bind(&stamped.website)
        .bind(stamped.established_year)
        .bind(stamped.total_students)
        .bind(&stamped.courses_offered)
        .bind(&stamped.facilities)
        .bind(&stamped.accreditations)
        .bind(stamped.has_hostel)
        .bind(stamped.offers_online_classes)
        .bind(i16::from(stamped.profile_completion))
        .bind(stamped.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(stamped)
    }

    async fn load_tutor(&self, id: Uuid) -> Result<TutorProfile> {
        let row = sqlx::query(
            r#"
            SELECT id, full_name, bio, qualification, city, phone, experience_years,
                   hourly_rate, subjects, teaching_modes, languages, offers_demo_class,
                   is_verified, profile_completion, updated_at
            FROM dashboard.tutor_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| MetricsError::not_found("tutor profile", id))?;

        Ok(TutorProfile {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            bio: row.try_get("bio")?,
            qualification: row.try_get("qualification")?,
            city: row.try_get("city")?,
            phone: row.try_get("phone")?,
            experience_years: row.try_get("experience_years")?,
            hourly_rate: row.try_get("hourly_rate")?,
            subjects: row.try_get("subjects")?,
            teaching_modes: row.try_get("teaching_modes")?,
            languages: row.try_get("languages")?,
            offers_demo_class: row.try_get("offers_demo_class")?,
            is_verified: row.try_get("is_verified")?,
            profile_completion: completion_from_row(&row)?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn save_tutor(&self, profile: &TutorProfile) -> Result<TutorProfile> {
        let stamped = stamp_tutor(profile, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO dashboard.tutor_profiles
            (id, full_name, bio, qualification, city, phone, experience_years, hourly_rate,
             subjects, teaching_modes, languages, offers_demo_class, is_verified,
             profile_completion, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                bio = EXCLUDED.bio,
                qualification = EXCLUDED.qualification,
                city = EXCLUDED.city,
                phone = EXCLUDED.phone,
                experience_years = EXCLUDED.experience_years,
                hourly_rate = EXCLUDED.hourly_rate,
                subjects = EXCLUDED.subjects,
                teaching_modes = EXCLUDED.teaching_modes,
                languages = EXCLUDED.languages,
                offers_demo_class = EXCLUDED.offers_demo_class,
                is_verified = EXCLUDED.is_verified,
                profile_completion = EXCLUDED.profile_completion,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(stamped.id)
        .bind(&stamped.full_name)
        .bind(&stamped.bio)
        .bind(&stamped.qualification)
        .bind(&stamped.city)
        .bind(&stamped.phone)
        .bind(stamped.experience_years)
        .bind(stamped.hourly_rate)
        .bind(&stamped.subjects)
        .bind(&stamped.teaching_modes)
        .bind(&stamped.languages)
        .bind(stamped.offers_demo_class)
        .bind(stamped.is_verified)
        .bind(i16::from(stamped.profile_completion))
        .bind(stamped.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(stamped)
    }
}

impl LeadRepository for PgStore {
    async fn list_leads(&self, institution_id: Uuid) -> Result<Vec<LeadRecord>> {
        let query = format!(
            "SELECT {LEAD_COLUMNS} FROM dashboard.student_inquiries \
             WHERE institution_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query(&query)
            .bind(institution_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(lead_from_row).collect()
    }

    async fn load_lead(&self, id: Uuid) -> Result<LeadRecord> {
        let query = format!("SELECT {LEAD_COLUMNS} FROM dashboard.student_inquiries WHERE id = $1");
        self.fetch_lead(&query, id).await
    }

    async fn insert_lead(&self, lead: &LeadRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO dashboard.student_inquiries
            (id, institution_id, student_name, student_email, phone, course_interest,
             status, priority, communication_history, inquiry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(lead.id)
        .bind(lead.institution_id)
        .bind(&lead.student_name)
        .bind(&lead.student_email)
        .bind(&lead.phone)
        .bind(&lead.course_interest)
        .bind(lead.status.as_str())
        .bind(lead.priority.as_str())
        .bind(Json(&lead.communication_history))
        .bind(&lead.inquiry_date)
        .execute(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                MetricsError::not_found("institution profile", lead.institution_id)
            }
            other => MetricsError::Database(other),
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_lead_status(&self, id: Uuid, status: LeadStatus) -> Result<LeadRecord> {
        let query = format!(
            "UPDATE dashboard.student_inquiries SET status = $2 WHERE id = $1 \
             RETURNING {LEAD_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MetricsError::not_found("lead", id))?;
        lead_from_row(&row)
    }

    async fn append_communication(&self, id: Uuid, event: &CommunicationEvent) -> Result<LeadRecord> {
        let query = format!(
            "UPDATE dashboard.student_inquiries \
             SET communication_history = communication_history || $2::jsonb \
             WHERE id = $1 RETURNING {LEAD_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(Json(vec![event]))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MetricsError::not_found("lead", id))?;
        lead_from_row(&row)
    }

    async fn delete_lead(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM dashboard.student_inquiries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MetricsError::not_found("lead", id));
        }
        Ok(())
    }
}
