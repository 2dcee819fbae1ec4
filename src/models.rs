use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::completion::ProfileFieldSet;
use crate::error::MetricsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    Tutor,
    Institution,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Tutor => "tutor",
            ProfileRole::Institution => "institution",
        }
    }
}

impl FromStr for ProfileRole {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tutor" => Ok(ProfileRole::Tutor),
            "institution" => Ok(ProfileRole::Institution),
            other => Err(MetricsError::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionProfile {
    pub id: Uuid,
    pub institution_name: String,
    pub institution_type: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub established_year: Option<i32>,
    pub total_students: Option<i32>,
    #[serde(default)]
    pub courses_offered: Vec<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub accreditations: Vec<String>,
    pub has_hostel: Option<bool>,
    pub offers_online_classes: Option<bool>,
    #[serde(default)]
    pub profile_completion: u8,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InstitutionProfile {
    /// Blank profile shown by the signup wizard before anything is fetched.
    pub fn new(id: Uuid, institution_name: impl Into<String>) -> Self {
        Self {
            id,
            institution_name: institution_name.into(),
            institution_type: None,
            description: None,
            address: None,
            city: None,
            state: None,
            pincode: None,
            phone: None,
            email: None,
            website: None,
            established_year: None,
            total_students: None,
            courses_offered: Vec::new(),
            facilities: Vec::new(),
            accreditations: Vec::new(),
            has_hostel: None,
            offers_online_classes: None,
            profile_completion: 0,
            updated_at: None,
        }
    }

    pub fn completion_fields(&self) -> ProfileFieldSet {
        ProfileFieldSet::new()
            .text("institution_name", Some(self.institution_name.as_str()))
            .text("institution_type", self.institution_type.as_deref())
            .text("description", self.description.as_deref())
            .text("address", self.address.as_deref())
            .text("city", self.city.as_deref())
            .text("state", self.state.as_deref())
            .text("pincode", self.pincode.as_deref())
            .text("phone", self.phone.as_deref())
            .text("email", self.email.as_deref())
            .text("website", self.website.as_deref())
            .number("established_year", self.established_year.map(f64::from))
            .number("total_students", self.total_students.map(f64::from))
            .list("courses_offered", &self.courses_offered)
            .list("facilities", &self.facilities)
            .list("accreditations", &self.accreditations)
            .tri_state("has_hostel", self.has_hostel)
            .tri_state("offers_online_classes", self.offers_online_classes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorProfile {
    pub id: Uuid,
    pub full_name: String,
    pub bio: Option<String>,
    pub qualification: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub experience_years: Option<f64>,
    pub hourly_rate: Option<f64>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub teaching_modes: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub offers_demo_class: Option<bool>,
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub profile_completion: u8,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TutorProfile {
    pub fn new(id: Uuid, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            bio: None,
            qualification: None,
            city: None,
            phone: None,
            experience_years: None,
            hourly_rate: None,
            subjects: Vec::new(),
            teaching_modes: Vec::new(),
            languages: Vec::new(),
            offers_demo_class: None,
            is_verified: None,
            profile_completion: 0,
            updated_at: None,
        }
    }

    pub fn completion_fields(&self) -> ProfileFieldSet {
        ProfileFieldSet::new()
            .text("full_name", Some(self.full_name.as_str()))
            .text("bio", self.bio.as_deref())
            .text("qualification", self.qualification.as_deref())
            .text("city", self.city.as_deref())
            .text("phone", self.phone.as_deref())
            .number("experience_years", self.experience_years)
            .number("hourly_rate", self.hourly_rate)
            .list("subjects", &self.subjects)
            .list("teaching_modes", &self.teaching_modes)
            .list("languages", &self.languages)
            .tri_state("offers_demo_class", self.offers_demo_class)
            .tri_state("is_verified", self.is_verified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Interested,
    Admitted,
    Closed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Interested,
        LeadStatus::Admitted,
        LeadStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Interested => "interested",
            LeadStatus::Admitted => "admitted",
            LeadStatus::Closed => "closed",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| MetricsError::InvalidInput(format!("unknown lead status '{value}'")))
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadPriority {
    High,
    Medium,
    Low,
}

impl LeadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadPriority::High => "high",
            LeadPriority::Medium => "medium",
            LeadPriority::Low => "low",
        }
    }
}

impl FromStr for LeadPriority {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(LeadPriority::High),
            "medium" => Ok(LeadPriority::Medium),
            "low" => Ok(LeadPriority::Low),
            _ => Err(MetricsError::InvalidInput(format!(
                "unknown lead priority '{value}'"
            ))),
        }
    }
}

impl fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    Call,
    Email,
    Whatsapp,
    Visit,
    Other,
}

impl FromStr for ContactChannel {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "call" | "phone" => Ok(ContactChannel::Call),
            "email" => Ok(ContactChannel::Email),
            "whatsapp" => Ok(ContactChannel::Whatsapp),
            "visit" => Ok(ContactChannel::Visit),
            "other" => Ok(ContactChannel::Other),
            _ => Err(MetricsError::InvalidInput(format!(
                "unknown contact channel '{value}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationEvent {
    pub occurred_at: DateTime<Utc>,
    pub channel: ContactChannel,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: Uuid,
    pub institution_id: Uuid,
    pub student_name: String,
    pub student_email: Option<String>,
    pub phone: Option<String>,
    pub course_interest: Option<String>,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    #[serde(default)]
    pub communication_history: Vec<CommunicationEvent>,
    /// Raw persisted value; parsed when the lead is scored.
    pub inquiry_date: String,
}
