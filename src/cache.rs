//! Offline store: every record lives in one JSON document on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{MetricsError, Result};
use crate::models::{CommunicationEvent, InstitutionProfile, LeadRecord, LeadStatus, TutorProfile};
use crate::repository::{stamp_institution, stamp_tutor, LeadRepository, ProfileRepository};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    institutions: BTreeMap<Uuid, InstitutionProfile>,
    #[serde(default)]
    tutors: BTreeMap<Uuid, TutorProfile>,
    #[serde(default)]
    leads: BTreeMap<Uuid, LeadRecord>,
}

/// Single-user store. Each operation reads, edits and rewrites the whole
/// document through one fixed temp file, so concurrent writers from separate
/// processes can clobber each other and lose updates.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CacheDocument> {
        if !self.path.exists() {
            return Ok(CacheDocument::default());
        }
        let bytes = std::fs::read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CacheDocument::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            MetricsError::Cache(format!("corrupt cache at {}: {e}", self.path.display()))
        })
    }

    fn write(&self, document: &CacheDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "cache written");
        Ok(())
    }

    fn update_lead<F>(&self, id: Uuid, apply: F) -> Result<LeadRecord>
    where
        F: FnOnce(&mut LeadRecord),
    {
        let mut document = self.read()?;
        let lead = document
            .leads
            .get_mut(&id)
            .ok_or_else(|| MetricsError::not_found("lead", id))?;
        apply(lead);
        let updated = lead.clone();
        self.write(&document)?;
        Ok(updated)
    }
}

impl ProfileRepository for LocalCache {
    async fn load_institution(&self, id: Uuid) -> Result<InstitutionProfile> {
        self.read()?
            .institutions
            .remove(&id)
            .ok_or_else(|| MetricsError::not_found("institution profile", id))
    }

    async fn save_institution(&self, profile: &InstitutionProfile) -> Result<InstitutionProfile> {
        let stamped = stamp_institution(profile, Utc::now())?;
        let mut document = self.read()?;
        document.institutions.insert(stamped.id, stamped.clone());
        self.write(&document)?;
        Ok(stamped)
    }

    async fn load_tutor(&self, id: Uuid) -> Result<TutorProfile> {
        self.read()?
            .tutors
            .remove(&id)
            .ok_or_else(|| MetricsError::not_found("tutor profile", id))
    }

    async fn save_tutor(&self, profile: &TutorProfile) -> Result<TutorProfile> {
        let stamped = stamp_tutor(profile, Utc::now())?;
        let mut document = self.read()?;
        document.tutors.insert(stamped.id, stamped.clone());
        self.write(&document)?;
        Ok(stamped)
    }
}

impl LeadRepository for LocalCache {
    async fn list_leads(&self, institution_id: Uuid) -> Result<Vec<LeadRecord>> {
        Ok(self
            .read()?
            .leads
            .into_values()
            .filter(|lead| lead.institution_id == institution_id)
            .collect())
    }

    async fn load_lead(&self, id: Uuid) -> Result<LeadRecord> {
        self.read()?
            .leads
            .remove(&id)
            .ok_or_else(|| MetricsError::not_found("lead", id))
    }

    async fn insert_lead(&self, lead: &LeadRecord) -> Result<bool> {
        let mut document = self.read()?;
        if !document.institutions.contains_key(&lead.institution_id) {
            return Err(MetricsError::not_found(
                "institution profile",
                lead.institution_id,
            ));
        }
        if document.leads.contains_key(&lead.id) {
            return Ok(false);
        }
        document.leads.insert(lead.id, lead.clone());
        self.write(&document)?;
        Ok(true)
    }

    async fn update_lead_status(&self, id: Uuid, status: LeadStatus) -> Result<LeadRecord> {
        self.update_lead(id, |lead| lead.status = status)
    }

    async fn append_communication(&self, id: Uuid, event: &CommunicationEvent) -> Result<LeadRecord> {
        self.update_lead(id, |lead| lead.communication_history.push(event.clone()))
    }

    async fn delete_lead(&self, id: Uuid) -> Result<()> {
        let mut document = self.read()?;
        if document.leads.remove(&id).is_none() {
            return Err(MetricsError::not_found("lead", id));
        }
        self.write(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactChannel, LeadPriority};

    fn sample_lead(institution_id: Uuid) -> LeadRecord {
        LeadRecord {
            id: Uuid::new_v4(),
            institution_id,
            student_name: "Jules Moreno".to_string(),
            student_email: Some("jules@example.com".to_string()),
            phone: None,
            course_interest: Some("Spoken English".to_string()),
            status: LeadStatus::New,
            priority: LeadPriority::Medium,
            communication_history: Vec::new(),
            inquiry_date: "2026-10-10".to_string(),
        }
    }

    #[tokio::test]
    async fn saved_institution_carries_completion() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let mut profile = InstitutionProfile::new(Uuid::new_v4(), "Sunrise Academy");
        profile.city = Some("Pune".to_string());
        profile.has_hostel = Some(false);
        profile.facilities = vec!["Library".to_string()];

        let saved = cache.save_institution(&profile).await.unwrap();
        assert_eq!(saved.profile_completion, 24);
        assert!(saved.updated_at.is_some());

        let loaded = cache.load_institution(profile.id).await.unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn lead_lifecycle_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("nested").join("cache.json"));
        let institution_id = Uuid::new_v4();
        cache
            .save_institution(&InstitutionProfile::new(institution_id, "Sunrise Academy"))
            .await
            .unwrap();
        let lead = sample_lead(institution_id);

        assert!(cache.insert_lead(&lead).await.unwrap());
        assert!(!cache.insert_lead(&lead).await.unwrap());

        let updated = cache
            .update_lead_status(lead.id, LeadStatus::Interested)
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Interested);

        let event = CommunicationEvent {
            occurred_at: Utc::now(),
            channel: ContactChannel::Whatsapp,
            note: "Shared fee structure".to_string(),
        };
        let updated = cache.append_communication(lead.id, &event).await.unwrap();
        assert_eq!(updated.communication_history, vec![event]);

        let listed = cache.list_leads(institution_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], updated);

        cache.delete_lead(lead.id).await.unwrap();
        assert!(matches!(
            cache.load_lead(lead.id).await.unwrap_err(),
            MetricsError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn leads_need_a_saved_institution() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let lead = sample_lead(Uuid::new_v4());

        let err = cache.insert_lead(&lead).await.unwrap_err();
        assert!(matches!(
            err,
            MetricsError::NotFound {
                entity: "institution profile",
                ..
            }
        ));
        assert!(matches!(
            cache.load_lead(lead.id).await.unwrap_err(),
            MetricsError::NotFound { entity: "lead", .. }
        ));
    }

    #[tokio::test]
    async fn status_update_works_on_an_inserted_lead() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let institution_id = Uuid::new_v4();
        cache
            .save_institution(&InstitutionProfile::new(institution_id, "Sunrise Academy"))
            .await
            .unwrap();
        let lead = sample_lead(institution_id);
        cache.insert_lead(&lead).await.unwrap();

        let updated = cache
            .update_lead_status(lead.id, LeadStatus::Interested)
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Interested);
        assert_eq!(
            cache.load_lead(lead.id).await.unwrap().status,
            LeadStatus::Interested
        );
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let err = cache
            .update_lead_status(Uuid::new_v4(), LeadStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, MetricsError::NotFound { entity: "lead", .. }));
        assert!(cache.load_tutor(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn corrupt_cache_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{not json").unwrap();
        let cache = LocalCache::new(&path);
        assert!(matches!(
            cache.list_leads(Uuid::new_v4()).await.unwrap_err(),
            MetricsError::Cache(_)
        ));
    }
}
