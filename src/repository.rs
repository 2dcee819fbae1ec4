//! Storage seam for dashboard records.
//!
//! Views talk to a [`Store`], which is either the remote Postgres backend or
//! the on-disk JSON cache. The choice is made once, when the store is opened.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::LocalCache;
use crate::completion::compute_completion;
use crate::config::Config;
use crate::db::PgStore;
use crate::error::Result;
use crate::models::{CommunicationEvent, InstitutionProfile, LeadRecord, LeadStatus, TutorProfile};

#[allow(async_fn_in_trait)]
pub trait ProfileRepository {
    async fn load_institution(&self, id: Uuid) -> Result<InstitutionProfile>;

    /// Persists the profile along with its freshly computed completion percentage.
    async fn save_institution(&self, profile: &InstitutionProfile) -> Result<InstitutionProfile>;

    async fn load_tutor(&self, id: Uuid) -> Result<TutorProfile>;

    async fn save_tutor(&self, profile: &TutorProfile) -> Result<TutorProfile>;
}

#[allow(async_fn_in_trait)]
pub trait LeadRepository {
    async fn list_leads(&self, institution_id: Uuid) -> Result<Vec<LeadRecord>>;

    async fn load_lead(&self, id: Uuid) -> Result<LeadRecord>;

    /// Returns false when a lead with the same id already exists.
    /// Fails with `NotFound` when the lead's institution has no saved profile.
    async fn insert_lead(&self, lead: &LeadRecord) -> Result<bool>;

    async fn update_lead_status(&self, id: Uuid, status: LeadStatus) -> Result<LeadRecord>;

    async fn append_communication(&self, id: Uuid, event: &CommunicationEvent) -> Result<LeadRecord>;

    async fn delete_lead(&self, id: Uuid) -> Result<()>;
}

pub fn stamp_institution(
    profile: &InstitutionProfile,
    now: DateTime<Utc>,
) -> Result<InstitutionProfile> {
    let completion = compute_completion(&profile.completion_fields())?;
    let mut stamped = profile.clone();
    stamped.profile_completion = completion.percentage;
    stamped.updated_at = Some(now);
    Ok(stamped)
}

pub fn stamp_tutor(profile: &TutorProfile, now: DateTime<Utc>) -> Result<TutorProfile> {
    let completion = compute_completion(&profile.completion_fields())?;
    let mut stamped = profile.clone();
    stamped.profile_completion = completion.percentage;
    stamped.updated_at = Some(now);
    Ok(stamped)
}

pub enum Store {
    Remote(PgStore),
    Local(LocalCache),
}

impl Store {
    /// Connects to Postgres when configured and reachable, otherwise falls back to the local cache.
    pub async fn open(config: &Config) -> Store {
        let url = match (&config.database_url, config.offline) {
            (_, true) => {
                let cache = LocalCache::new(&config.cache_path);
                info!(path = %cache.path().display(), "offline mode, using local cache");
                return Store::Local(cache);
            }
            (None, false) => {
                let cache = LocalCache::new(&config.cache_path);
                warn!(path = %cache.path().display(), "DATABASE_URL not set, using local cache");
                return Store::Local(cache);
            }
            (Some(url), false) => url,
        };

        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
        {
            Ok(pool) => {
                info!("connected to Postgres");
                Store::Remote(PgStore::new(pool))
            }
            Err(err) => {
                let cache = LocalCache::new(&config.cache_path);
                warn!(error = %err, path = %cache.path().display(), "Postgres unavailable, using local cache");
                Store::Local(cache)
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Store::Remote(_))
    }
}

impl ProfileRepository for Store {
    async fn load_institution(&self, id: Uuid) -> Result<InstitutionProfile> {
        match self {
            Store::Remote(store) => store.load_institution(id).await,
            Store::Local(store) => store.load_institution(id).await,
        }
    }

    async fn save_institution(&self, profile: &InstitutionProfile) -> Result<InstitutionProfile> {
        match self {
            Store::Remote(store) => store.save_institution(profile).await,
            Store::Local(store) => store.save_institution(profile).await,
        }
    }

    async fn load_tutor(&self, id: Uuid) -> Result<TutorProfile> {
        match self {
            Store::Remote(store) => store.load_tutor(id).await,
            Store::Local(store) => store.load_tutor(id).await,
        }
    }

    async fn save_tutor(&self, profile: &TutorProfile) -> Result<TutorProfile> {
        match self {
            Store::Remote(store) => store.save_tutor(profile).await,
            Store::Local(store) => store.save_tutor(profile).await,
        }
    }
}

impl LeadRepository for Store {
    async fn list_leads(&self, institution_id: Uuid) -> Result<Vec<LeadRecord>> {
        match self {
            Store::Remote(store) => store.list_leads(institution_id).await,
            Store::Local(store) => store.list_leads(institution_id).await,
        }
    }

    async fn load_lead(&self, id: Uuid) -> Result<LeadRecord> {
        match self {
            Store::Remote(store) => store.load_lead(id).await,
            Store::Local(store) => store.load_lead(id).await,
        }
    }

    async fn insert_lead(&self, lead: &LeadRecord) -> Result<bool> {
        match self {
            Store::Remote(store) => store.insert_lead(lead).await,
            Store::Local(store) => store.insert_lead(lead).await,
        }
    }

    async fn update_lead_status(&self, id: Uuid, status: LeadStatus) -> Result<LeadRecord> {
        match self {
            Store::Remote(store) => store.update_lead_status(id, status).await,
            Store::Local(store) => store.update_lead_status(id, status).await,
        }
    }

    async fn append_communication(&self, id: Uuid, event: &CommunicationEvent) -> Result<LeadRecord> {
        match self {
            Store::Remote(store) => store.append_communication(id, event).await,
            Store::Local(store) => store.append_communication(id, event).await,
        }
    }

    async fn delete_lead(&self, id: Uuid) -> Result<()> {
        match self {
            Store::Remote(store) => store.delete_lead(id).await,
            Store::Local(store) => store.delete_lead(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CACHE_PATH;
    use chrono::TimeZone;
    use std::path::PathBuf;

    #[test]
    fn stamping_writes_completion_and_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let mut profile = TutorProfile::new(Uuid::new_v4(), "Kiara Patel");
        profile.bio = Some("Maths tutor for grades 8-10".to_string());
        profile.hourly_rate = Some(600.0);

        let stamped = stamp_tutor(&profile, now).unwrap();
        assert_eq!(stamped.profile_completion, 25);
        assert_eq!(stamped.updated_at, Some(now));
        assert_eq!(profile.profile_completion, 0);
    }

    #[tokio::test]
    async fn offline_config_opens_local_cache() {
        let config = Config {
            database_url: Some("postgres://localhost/unused".to_string()),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            max_connections: 1,
            offline: true,
        };
        assert!(!Store::open(&config).await.is_remote());
    }

    #[tokio::test]
    async fn missing_database_url_opens_local_cache() {
        let config = Config {
            database_url: None,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            max_connections: 1,
            offline: false,
        };
        assert!(!Store::open(&config).await.is_remote());
    }
}
