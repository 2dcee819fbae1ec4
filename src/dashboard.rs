//! Per-view dashboard state.
//!
//! The institution dashboard owns one [`DashboardState`] value. Edits
//! (status changes, logged contacts) produce a new state with leads rescored
//! so the view can render optimistically before the store confirms the write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::completion::{compute_completion, missing_fields, CompletionResult};
use crate::conversion::{rank_leads, ScoredLead};
use crate::error::{MetricsError, Result};
use crate::models::{CommunicationEvent, InstitutionProfile, LeadRecord, LeadStatus};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    pub profile: InstitutionProfile,
    pub completion: CompletionResult,
    pub missing_fields: Vec<&'static str>,
    pub leads: Vec<ScoredLead>,
    pub status_counts: BTreeMap<&'static str, usize>,
    pub scored_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn build(
        profile: InstitutionProfile,
        leads: &[LeadRecord],
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let fields = profile.completion_fields();
        let completion = compute_completion(&fields)?;
        let missing_fields = missing_fields(&fields);

        let mut status_counts: BTreeMap<&'static str, usize> = LeadStatus::ALL
            .iter()
            .map(|status| (status.as_str(), 0))
            .collect();
        for lead in leads {
            *status_counts.entry(lead.status.as_str()).or_insert(0) += 1;
        }

        Ok(Self {
            profile,
            completion,
            missing_fields,
            leads: rank_leads(leads, now),
            status_counts,
            scored_at: now,
        })
    }

    pub fn lead(&self, id: Uuid) -> Option<&ScoredLead> {
        self.leads.iter().find(|scored| scored.lead.id == id)
    }

    pub fn with_status(&self, id: Uuid, status: LeadStatus, now: DateTime<Utc>) -> Result<Self> {
        self.with_lead_edit(id, now, |lead| lead.status = status)
    }

    pub fn with_contact(
        &self,
        id: Uuid,
        event: CommunicationEvent,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        self.with_lead_edit(id, now, move |lead| lead.communication_history.push(event))
    }

    /// Replaces the lead with the stored version once the backend confirms a write.
    pub fn with_confirmed(&self, lead: LeadRecord, now: DateTime<Utc>) -> Result<Self> {
        let id = lead.id;
        self.with_lead_edit(id, now, move |slot| *slot = lead)
    }

    pub fn without_lead(&self, id: Uuid, now: DateTime<Utc>) -> Result<Self> {
        let leads = self.lead_records();
        if !leads.iter().any(|lead| lead.id == id) {
            return Err(MetricsError::not_found("lead", id));
        }
        let remaining: Vec<LeadRecord> = leads.into_iter().filter(|lead| lead.id != id).collect();
        Self::build(self.profile.clone(), &remaining, now)
    }

    fn lead_records(&self) -> Vec<LeadRecord> {
        self.leads.iter().map(|scored| scored.lead.clone()).collect()
    }

    fn with_lead_edit<F>(&self, id: Uuid, now: DateTime<Utc>, edit: F) -> Result<Self>
    where
        F: FnOnce(&mut LeadRecord),
    {
        let mut leads = self.lead_records();
        let lead = leads
            .iter_mut()
            .find(|lead| lead.id == id)
            .ok_or_else(|| MetricsError::not_found("lead", id))?;
        edit(lead);
        Self::build(self.profile.clone(), &leads, now)
    }
}
