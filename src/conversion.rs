use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::{MetricsError, Result};
use crate::models::{LeadPriority, LeadRecord, LeadStatus};

const BASE_SCORE: i64 = 50;
const POINTS_PER_CONTACT: i64 = 5;
const ENGAGEMENT_CAP: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConversionScore(u8);

impl ConversionScore {
    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn band(&self) -> ScoreBand {
        match self.0 {
            75..=100 => ScoreBand::Hot,
            50..=74 => ScoreBand::Warm,
            _ => ScoreBand::Cold,
        }
    }

    fn clamped(total: i64) -> Self {
        ConversionScore(total.clamp(0, 100) as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Hot,
    Warm,
    Cold,
}

impl ScoreBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Hot => "hot",
            ScoreBand::Warm => "warm",
            ScoreBand::Cold => "cold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLead {
    pub lead: LeadRecord,
    pub score: ConversionScore,
    /// False when the inquiry date could not be parsed and recency was scored as +0.
    pub recency_known: bool,
}

pub fn compute_conversion_score(lead: &LeadRecord, now: DateTime<Utc>) -> Result<ConversionScore> {
    let inquiry_date = parse_inquiry_date(&lead.inquiry_date)?;
    let days_ago = (now.date_naive() - inquiry_date).num_days();
    Ok(ConversionScore::clamped(
        unadjusted_total(lead) + recency_adjustment(days_ago),
    ))
}

/// Scores a lead, treating an unparseable inquiry date as "not recent".
pub fn score_or_fallback(lead: &LeadRecord, now: DateTime<Utc>) -> ScoredLead {
    match compute_conversion_score(lead, now) {
        Ok(score) => ScoredLead {
            lead: lead.clone(),
            score,
            recency_known: true,
        },
        Err(err) => {
            warn!(lead_id = %lead.id, error = %err, "scoring lead without recency");
            ScoredLead {
                lead: lead.clone(),
                score: ConversionScore::clamped(unadjusted_total(lead)),
                recency_known: false,
            }
        }
    }
}

/// Highest score first; ties keep a stable order by lead id.
pub fn rank_leads(leads: &[LeadRecord], now: DateTime<Utc>) -> Vec<ScoredLead> {
    let mut scored: Vec<ScoredLead> = leads
        .iter()
        .map(|lead| score_or_fallback(lead, now))
        .collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.lead.id.cmp(&b.lead.id)));
    scored
}

pub fn parse_inquiry_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        .map_err(|_| MetricsError::InvalidInput(format!("unparseable inquiry date '{raw}'")))
}

pub fn status_adjustment(status: LeadStatus) -> i64 {
    match status {
        LeadStatus::Interested => 20,
        LeadStatus::Admitted => 40,
        LeadStatus::Closed => -30,
        LeadStatus::New | LeadStatus::Contacted => 0,
    }
}

pub fn priority_adjustment(priority: LeadPriority) -> i64 {
    match priority {
        LeadPriority::High => 15,
        LeadPriority::Medium => 5,
        LeadPriority::Low => 0,
    }
}

pub fn engagement_adjustment(contact_count: usize) -> i64 {
    (contact_count as i64)
        .saturating_mul(POINTS_PER_CONTACT)
        .min(ENGAGEMENT_CAP)
}

/// Inquiries dated in the future count as recent.
pub fn recency_adjustment(days_ago: i64) -> i64 {
    match days_ago {
        i64::MIN..=7 => 10,
        8..=30 => 5,
        _ => 0,
    }
}

fn unadjusted_total(lead: &LeadRecord) -> i64 {
    BASE_SCORE
        + status_adjustment(lead.status)
        + priority_adjustment(lead.priority)
        + engagement_adjustment(lead.communication_history.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommunicationEvent, ContactChannel};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    fn days_before_now(days: i64) -> String {
        (now().date_naive() - Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn sample_lead(
        status: LeadStatus,
        priority: LeadPriority,
        contacts: usize,
        inquiry_date: String,
    ) -> LeadRecord {
        let communication_history = (0..contacts)
            .map(|i| CommunicationEvent {
                occurred_at: now() - Duration::hours(i as i64),
                channel: ContactChannel::Call,
                note: format!("follow-up {i}"),
            })
            .collect();
        LeadRecord {
            id: Uuid::new_v4(),
            institution_id: Uuid::new_v4(),
            student_name: "Avery Lee".to_string(),
            student_email: Some("avery@example.com".to_string()),
            phone: None,
            course_interest: Some("NEET Crash Course".to_string()),
            status,
            priority,
            communication_history,
            inquiry_date,
        }
    }

    #[test]
    fn fresh_medium_priority_inquiry_scores_65() {
        let lead = sample_lead(LeadStatus::New, LeadPriority::Medium, 0, days_before_now(0));
        assert_eq!(compute_conversion_score(&lead, now()).unwrap().value(), 65);
    }

    #[test]
    fn admitted_high_priority_lead_is_clamped_to_100() {
        let lead = sample_lead(LeadStatus::Admitted, LeadPriority::High, 5, days_before_now(40));
        assert_eq!(compute_conversion_score(&lead, now()).unwrap().value(), 100);
    }

    #[test]
    fn recently_closed_low_priority_lead_scores_30() {
        let lead = sample_lead(LeadStatus::Closed, LeadPriority::Low, 0, days_before_now(2));
        let score = compute_conversion_score(&lead, now()).unwrap();
        assert_eq!(score.value(), 30);
        assert_eq!(score.band(), ScoreBand::Cold);
    }

    #[test]
    fn extreme_inputs_stay_within_bounds() {
        let high = sample_lead(
            LeadStatus::Admitted,
            LeadPriority::High,
            1000,
            days_before_now(3650),
        );
        assert_eq!(compute_conversion_score(&high, now()).unwrap().value(), 100);

        let low = sample_lead(LeadStatus::Closed, LeadPriority::Low, 0, days_before_now(3650));
        assert_eq!(compute_conversion_score(&low, now()).unwrap().value(), 20);
    }

    #[test]
    fn engagement_is_capped_at_four_contacts() {
        assert_eq!(engagement_adjustment(0), 0);
        assert_eq!(engagement_adjustment(3), 15);
        assert_eq!(engagement_adjustment(4), 20);
        assert_eq!(engagement_adjustment(usize::MAX), 20);
    }

    #[test]
    fn recency_follows_expected_tiers() {
        assert_eq!(recency_adjustment(-3), 10);
        assert_eq!(recency_adjustment(7), 10);
        assert_eq!(recency_adjustment(8), 5);
        assert_eq!(recency_adjustment(30), 5);
        assert_eq!(recency_adjustment(31), 0);
    }

    #[test]
    fn rfc3339_inquiry_dates_are_accepted() {
        let stamp = (now() - Duration::days(12)).to_rfc3339();
        let lead = sample_lead(LeadStatus::Contacted, LeadPriority::Medium, 1, stamp);
        // 50 + 0 + 5 + 5 + 5
        assert_eq!(compute_conversion_score(&lead, now()).unwrap().value(), 65);
    }

    #[test]
    fn unparseable_inquiry_date_is_invalid_input() {
        let lead = sample_lead(
            LeadStatus::Interested,
            LeadPriority::High,
            2,
            "last tuesday".to_string(),
        );
        let err = compute_conversion_score(&lead, now()).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));

        let scored = score_or_fallback(&lead, now());
        assert!(!scored.recency_known);
        // 50 + 20 + 15 + 10 + 0
        assert_eq!(scored.score.value(), 95);
    }

    #[test]
    fn scoring_does_not_mutate_the_lead() {
        let lead = sample_lead(LeadStatus::Interested, LeadPriority::Low, 2, days_before_now(9));
        let before = lead.clone();
        let first = compute_conversion_score(&lead, now()).unwrap();
        let second = compute_conversion_score(&lead, now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(lead, before);
    }

    #[test]
    fn leads_rank_by_score_descending() {
        let leads = vec![
            sample_lead(LeadStatus::Closed, LeadPriority::Low, 0, days_before_now(2)),
            sample_lead(LeadStatus::Admitted, LeadPriority::High, 5, days_before_now(40)),
            sample_lead(LeadStatus::New, LeadPriority::Medium, 0, days_before_now(0)),
        ];
        let ranked = rank_leads(&leads, now());
        let values: Vec<u8> = ranked.iter().map(|s| s.score.value()).collect();
        assert_eq!(values, vec![100, 65, 30]);
        assert_eq!(ranked[0].score.band(), ScoreBand::Hot);
        assert_eq!(ranked[1].score.band(), ScoreBand::Warm);
    }
}
