use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

use dashboard_metrics::completion::{compute_completion, missing_fields};
use dashboard_metrics::config::Config;
use dashboard_metrics::conversion::score_or_fallback;
use dashboard_metrics::dashboard::DashboardState;
use dashboard_metrics::models::{CommunicationEvent, ContactChannel, LeadStatus, ProfileRole};
use dashboard_metrics::repository::{LeadRepository, ProfileRepository, Store};
use dashboard_metrics::{db, import, report, MetricsError};

#[derive(Parser)]
#[command(name = "dashboard-metrics")]
#[command(about = "Profile completion and lead scoring for marketplace dashboards", long_about = None)]
struct Cli {
    /// Skip Postgres and use the local JSON cache
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import inquiries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show profile completion for a tutor or institution
    Completion {
        #[arg(long)]
        role: ProfileRole,
        #[arg(long)]
        id: Uuid,
    },
    /// Rank an institution's inquiries by conversion probability
    Score {
        #[arg(long)]
        institution: Uuid,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Move an inquiry to a new status
    SetStatus {
        #[arg(long)]
        lead: Uuid,
        #[arg(long)]
        status: LeadStatus,
    },
    /// Record a contact with a prospective student
    LogContact {
        #[arg(long)]
        lead: Uuid,
        #[arg(long, default_value = "call")]
        channel: ContactChannel,
        #[arg(long)]
        note: String,
    },
    /// Delete an inquiry
    DeleteLead {
        #[arg(long)]
        lead: Uuid,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        institution: Uuid,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load()
        .context("invalid dashboard configuration")?
        .offline(cli.offline);
    let store = Store::open(&config).await;

    match cli.command {
        Commands::InitDb => {
            let Store::Remote(remote) = &store else {
                bail!("init-db needs a reachable Postgres instance in DATABASE_URL");
            };
            db::init_db(remote.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = import::seed(&store).await?;
            println!("Seed data inserted ({inserted} new inquiries).");
        }
        Commands::Import { csv } => {
            let inserted = import::import_csv(&store, &csv)
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Inserted {inserted} inquiries from {}.", csv.display());
        }
        Commands::Completion { role, id } => {
            let fields = match role {
                ProfileRole::Institution => store.load_institution(id).await?.completion_fields(),
                ProfileRole::Tutor => store.load_tutor(id).await?.completion_fields(),
            };
            let completion = compute_completion(&fields)?;
            println!(
                "{} profile {id} is {}% complete ({} of {} fields).",
                role.as_str(),
                completion.percentage,
                completion.filled_count,
                completion.total_count
            );
            let missing = missing_fields(&fields);
            if !missing.is_empty() {
                println!("Missing: {}", missing.join(", "));
            }
        }
        Commands::Score { institution, limit } => {
            let state = load_dashboard(&store, institution).await?;

            if state.leads.is_empty() {
                println!("No inquiries found for this institution.");
                return Ok(());
            }

            println!("Top inquiries by conversion probability:");
            for scored in state.leads.iter().take(limit) {
                println!(
                    "- {} ({}, {}) score {}% [{}] across {} contacts",
                    scored.lead.student_name,
                    scored.lead.status,
                    scored.lead.priority,
                    scored.score.value(),
                    scored.score.band().as_str(),
                    scored.lead.communication_history.len()
                );
            }
        }
        Commands::SetStatus { lead, status } => {
            let now = Utc::now();
            let stored = store.update_lead_status(lead, status).await?;
            let scored = score_or_fallback(&stored, now);
            println!(
                "{} is now {} (score {}%).",
                stored.student_name,
                stored.status,
                scored.score.value()
            );

            match store.load_institution(stored.institution_id).await {
                Ok(profile) => {
                    let leads = store.list_leads(stored.institution_id).await?;
                    let state = DashboardState::build(profile, &leads, now)?;
                    if let Some(rank) = state.leads.iter().position(|s| s.lead.id == lead) {
                        println!("Ranked {} of {} inquiries.", rank + 1, state.leads.len());
                    }
                }
                Err(MetricsError::NotFound { .. }) => {
                    info!(institution = %stored.institution_id, "no institution profile, skipping ranking");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::LogContact {
            lead,
            channel,
            note,
        } => {
            let event = CommunicationEvent {
                occurred_at: Utc::now(),
                channel,
                note,
            };
            let stored = store.append_communication(lead, &event).await?;
            let scored = score_or_fallback(&stored, Utc::now());
            println!(
                "Logged contact {} for {} (score {}%).",
                stored.communication_history.len(),
                stored.student_name,
                scored.score.value()
            );
        }
        Commands::DeleteLead { lead } => {
            store.delete_lead(lead).await?;
            println!("Deleted inquiry {lead}.");
        }
        Commands::Report {
            institution,
            limit,
            out,
        } => {
            let state = load_dashboard(&store, institution).await?;
            let report = report::build_report(&state, limit);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn load_dashboard(store: &Store, institution: Uuid) -> anyhow::Result<DashboardState> {
    let profile = store
        .load_institution(institution)
        .await
        .context("failed to load institution profile")?;
    let leads = store.list_leads(institution).await?;
    info!(institution = %institution, leads = leads.len(), remote = store.is_remote(), "loaded dashboard");
    Ok(DashboardState::build(profile, &leads, Utc::now())?)
}
