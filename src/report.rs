use std::fmt::Write;

use crate::dashboard::DashboardState;

pub fn build_report(state: &DashboardState, limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Institution Dashboard Report");
    let _ = writeln!(
        output,
        "Generated for {} (scored {})",
        state.profile.institution_name,
        state.scored_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Profile Completion");
    let _ = writeln!(
        output,
        "{}% complete ({} of {} fields)",
        state.completion.percentage, state.completion.filled_count, state.completion.total_count
    );

    if !state.missing_fields.is_empty() {
        let _ = writeln!(output, "Still missing: {}", state.missing_fields.join(", "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Inquiry Funnel");

    if state.leads.is_empty() {
        let _ = writeln!(output, "No inquiries recorded yet.");
    } else {
        for (status, count) in state.status_counts.iter() {
            let _ = writeln!(output, "- {status}: {count}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Likely To Convert");

    if state.leads.is_empty() {
        let _ = writeln!(output, "No inquiries recorded yet.");
    } else {
        for scored in state.leads.iter().take(limit) {
            let lead = &scored.lead;
            let _ = write!(
                output,
                "- {} ({}, {}) score {}% [{}] with {} contacts",
                lead.student_name,
                lead.status,
                lead.priority,
                scored.score.value(),
                scored.score.band().as_str(),
                lead.communication_history.len()
            );
            if !scored.recency_known {
                let _ = write!(output, " (inquiry date unreadable: {})", lead.inquiry_date);
            }
            let _ = writeln!(output);
        }
    }

    output
}
