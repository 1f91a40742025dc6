//! Turns a run handle into what the binary prints: plain text or JSON.

use serde_json::{json, Value};
use tripgraph::{RunHandle, SectionStatus};

/// Human-readable report: sections with their status, alerts, or the pending question.
pub fn render_text(handle: &RunHandle) -> String {
    let mut out = format!("session: {}\n", handle.session_id);
    if let Some(marker) = handle.interrupt() {
        out.push_str(&format!(
            "suspended at {}: {} {}\n",
            marker.step.as_str(),
            marker.prompt,
            marker.payload
        ));
        out.push_str(&format!(
            "resume with: tripgraph resume {} --input '{{\"approved\": true}}'\n",
            handle.session_id
        ));
        return out;
    }
    let Some(plan) = handle.plan() else {
        return out;
    };
    out.push_str(&format!("progress: {:.0}%\n", plan.progress * 100.0));
    if let Some(headline) = plan
        .summary
        .as_ref()
        .and_then(|s| s.get("headline"))
        .and_then(Value::as_str)
    {
        out.push_str(&format!("summary: {}\n", headline));
    }
    for section in &plan.sections {
        let line = match section.status {
            SectionStatus::Present => format!(
                "  {}: {}",
                section.slot.as_str(),
                section.data.as_ref().map(Value::to_string).unwrap_or_default()
            ),
            SectionStatus::Degraded => format!(
                "  {}: unavailable ({})",
                section.slot.as_str(),
                section.reason.as_deref().unwrap_or("unknown reason")
            ),
            SectionStatus::Missing => format!("  {}: not planned", section.slot.as_str()),
        };
        out.push_str(&line);
        out.push('\n');
    }
    if !plan.alerts.is_empty() {
        out.push_str("alerts:\n");
        for alert in &plan.alerts {
            out.push_str(&format!("  ! {}\n", alert.message));
        }
    }
    out
}

/// JSON report: `{"status": "complete", "plan": ...}` or `{"status": "suspended", ...}`.
pub fn render_json(handle: &RunHandle) -> Value {
    match (handle.plan(), handle.interrupt()) {
        (Some(plan), _) => json!({ "status": "complete", "plan": plan }),
        (None, Some(marker)) => json!({
            "status": "suspended",
            "session_id": handle.session_id,
            "interrupt": marker,
        }),
        (None, None) => json!({ "status": "unknown", "session_id": handle.session_id }),
    }
}
