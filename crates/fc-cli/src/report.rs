//! Terminal rendering of engine events and config summaries

use fc_config::AppConfig;
use fc_core::RunSettings;
use fc_event_bus::EngineEvent;
use std::collections::BTreeMap;

/// One line for an engine event, or `None` for events the terminal skips
///
/// Remaining-time ticks arrive every slice and are left to the log.
pub fn event_line(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::StatusMessage(text) if text.starts_with("Next action in") => None,
        EngineEvent::StatusMessage(text) => Some(text.clone()),
        EngineEvent::StepHighlighted(_) => None,
        EngineEvent::StepStarted { index, action } => Some(format!("  [{:>3}] {}", index, action)),
        EngineEvent::ExecutionFailed { action, cause } => {
            Some(format!("Error executing {}: {}", action, cause))
        }
        EngineEvent::Finished => Some("Automation stopped.".to_string()),
    }
}

/// Multi-line summary printed by `show`
pub fn config_summary(config: &AppConfig) -> String {
    let mut out = String::from("Actions:\n");
    for (name, entry) in &config.actions {
        let detail = match entry {
            Some(entry) => match entry.to_action(name) {
                Ok(action) => action.to_string(),
                Err(e) => format!("{} (invalid: {})", name, e),
            },
            None => format!("{} (not recorded)", name),
        };
        out.push_str(&format!("  {}\n", detail));
    }

    out.push_str(&format!("Settings: {}\n", settings_line(&config.settings)));

    let sequence = config.sequence();
    if sequence.is_empty() {
        out.push_str("Sequence: empty\n");
    } else {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for step in sequence {
            *counts.entry(step.name.as_str()).or_default() += 1;
        }
        let breakdown: Vec<String> = counts
            .iter()
            .map(|(name, count)| format!("{} {}", name, count))
            .collect();
        out.push_str(&format!(
            "Sequence: {} steps ({})\n",
            sequence.len(),
            breakdown.join(", ")
        ));
    }
    out
}

fn settings_line(settings: &RunSettings) -> String {
    let delay = if settings.random_delay {
        format!(
            "random delay {:.1}-{:.1}s",
            settings.delay_range.0, settings.delay_range.1
        )
    } else {
        format!("fixed delay {:.1}s", settings.fixed_delay)
    };
    format!(
        "{} order, {}, {}",
        if settings.random_order { "random" } else { "fixed" },
        delay,
        if settings.repeat { "repeat until stopped" } else { "single pass" }
    )
}
