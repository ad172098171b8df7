//! CLI output handling - Event receiver loop.
//!
//! Receives grid events from the runtime channel and renders them according
//! to the output mode (terminal, JSON lines, or quiet).

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::events::GridEvent;

/// Where a rendered line goes.
#[derive(Debug, Clone, PartialEq)]
enum Line {
    Out(String),
    Err(String),
}

/// Run the event loop until the runtime drops its sender.
///
/// # Arguments
///
/// * `event_rx` - Channel receiver for grid events
/// * `json_mode` - If true, output events as JSON lines
/// * `quiet_mode` - If true, only output submission summaries and errors
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<GridEvent>,
    json_mode: bool,
    quiet_mode: bool,
) -> Result<()> {
    while let Some(event) = event_rx.recv().await {
        if json_mode {
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush()?;
            continue;
        }

        let line = if quiet_mode {
            render_quiet(&event)
        } else {
            render_terminal(&event)
        };

        match line {
            Some(Line::Out(text)) => {
                println!("{}", text);
                io::stdout().flush()?;
            }
            Some(Line::Err(text)) => eprintln!("{}", text),
            None => {}
        }
    }

    Ok(())
}

fn render_terminal(event: &GridEvent) -> Option<Line> {
    match event {
        GridEvent::BusyChanged { busy: true } => {
            Some(Line::Err("[oracle] Listening to the cosmos...".to_string()))
        }
        GridEvent::BusyChanged { busy: false } => None,
        GridEvent::SubmissionRejected { reason } => Some(Line::Err(format!("[busy] {}", reason))),
        GridEvent::InsightRecorded { mood, tags, .. } => Some(Line::Out(if tags.is_empty() {
            format!("Insight recorded: {}", mood)
        } else {
            format!("Insight recorded: {} [{}]", mood, tags.join(", "))
        })),
        GridEvent::ConnectionsEstablished {
            count,
            top_to_id,
            top_strength,
        } => Some(Line::Out(format!(
            "Resonance: {} connection(s), strongest {} ({:.2})",
            count, top_to_id, top_strength
        ))),
        GridEvent::NotificationRaised { msg, .. } => Some(Line::Out(format!("* {}", msg))),
        GridEvent::NotificationExpired { .. } => None,
        GridEvent::SubmissionFailed { stage, message } => {
            Some(Line::Err(format!("Error ({}): {}", stage, message)))
        }
        GridEvent::SubmissionFinished { .. } => None,
        GridEvent::PositionResolved { lat, lng, fallback } => Some(Line::Err(format!(
            "[geo] Position {:.2}, {:.2}{}",
            lat,
            lng,
            if *fallback { " (fallback)" } else { "" }
        ))),
    }
}

fn render_quiet(event: &GridEvent) -> Option<Line> {
    match event {
        GridEvent::SubmissionFinished {
            insight_id: Some(id),
            connections,
        } => Some(Line::Out(format!("{} {}", id, connections))),
        GridEvent::SubmissionFailed { stage, message } => {
            Some(Line::Err(format!("Error ({}): {}", stage, message)))
        }
        GridEvent::SubmissionRejected { reason } => Some(Line::Err(format!("[busy] {}", reason))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mood;

    #[test]
    fn test_terminal_renders_insight_and_notification() {
        let line = render_terminal(&GridEvent::InsightRecorded {
            insight_id: "i1".to_string(),
            mood: Mood::Lonely,
            tags: vec!["night".to_string(), "city".to_string()],
            created_actor: true,
        });
        assert_eq!(line, Some(Line::Out("Insight recorded: lonely [night, city]".to_string())));

        let line = render_terminal(&GridEvent::NotificationRaised {
            id: "n1".to_string(),
            msg: "Stable Connection Established with Nova_12".to_string(),
        });
        assert_eq!(
            line,
            Some(Line::Out("* Stable Connection Established with Nova_12".to_string()))
        );
    }

    #[test]
    fn test_terminal_routes_failures_to_stderr() {
        let line = render_terminal(&GridEvent::SubmissionFailed {
            stage: "discovery".to_string(),
            message: "boom".to_string(),
        });
        assert_eq!(line, Some(Line::Err("Error (discovery): boom".to_string())));
    }

    #[test]
    fn test_terminal_hides_bookkeeping_events() {
        assert_eq!(render_terminal(&GridEvent::BusyChanged { busy: false }), None);
        assert_eq!(
            render_terminal(&GridEvent::NotificationExpired { id: "n1".to_string() }),
            None
        );
    }

    #[test]
    fn test_quiet_only_summaries() {
        assert_eq!(
            render_quiet(&GridEvent::SubmissionFinished {
                insight_id: Some("i1".to_string()),
                connections: 3,
            }),
            Some(Line::Out("i1 3".to_string()))
        );
        assert_eq!(
            render_quiet(&GridEvent::SubmissionFinished {
                insight_id: None,
                connections: 0,
            }),
            None
        );
        assert_eq!(render_quiet(&GridEvent::BusyChanged { busy: true }), None);
    }

    #[tokio::test]
    async fn test_event_loop_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(GridEvent::BusyChanged { busy: true }).unwrap();
        drop(tx);
        run_event_loop(rx, false, true).await.unwrap();
    }
}
