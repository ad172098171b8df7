//! Lightweight REPL (Read-Eval-Print-Loop) for cosmic-cli.
//!
//! Provides an interactive mode when no insight is provided via `-e` or `-f`.
//! Supports minimal commands:
//! - `/quit`, `/exit`, `/q` - Exit the REPL
//! - `/status` - Show grid counts, busy flag and position
//! - `/friend <id>` - Add an actor to the friends list
//! - `/config <key>` - Print a setting by dot path
//!
//! Any other input is submitted as an insight.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::bootstrap::CliContext;
use super::runner::execute_once;

/// REPL command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Exit the REPL
    Quit,
    /// Show grid status
    Status,
    /// Add a friend by actor id
    Friend(String),
    /// Print a setting value
    Config(String),
    /// Unknown command (will show help)
    Unknown(String),
    /// Insight text to submit
    Insight(String),
    /// Empty input (skip)
    Empty,
}

impl ReplCommand {
    /// Parse user input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        if !trimmed.starts_with('/') {
            return ReplCommand::Insight(trimmed.to_string());
        }

        let (name, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (trimmed, ""),
        };

        match (name.to_lowercase().as_str(), arg) {
            ("/quit" | "/exit" | "/q", "") => ReplCommand::Quit,
            ("/status", "") => ReplCommand::Status,
            ("/friend", id) if !id.is_empty() => ReplCommand::Friend(id.to_string()),
            ("/config", key) if !key.is_empty() => ReplCommand::Config(key.to_string()),
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// Run an interactive REPL session.
///
/// Returns when the user exits or on EOF (Ctrl+D).
pub async fn run_repl(ctx: &mut CliContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // Print banner
    eprintln!("cosmic-cli interactive mode");
    eprintln!("Share what you feel. Type /quit to exit\n");

    loop {
        // Print prompt
        print!("> ");
        stdout.flush()?;

        // Read line
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF (Ctrl+D)
            eprintln!("\nGoodbye!");
            break;
        }

        match ReplCommand::parse(&input) {
            ReplCommand::Empty => {
                continue;
            }
            ReplCommand::Quit => {
                eprintln!("Goodbye!");
                break;
            }
            ReplCommand::Status => print_status(ctx),
            ReplCommand::Friend(id) => {
                if ctx.state.store.actor(&id).is_none() {
                    eprintln!("Unknown actor: {}", id);
                } else if ctx.state.store.add_friend(&id) {
                    println!("Added {} to friends", id);
                } else {
                    println!("{} is already a friend", id);
                }
            }
            ReplCommand::Config(key) => match ctx.settings_manager.get_value(&key).await {
                Ok(value) => println!("{} = {}", key, value),
                Err(e) => eprintln!("Error: {}", e),
            },
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Available: /quit, /status, /friend <id>, /config <key>");
                continue;
            }
            ReplCommand::Insight(text) => {
                if let Err(e) = execute_once(ctx, &text).await {
                    eprintln!("Error: {}", e);
                }

                println!(); // Blank line between interactions
            }
        }
    }

    Ok(())
}

fn print_status(ctx: &CliContext) {
    let summary = ctx.state.store.summary();
    println!(
        "actors: {} ({} with insights)",
        summary.actors, summary.actors_with_insights
    );
    println!("connections: {}", summary.connections);
    println!("notifications: {}", summary.notifications);
    println!("friends: {}", summary.friends);
    println!("busy: {}", ctx.state.pipeline.is_busy());
    match ctx.state.position.get() {
        Some(p) => println!("position: {:.2}, {:.2}", p.lat, p.lng),
        None => println!("position: unresolved"),
    }
    println!("oracle: {}", ctx.state.oracle.description());
}

#[cfg(test)]
mod tests {
    use super::*;

    // ────────────────────────────────────────────────────────────────────────────────
    // Tests for ReplCommand::parse
    // ────────────────────────────────────────────────────────────────────────────────

    mod parse_tests {
        use super::*;

        #[test]
        fn parses_quit_aliases() {
            assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/exit"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/q"), ReplCommand::Quit);
        }

        #[test]
        fn parses_commands_case_insensitive() {
            assert_eq!(ReplCommand::parse("/QUIT"), ReplCommand::Quit);
            assert_eq!(ReplCommand::parse("/Status"), ReplCommand::Status);
        }

        #[test]
        fn parses_friend_with_id() {
            assert_eq!(
                ReplCommand::parse("/friend soul-12"),
                ReplCommand::Friend("soul-12".to_string())
            );
            // Id keeps its case
            assert_eq!(
                ReplCommand::parse("/FRIEND Soul-A"),
                ReplCommand::Friend("Soul-A".to_string())
            );
        }

        #[test]
        fn friend_without_id_is_unknown() {
            assert_eq!(
                ReplCommand::parse("/friend"),
                ReplCommand::Unknown("/friend".to_string())
            );
        }

        #[test]
        fn parses_config_key() {
            assert_eq!(
                ReplCommand::parse("/config oracle.provider"),
                ReplCommand::Config("oracle.provider".to_string())
            );
        }

        #[test]
        fn command_with_unexpected_argument_is_unknown() {
            assert_eq!(
                ReplCommand::parse("/quit now"),
                ReplCommand::Unknown("/quit now".to_string())
            );
        }

        #[test]
        fn parses_unknown_slash_command() {
            assert_eq!(
                ReplCommand::parse("/help"),
                ReplCommand::Unknown("/help".to_string())
            );
        }

        #[test]
        fn parses_insight_with_slash_in_middle() {
            assert_eq!(
                ReplCommand::parse("Joy and/or sorrow"),
                ReplCommand::Insight("Joy and/or sorrow".to_string())
            );
        }

        #[test]
        fn parses_empty_input() {
            assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
            assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
            assert_eq!(ReplCommand::parse("\t\n"), ReplCommand::Empty);
        }

        #[test]
        fn handles_newline_in_input() {
            assert_eq!(
                ReplCommand::parse("I feel calm\n"),
                ReplCommand::Insight("I feel calm".to_string())
            );
            assert_eq!(ReplCommand::parse("/quit\n"), ReplCommand::Quit);
        }
    }
}
