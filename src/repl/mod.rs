use std::sync::Arc;

use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::election::{Election, NodeId, NodeReport};

/// One operator command. Ids are parsed but not range-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    State,
    /// `None` when the id should be asked for on a second line.
    Crash(Option<NodeId>),
    Recover(Option<NodeId>),
    Help,
    Exit,
}

/// Parses one console line. Anything unrecognized yields `None` and is
/// ignored by the console.
pub fn parse_command(line: &str) -> Option<ControlCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();
    let arg = words.next();
    if words.next().is_some() {
        return None;
    }

    let id = match arg {
        Some(raw) => Some(raw.parse::<NodeId>().ok()?),
        None => None,
    };

    match (verb.as_str(), id) {
        ("state", None) => Some(ControlCommand::State),
        ("crash", id) => Some(ControlCommand::Crash(id)),
        ("recover", id) => Some(ControlCommand::Recover(id)),
        ("help", None) => Some(ControlCommand::Help),
        ("exit" | "quit", None) => Some(ControlCommand::Exit),
        _ => None,
    }
}

pub fn render_state(reports: &[NodeReport]) -> String {
    reports
        .iter()
        .map(|report| format!("\t\t{report}"))
        .collect::<Vec<_>>()
        .join("\n")
}

const HELP: &str = "actions: state, crash <id>, recover <id>, help, exit";

pub struct Repl {
    election: Arc<Election>,
    rl: DefaultEditor,
}

impl Repl {
    pub fn new(election: Arc<Election>) -> rustyline::Result<Self> {
        Ok(Self {
            election,
            rl: DefaultEditor::new()?,
        })
    }

    fn prompt_id(&mut self) -> Option<NodeId> {
        let line = self.rl.readline("\tid > ").ok()?;
        line.trim().parse().ok()
    }

    /// Runs one command against the cluster. Returns `false` on exit.
    pub fn execute(&mut self, command: ControlCommand) -> bool {
        match command {
            ControlCommand::State => {
                println!("{}", render_state(&self.election.state()));
            }
            ControlCommand::Crash(id) => {
                if let Some(id) = id.or_else(|| self.prompt_id()) {
                    if let Err(e) = self.election.crash(id) {
                        debug!("Ignoring crash {id}: {e}");
                    }
                }
            }
            ControlCommand::Recover(id) => {
                if let Some(id) = id.or_else(|| self.prompt_id()) {
                    if let Err(e) = self.election.recover(id) {
                        debug!("Ignoring recover {id}: {e}");
                    }
                }
            }
            ControlCommand::Help => println!("{HELP}"),
            ControlCommand::Exit => return false,
        }
        true
    }

    /// Blocking read-eval loop; run it off the async executor.
    pub fn run(&mut self) {
        println!("Election simulator with {} nodes", self.election.size());
        println!("{HELP}");

        loop {
            let readline = self.rl.readline("\t$ ");
            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    let _ = self.rl.add_history_entry(line.as_str());

                    match parse_command(&line) {
                        Some(command) => {
                            if !self.execute(command) {
                                println!("Goodbye!");
                                break;
                            }
                        }
                        None => debug!("Ignoring unrecognized input: {line}"),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::election::NodeRole;

    #[test]
    fn parses_commands_with_inline_ids() {
        assert_eq!(parse_command("state"), Some(ControlCommand::State));
        assert_eq!(parse_command("  crash 2 "), Some(ControlCommand::Crash(Some(2))));
        assert_eq!(parse_command("RECOVER 0"), Some(ControlCommand::Recover(Some(0))));
        assert_eq!(parse_command("quit"), Some(ControlCommand::Exit));
        assert_eq!(parse_command("help"), Some(ControlCommand::Help));
    }

    #[test]
    fn bare_crash_and_recover_ask_for_an_id() {
        assert_eq!(parse_command("crash"), Some(ControlCommand::Crash(None)));
        assert_eq!(parse_command("recover"), Some(ControlCommand::Recover(None)));
    }

    #[test]
    fn malformed_input_is_ignored() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("elect 1"), None);
        assert_eq!(parse_command("crash -1"), None);
        assert_eq!(parse_command("crash one"), None);
        assert_eq!(parse_command("crash 1 2"), None);
        assert_eq!(parse_command("state 1"), None);
    }

    #[test]
    fn render_state_lists_every_node() {
        let reports = vec![
            NodeReport {
                id: 0,
                live: true,
                role: Some(NodeRole::Leader),
                leader_id: Some(0),
                votes_received: 2,
                elections_started: 1,
            },
            NodeReport {
                id: 1,
                live: false,
                role: None,
                leader_id: Some(0),
                votes_received: 0,
                elections_started: 0,
            },
        ];

        let rendered = render_state(&reports);
        assert_eq!(rendered, "\t\tnode 0: leader\n\t\tnode 1: crashed");
    }
}
