//! Interactive shell
//!
//! Keeps one session context (and so one Snowflake login) alive across many
//! commands. Command errors are printed and the loop continues; only end of
//! input or `quit` ends it.

use crate::cli::command_handlers::SessionHandler;
use crate::cli::dispatcher::CredentialSource;
use crate::cli::main_types::OutputFormat;
use crate::core::scope::{ScopeSelection, TargetChoice, TargetKind};
use crate::core::services::types::EXPORT_FILE_NAME;
use crate::core::session::{SessionCommand, SessionContext};
use crate::core::warehouse::Connector;
use crate::display::{OperationStatus, display_status};
use crate::error::{AppError, CliError, ConnectionError};
use crate::utils::logging::print_verbose;
use std::io::{self, BufRead, Write};

const PROMPT: &str = "snowparam> ";

const HELP: &str = "\
Commands:
  connect                      log in with the configured credentials
  levels [L,...|none]          show or set levels (ACCOUNT, SESSION, DATABASE, WAREHOUSE)
  databases [ALL|NAME...]      show or set the database selection
  warehouses [ALL|NAME...]     show or set the warehouse selection
  list databases|warehouses    list names visible to the current role
  fetch [json]                 collect parameters for the current selection
  export [PATH]                write the last fetch to PATH (default snowflake_parameters.xlsx)
  disconnect                   close the connection
  status                       show connection and selection
  help                         show this text
  quit                         leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Connect,
    ShowLevels,
    SetLevels(ScopeSelection),
    ShowTargets(TargetKind),
    SelectTargets(TargetKind, TargetChoice),
    List(TargetKind),
    Fetch(OutputFormat),
    Export(String),
    Disconnect,
    Status,
    Help,
    Quit,
    Empty,
}

/// Parse one input line. Keywords are case-insensitive; names keep their case.
pub fn parse_line(line: &str) -> Result<ShellCommand, CliError> {
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match keyword.to_ascii_lowercase().as_str() {
        "connect" => ShellCommand::Connect,
        "levels" | "level" => match args.as_slice() {
            [] => ShellCommand::ShowLevels,
            [none] if none.eq_ignore_ascii_case("none") => {
                ShellCommand::SetLevels(ScopeSelection::default())
            }
            values => ShellCommand::SetLevels(ScopeSelection::parse_all(values)?),
        },
        "databases" | "warehouses" => {
            let kind = keyword.parse::<TargetKind>()?;
            if args.is_empty() {
                ShellCommand::ShowTargets(kind)
            } else {
                let names: Vec<&str> = args
                    .iter()
                    .flat_map(|a| a.split(','))
                    .filter(|n| !n.is_empty())
                    .collect();
                ShellCommand::SelectTargets(kind, TargetChoice::from_values(&names))
            }
        }
        "list" | "ls" => match args.as_slice() {
            [kind] => ShellCommand::List(kind.parse()?),
            _ => {
                return Err(CliError::InvalidArguments(
                    "Usage: list databases|warehouses".to_string(),
                ));
            }
        },
        "fetch" => match args.as_slice() {
            [] => ShellCommand::Fetch(OutputFormat::Table),
            [format] if format.eq_ignore_ascii_case("json") => ShellCommand::Fetch(OutputFormat::Json),
            _ => {
                return Err(CliError::InvalidArguments(
                    "Usage: fetch [json]".to_string(),
                ));
            }
        },
        "export" => match args.as_slice() {
            [] => ShellCommand::Export(EXPORT_FILE_NAME.to_string()),
            [path] => ShellCommand::Export(path.to_string()),
            _ => {
                return Err(CliError::InvalidArguments(
                    "Usage: export [PATH]".to_string(),
                ));
            }
        },
        "disconnect" => ShellCommand::Disconnect,
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => {
            return Err(CliError::InvalidArguments(format!(
                "Unknown command '{}'. Type 'help' for a list",
                other
            )));
        }
    };
    Ok(command)
}

pub struct Shell {
    handler: SessionHandler,
    credentials: CredentialSource,
    verbose: bool,
}

impl Shell {
    pub fn new(handler: SessionHandler, credentials: CredentialSource, verbose: bool) -> Self {
        Self {
            handler,
            credentials,
            verbose,
        }
    }

    pub async fn run<C: Connector>(&mut self, session: &mut SessionContext<C>) -> Result<(), AppError> {
        println!("snowparam shell. Type 'help' for commands, 'quit' to leave.");

        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut line = String::new();

        loop {
            print!("{}", PROMPT);
            io::stdout()
                .flush()
                .map_err(|e| CliError::Input(format!("Failed to write prompt: {}", e)))?;

            line.clear();
            let read = input
                .read_line(&mut line)
                .map_err(|e| CliError::Input(format!("Failed to read input: {}", e)))?;
            if read == 0 {
                println!();
                break;
            }

            let command = match parse_line(&line) {
                Ok(command) => command,
                Err(e) => {
                    display_status(&e.to_string(), OperationStatus::Error);
                    continue;
                }
            };

            if command == ShellCommand::Quit {
                break;
            }

            if let Err(e) = self.apply(session, command).await {
                // Login failures were already shown by the connect handler
                if !matches!(
                    e,
                    AppError::Connection(
                        ConnectionError::Failed { .. } | ConnectionError::MissingField { .. }
                    )
                ) {
                    display_status(&e.display_friendly(), OperationStatus::Error);
                }
                if let Some(hint) = e.troubleshooting_hint() {
                    eprintln!("Hint: {}", hint);
                }
            }
        }

        print_verbose(self.verbose, "Leaving shell");
        Ok(())
    }

    pub async fn apply<C: Connector>(
        &mut self,
        session: &mut SessionContext<C>,
        command: ShellCommand,
    ) -> Result<(), AppError> {
        match command {
            ShellCommand::Connect => {
                let credentials = self.credentials.resolve()?;
                self.handler.connect(session, credentials).await
            }
            ShellCommand::ShowLevels => {
                println!("Levels: {}", session.selection());
                Ok(())
            }
            ShellCommand::SetLevels(levels) => {
                self.handler.select_levels(session, levels).await?;
                println!("Levels: {}", session.selection());
                Ok(())
            }
            ShellCommand::ShowTargets(kind) => {
                let targets = session.targets(kind);
                println!(
                    "{}: {} ({} discovered)",
                    kind.plural(),
                    targets.choice,
                    targets.discovered.len()
                );
                Ok(())
            }
            ShellCommand::SelectTargets(kind, choice) => {
                self.handler.select_targets(session, kind, choice).await?;
                println!("{}: {}", kind.plural(), session.targets(kind).choice);
                Ok(())
            }
            ShellCommand::List(kind) => {
                self.handler.list_targets(session, kind).await?;
                Ok(())
            }
            ShellCommand::Fetch(format) => self.handler.fetch(session, format).await,
            ShellCommand::Export(path) => self.handler.write_export(session, &path).await,
            ShellCommand::Disconnect => {
                session.execute(SessionCommand::Disconnect).await?;
                display_status("Disconnected", OperationStatus::Success);
                Ok(())
            }
            ShellCommand::Status => {
                println!(
                    "Connection: {}",
                    if session.is_connected() {
                        "open"
                    } else {
                        "closed"
                    }
                );
                println!("Levels: {}", session.selection());
                println!("Databases: {}", session.targets(TargetKind::Database).choice);
                println!("Warehouses: {}", session.targets(TargetKind::Warehouse).choice);
                match session.last_result() {
                    Some(results) => println!(
                        "Last fetch: {} tables, {} failed, at {}",
                        results.tables().count(),
                        results.failures().count(),
                        results.collected_at.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                    None => println!("Last fetch: (none)"),
                }
                Ok(())
            }
            ShellCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ShellCommand::Quit | ShellCommand::Empty => Ok(()),
        }
    }
}
