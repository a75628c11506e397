use crate::cli::main_types::{ConfigCommands, OutputFormat, SelectionArgs};
use crate::core::scope::{ScopeSelection, TargetChoice, TargetKind};
use crate::core::services::types::{ExportedWorkbook, ResultSet, TargetOutcome};
use crate::core::session::{CommandOutcome, SessionCommand, SessionContext};
use crate::core::warehouse::{Connector, ParameterTable};
use crate::display::{OperationStatus, ProgressSpinner, TableDisplay, display_status};
use crate::error::{AppError, CliError, ConfigError, DisplayError};
use crate::storage::config::Config;
use crate::storage::credentials::Credentials;
use crate::utils::error_helpers::{convert_io_to_display_error, convert_io_to_export_error};
use crate::utils::logging::{log_warning, print_verbose};
use crate::utils::validation::validate_url;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

/// Output path meaning stdout
pub const STDOUT_PATH: &str = "-";

/// Commands that run against an open session
pub struct SessionHandler {
    verbose: bool,
    display: TableDisplay,
}

impl SessionHandler {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            display: TableDisplay::new(),
        }
    }

    pub fn with_display(mut self, display: TableDisplay) -> Self {
        self.display = display;
        self
    }

    pub async fn connect<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        credentials: Credentials,
    ) -> Result<(), AppError> {
        print_verbose(
            self.verbose,
            &format!(
                "Connecting to account {} as {}",
                credentials.account, credentials.user
            ),
        );

        let account = credentials.account.clone();
        let mut spinner = ProgressSpinner::new(format!("Connecting to {}...", account));
        spinner.start();
        let result = session.execute(SessionCommand::Connect(credentials)).await;
        spinner.stop(None);

        match result {
            Ok(_) => {
                display_status(&format!("Connected to {}", account), OperationStatus::Success);
                Ok(())
            }
            Err(e) => {
                display_status(&e.display_friendly(), OperationStatus::Error);
                Err(e)
            }
        }
    }

    pub async fn list_targets<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        kind: TargetKind,
    ) -> Result<Vec<String>, AppError> {
        print_verbose(self.verbose, &format!("Listing {}", kind.plural()));

        let mut spinner = ProgressSpinner::new(format!("Fetching {}...", kind.plural()));
        spinner.start();
        let outcome = session.execute(SessionCommand::ListTargets(kind)).await;
        spinner.stop(None);

        let names = match outcome? {
            CommandOutcome::Targets { names, .. } => names,
            _ => Vec::new(),
        };
        println!("{}", self.display.render_target_list(kind, &names));
        Ok(names)
    }

    /// Apply level and target selections from command-line flags
    pub async fn select<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        selection: &SelectionArgs,
    ) -> Result<(), AppError> {
        let levels = selection.scope()?;
        print_verbose(self.verbose, &format!("Selected levels: {}", levels));
        self.select_levels(session, levels).await?;

        for kind in [TargetKind::Database, TargetKind::Warehouse] {
            self.select_targets(session, kind, selection.choice(kind))
                .await?;
        }
        Ok(())
    }

    pub async fn select_levels<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        levels: ScopeSelection,
    ) -> Result<(), AppError> {
        session.execute(SessionCommand::SelectLevels(levels)).await?;
        Ok(())
    }

    pub async fn select_targets<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        kind: TargetKind,
        choice: TargetChoice,
    ) -> Result<(), AppError> {
        print_verbose(
            self.verbose,
            &format!("Selected {}: {}", kind.plural(), choice),
        );
        session
            .execute(SessionCommand::SelectTargets(kind, choice))
            .await?;
        Ok(())
    }

    /// Run one collection and report failed targets as warnings
    pub async fn collect<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
    ) -> Result<ResultSet, AppError> {
        let mut spinner = ProgressSpinner::new("Collecting parameters...");
        spinner.start();
        let outcome = session.execute(SessionCommand::Collect).await;
        spinner.stop(None);

        let results = match outcome? {
            CommandOutcome::Collected(results) => results,
            _ => ResultSet::new(),
        };

        for (label, reason) in results.failures() {
            log_warning(&format!("{}: {}", label, reason));
        }

        if results.is_empty() {
            display_status("No results for the current selection", OperationStatus::Warning);
        } else {
            print_verbose(
                self.verbose,
                &format!(
                    "Collected {} tables, {} failed",
                    results.tables().count(),
                    results.failures().count()
                ),
            );
        }
        Ok(results)
    }

    pub async fn fetch<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        format: OutputFormat,
    ) -> Result<(), AppError> {
        let results = self.collect(session).await?;
        if results.is_empty() {
            return Ok(());
        }

        match format {
            OutputFormat::Table => {
                println!("{}", self.display.render_result_set(&results));
                if results.len() > 1 {
                    println!("\n{}", self.display.render_summary(&results));
                }
            }
            OutputFormat::Json => {
                let json = render_json(&results)?;
                writeln!(io::stdout(), "{}", json)
                    .map_err(|e| convert_io_to_display_error(e, "write JSON output"))?;
            }
        }
        Ok(())
    }

    /// Collect, then write the workbook to `output` (`-` for stdout).
    ///
    /// Returns `false` when nothing was collected and no file was written.
    pub async fn export<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        output: &str,
    ) -> Result<bool, AppError> {
        let results = self.collect(session).await?;
        if !results.has_tables() {
            if !results.is_empty() {
                display_status(
                    "No parameters were collected, nothing to export",
                    OperationStatus::Warning,
                );
            }
            return Ok(false);
        }

        self.write_export(session, output).await?;
        Ok(true)
    }

    /// Export the most recent collection without querying again
    pub async fn write_export<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        output: &str,
    ) -> Result<(), AppError> {
        let workbook = match session.execute(SessionCommand::Export).await? {
            CommandOutcome::Exported(workbook) => workbook,
            _ => return Ok(()),
        };
        print_verbose(
            self.verbose,
            &format!(
                "Workbook {} ({}, {} bytes)",
                workbook.file_name,
                workbook.mime_type,
                workbook.bytes.len()
            ),
        );

        write_workbook(&workbook, output)?;
        if output != STDOUT_PATH {
            display_status(
                &format!(
                    "Wrote {} sheet(s) to {}",
                    workbook.sheet_names.len(),
                    output
                ),
                OperationStatus::Success,
            );
        }
        Ok(())
    }
}

/// Copy the workbook bytes to a file or to stdout
pub fn write_workbook(workbook: &ExportedWorkbook, output: &str) -> Result<(), AppError> {
    let mut reader = workbook.reader();

    if output == STDOUT_PATH {
        let mut stdout = io::stdout().lock();
        io::copy(&mut reader, &mut stdout)
            .and_then(|_| stdout.flush())
            .map_err(|e| convert_io_to_export_error(e, "<stdout>"))?;
        return Ok(());
    }

    let mut file = File::create(output).map_err(|e| convert_io_to_export_error(e, output))?;
    io::copy(&mut reader, &mut file).map_err(|e| convert_io_to_export_error(e, output))?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    collected_at: DateTime<Utc>,
    results: Vec<JsonOutcome<'a>>,
}

#[derive(Serialize)]
struct JsonOutcome<'a> {
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    table: Option<&'a ParameterTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

pub fn render_json(results: &ResultSet) -> Result<String, DisplayError> {
    let report = JsonReport {
        collected_at: results.collected_at,
        results: results
            .iter()
            .map(|(label, outcome)| match outcome {
                TargetOutcome::Collected(table) => JsonOutcome {
                    label,
                    table: Some(table),
                    error: None,
                },
                TargetOutcome::Failed { reason } => JsonOutcome {
                    label,
                    table: None,
                    error: Some(reason.as_str()),
                },
            })
            .collect(),
    };

    serde_json::to_string_pretty(&report)
        .map_err(|e| DisplayError::TableFormat(format!("Failed to serialize results: {}", e)))
}

#[derive(Default)]
pub struct ConfigHandler;

impl ConfigHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        command: ConfigCommands,
        config: &Config,
        config_path: Option<PathBuf>,
        verbose: bool,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                print_verbose(verbose, "Attempting config show command");

                let location = match &config_path {
                    Some(path) => path.display().to_string(),
                    None => Config::config_file_path()?.display().to_string(),
                };

                println!("Current Configuration:");
                println!("=====================");
                println!("File: {}", location);
                println!("Account: {}", show(&config.account));
                println!("User: {}", show(&config.user));
                println!("Role: {}", show(&config.role));
                println!("Host: {}", show(&config.host));
                println!("Timeout: {} seconds", config.timeout_secs());
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                print_verbose(
                    verbose,
                    &format!("Attempting config set - key: {}, value: {}", key, value),
                );

                let mut updated = config.clone();
                apply_setting(&mut updated, &key, &value)?;
                updated.save(config_path)?;

                if value.is_empty() {
                    println!("✅ Cleared {}", key);
                } else {
                    println!("✅ Set {} to: {}", key, value);
                }
                println!("Configuration saved successfully.");
                Ok(())
            }
        }
    }
}

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not set)")
}

/// Update one config key from its string form; an empty value clears it
pub fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<(), AppError> {
    let text = (!value.is_empty()).then(|| value.to_string());

    match key {
        "account" => config.account = text,
        "user" => config.user = text,
        "role" => config.role = text,
        "host" => {
            if let Some(url) = &text {
                validate_url(url)?;
            }
            config.host = text;
        }
        "timeout_seconds" => {
            config.timeout_seconds = match text {
                None => None,
                Some(raw) => match raw.parse::<u64>() {
                    Ok(secs) if secs > 0 => Some(secs),
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            field: key.to_string(),
                            value: raw,
                            reason: "expected a positive number of seconds".to_string(),
                        }
                        .into());
                    }
                },
            };
        }
        other => {
            return Err(CliError::InvalidArguments(format!(
                "Unknown key '{}'. Use account, user, role, host or timeout_seconds",
                other
            ))
            .into());
        }
    }
    Ok(())
}
