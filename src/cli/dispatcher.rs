use crate::cli::command_handlers::{ConfigHandler, SessionHandler};
use crate::cli::main_types::{Cli, Commands};
use crate::cli::shell::Shell;
use crate::core::session::SessionContext;
use crate::core::warehouse::{Connector, SnowflakeConnector};
use crate::error::{AppError, ConfigError};
use crate::storage::config::Config;
use crate::storage::credentials::{Credentials, get_password_from_env, prompt_password};
use crate::utils::logging::print_verbose;
use crate::utils::validation::validate_url;
use std::path::PathBuf;

/// Where the connection credentials come from: flags or environment first,
/// then the config file, then a password prompt.
#[derive(Clone, Default)]
pub struct CredentialSource {
    account: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

impl CredentialSource {
    pub fn new(account: Option<String>, user: Option<String>, password: Option<String>) -> Self {
        Self {
            account,
            user,
            password,
        }
    }

    pub fn resolve(&self) -> Result<Credentials, AppError> {
        let account = self.account.clone().ok_or_else(|| ConfigError::MissingField {
            field: "account".to_string(),
            hint: "Pass --account, set SNOWFLAKE_ACCOUNT or run 'snowparam config set account <id>'"
                .to_string(),
        })?;
        let user = self.user.clone().ok_or_else(|| ConfigError::MissingField {
            field: "user".to_string(),
            hint: "Pass --user, set SNOWFLAKE_USER or run 'snowparam config set user <name>'"
                .to_string(),
        })?;

        let password = match self
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(get_password_from_env)
        {
            Some(password) => password,
            // Left empty when there is no terminal; connecting then reports
            // the missing field.
            None => prompt_password(&account, &user)?.unwrap_or_default(),
        };

        Ok(Credentials::new(account, user, password))
    }
}

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    credentials: CredentialSource,
    role: Option<String>,
    host: Option<String>,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(cli: &Cli, config: Config, config_path: Option<PathBuf>) -> Self {
        let account = Config::resolve(cli.account.as_deref(), config.account.as_deref());
        let user = Config::resolve(cli.user.as_deref(), config.user.as_deref());
        let role = Config::resolve(cli.role.as_deref(), config.role.as_deref());
        let host = Config::resolve(cli.host.as_deref(), config.host.as_deref());

        print_verbose(
            cli.verbose,
            &format!(
                "Account: {}, user: {}, role: {}",
                account.as_deref().unwrap_or("(not set)"),
                user.as_deref().unwrap_or("(not set)"),
                role.as_deref().unwrap_or("(default)")
            ),
        );

        Self {
            credentials: CredentialSource::new(account, user, cli.password.clone()),
            config,
            config_path,
            role,
            host,
            verbose: cli.verbose,
        }
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        if let Commands::Config { command } = command {
            return ConfigHandler::new().handle(
                command,
                &self.config,
                self.config_path.clone(),
                self.verbose,
            );
        }

        let mut session = SessionContext::new(self.connector()?);
        let result = self.run(&mut session, command).await;
        // The server-side session is released however the command ended
        session.dispose().await;
        result
    }

    fn connector(&self) -> Result<SnowflakeConnector, AppError> {
        if let Some(host) = &self.host {
            validate_url(host)?;
        }
        Ok(SnowflakeConnector::new(
            self.host.clone(),
            self.role.clone(),
            self.config.timeout_secs(),
        ))
    }

    async fn run<C: Connector>(
        &self,
        session: &mut SessionContext<C>,
        command: Commands,
    ) -> Result<(), AppError> {
        let handler = SessionHandler::new(self.verbose);

        match command {
            Commands::Connect => {
                handler.connect(session, self.credentials.resolve()?).await?;
                Ok(())
            }
            Commands::Targets { kind } => {
                handler.connect(session, self.credentials.resolve()?).await?;
                handler.list_targets(session, kind).await?;
                Ok(())
            }
            Commands::Fetch { selection, format } => {
                // Reject bad levels before logging in
                selection.scope()?;
                handler.connect(session, self.credentials.resolve()?).await?;
                handler.select(session, &selection).await?;
                handler.fetch(session, format).await
            }
            Commands::Export { selection, output } => {
                selection.scope()?;
                handler.connect(session, self.credentials.resolve()?).await?;
                handler.select(session, &selection).await?;
                handler.export(session, &output).await?;
                Ok(())
            }
            Commands::Shell => {
                let mut shell = Shell::new(handler, self.credentials.clone(), self.verbose);
                shell.run(session).await
            }
            Commands::Config { .. } => Ok(()),
        }
    }
}
