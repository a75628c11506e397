//! Session context and command dispatch
//!
//! A [`SessionContext`] owns the single open connection plus the selections
//! accumulated between commands. Each [`SessionCommand`] is applied to it in
//! turn; the context is the only place a connection is created, replaced or
//! closed.

use crate::core::scope::{ScopeSelection, TargetChoice, TargetKind, TargetList};
use crate::core::services::types::{ExportedWorkbook, ResultSet};
use crate::core::services::{self, collector_service, export_service, target_service};
use crate::core::warehouse::{Connector, Warehouse};
use crate::error::ConnectionError;
use crate::storage::credentials::Credentials;

/// Discrete actions a front end can request
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Connect(Credentials),
    ListTargets(TargetKind),
    SelectLevels(ScopeSelection),
    SelectTargets(TargetKind, TargetChoice),
    Collect,
    Export,
    Disconnect,
}

#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Connected,
    Targets { kind: TargetKind, names: Vec<String> },
    Selected,
    Collected(ResultSet),
    Exported(ExportedWorkbook),
    Disconnected,
}

#[derive(Debug, Default)]
struct Targets {
    list: TargetList,
    enumerated: bool,
}

impl Targets {
    /// Forget what the previous connection discovered; the user's choice stays.
    fn reset_discovery(&mut self) {
        self.list.discovered.clear();
        self.enumerated = false;
    }
}

pub struct SessionContext<C: Connector> {
    connector: C,
    connection: Option<C::Connection>,
    selection: ScopeSelection,
    databases: Targets,
    warehouses: Targets,
    last_result: Option<ResultSet>,
}

impl<C: Connector> SessionContext<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            connection: None,
            selection: ScopeSelection::default_levels(),
            databases: Targets::default(),
            warehouses: Targets::default(),
            last_result: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn selection(&self) -> &ScopeSelection {
        &self.selection
    }

    pub fn targets(&self, kind: TargetKind) -> &TargetList {
        &self.targets_ref(kind).list
    }

    pub fn last_result(&self) -> Option<&ResultSet> {
        self.last_result.as_ref()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn execute(&mut self, command: SessionCommand) -> crate::Result<CommandOutcome> {
        match command {
            SessionCommand::Connect(credentials) => {
                self.connect(&credentials).await?;
                Ok(CommandOutcome::Connected)
            }
            SessionCommand::ListTargets(kind) => {
                let names = self.enumerate(kind).await?;
                Ok(CommandOutcome::Targets { kind, names })
            }
            SessionCommand::SelectLevels(selection) => {
                self.selection = selection;
                Ok(CommandOutcome::Selected)
            }
            SessionCommand::SelectTargets(kind, choice) => {
                self.targets_mut(kind).list.choice = choice;
                Ok(CommandOutcome::Selected)
            }
            SessionCommand::Collect => {
                let results = self.collect().await?;
                Ok(CommandOutcome::Collected(results))
            }
            SessionCommand::Export => {
                let results = self
                    .last_result
                    .as_ref()
                    .ok_or(crate::error::ExportError::NothingToExport)?;
                Ok(CommandOutcome::Exported(export_service::export(results)?))
            }
            SessionCommand::Disconnect => {
                self.close_connection().await;
                self.last_result = None;
                Ok(CommandOutcome::Disconnected)
            }
        }
    }

    /// Close the held connection, if any. Safe to call more than once.
    pub async fn dispose(&mut self) {
        self.close_connection().await;
    }

    async fn connect(&mut self, credentials: &Credentials) -> Result<(), ConnectionError> {
        // The previous session is released before a new login is attempted,
        // so a failed reconnect leaves no connection behind.
        self.close_connection().await;
        self.databases.reset_discovery();
        self.warehouses.reset_discovery();
        self.last_result = None;

        let connection = services::connect(&self.connector, credentials).await?;
        self.connection = Some(connection);
        Ok(())
    }

    async fn enumerate(&mut self, kind: TargetKind) -> crate::Result<Vec<String>> {
        let connection = self.connection.as_ref().ok_or(ConnectionError::NotConnected)?;
        let names = target_service::list_targets(connection, kind).await?;

        let targets = self.targets_mut(kind);
        targets.list.discovered = names.clone();
        targets.enumerated = true;
        Ok(names)
    }

    async fn collect(&mut self) -> crate::Result<ResultSet> {
        if self.connection.is_none() {
            return Err(ConnectionError::NotConnected.into());
        }

        for kind in [TargetKind::Database, TargetKind::Warehouse] {
            if self.selection.contains(kind.level()) && !self.targets_ref(kind).enumerated {
                self.enumerate(kind).await?;
            }
        }

        let connection = self.connection.as_ref().ok_or(ConnectionError::NotConnected)?;
        let results = collector_service::collect(
            connection,
            &self.selection,
            &self.databases.list,
            &self.warehouses.list,
        )
        .await;

        self.last_result = Some(results.clone());
        Ok(results)
    }

    async fn close_connection(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                tracing::warn!("Failed to close previous connection: {}", e);
            } else {
                tracing::debug!("Connection closed");
            }
        }
    }

    fn targets_ref(&self, kind: TargetKind) -> &Targets {
        match kind {
            TargetKind::Database => &self.databases,
            TargetKind::Warehouse => &self.warehouses,
        }
    }

    fn targets_mut(&mut self, kind: TargetKind) -> &mut Targets {
        match kind {
            TargetKind::Database => &mut self.databases,
            TargetKind::Warehouse => &mut self.warehouses,
        }
    }
}
