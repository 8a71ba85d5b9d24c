//! Status report generation.
//!
//! Collects the settings row, the row count of every published table and the most recent
//! durable log entries for a connection. Formatting is kept separate so the CLI decides
//! how to print it.

use crate::{
    core::{catalog, context::GeonamesContext, datasets::DataSetKind, settings},
    entities::{Continent, Log, SettingsModel, log},
    errors::Result,
};
use sea_orm::{EntityName, QueryOrder, QuerySelect, prelude::*};
use std::fmt::Write as _;

/// Row count of one published table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// Table name
    pub table: String,
    /// Rows in the table, `None` if it does not exist
    pub rows: Option<u64>,
}

/// Everything `status` prints for a connection.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Connection the report is for
    pub connection_name: String,
    /// Settings row, `None` before the first install
    pub settings: Option<SettingsModel>,
    /// Published tables in install order, then continents
    pub tables: Vec<TableSummary>,
    /// Most recent log entries, newest first
    pub recent_logs: Vec<log::Model>,
}

/// Generates the status report for the context's connection.
///
/// # Arguments
/// * `ctx` - Connection context
/// * `log_limit` - Maximum number of log entries to include (default 5)
pub async fn generate_status_report(
    ctx: &GeonamesContext,
    log_limit: Option<u64>,
) -> Result<StatusReport> {
    let settings = settings::find(ctx).await?;

    let mut table_names: Vec<String> = DataSetKind::INSTALL_ORDER
        .iter()
        .map(|kind| kind.production_table())
        .collect();
    table_names.push(Continent.table_name().to_owned());

    let mut tables = Vec::with_capacity(table_names.len());
    for table in table_names {
        let rows = if catalog::table_exists(&ctx.db, &table).await? {
            Some(catalog::row_count(&ctx.db, &table).await?)
        } else {
            None
        };
        tables.push(TableSummary { table, rows });
    }

    let recent_logs = Log::find()
        .filter(log::Column::ConnectionName.eq(ctx.connection_name.as_str()))
        .order_by_desc(log::Column::Id)
        .limit(log_limit.unwrap_or(5))
        .all(&ctx.db)
        .await?;

    Ok(StatusReport {
        connection_name: ctx.connection_name.clone(),
        settings,
        tables,
        recent_logs,
    })
}

/// Renders a filter column: empty means everything.
#[must_use]
pub fn format_codes(joined: &str) -> String {
    if joined.is_empty() {
        "all".to_string()
    } else {
        joined.to_string()
    }
}

/// Formats the report as plain text.
#[must_use]
pub fn format_status_report(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Connection: {}", report.connection_name);

    match &report.settings {
        Some(settings) => {
            let _ = writeln!(out, "Status:     {}", settings.status);
            let installed = settings
                .installed_at
                .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
            let _ = writeln!(out, "Installed:  {installed}");
            let _ = writeln!(out, "Countries:  {}", format_codes(&settings.countries));
            let _ = writeln!(out, "Languages:  {}", format_codes(&settings.languages));
            let _ = writeln!(out, "Storage:    {}", settings.storage_path);
        }
        None => {
            let _ = writeln!(out, "Status:     not configured");
        }
    }

    let _ = writeln!(out);
    let width = report
        .tables
        .iter()
        .map(|summary| summary.table.len())
        .max()
        .unwrap_or(0);
    for summary in &report.tables {
        let rows = summary
            .rows
            .map_or_else(|| "missing".to_string(), |rows| rows.to_string());
        let _ = writeln!(out, "{:<width$}  {rows}", summary.table);
    }

    if !report.recent_logs.is_empty() {
        let _ = writeln!(out, "\nRecent log entries:");
        for entry in &report.recent_logs {
            let _ = writeln!(
                out,
                "  {} [{}] {}{}",
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                entry.category,
                entry.message,
                entry
                    .url
                    .as_deref()
                    .map_or_else(String::new, |url| format!(" ({url})"))
            );
        }
    }
    out
}
