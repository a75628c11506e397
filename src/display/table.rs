use crate::core::scope::TargetKind;
use crate::core::services::types::{ResultSet, TargetOutcome};
use crate::core::warehouse::ParameterTable;
use crate::utils::text::{format_cell_value, truncate_text};
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets};
use crossterm::terminal;
use serde_json::Value;

/// Longest cell text shown before truncation
const MAX_CELL_WIDTH: usize = 60;

/// Terminal rendering of parameter tables and target lists
pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }

    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 240)),
            Err(_) => None,
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// One parameter table under a title line naming its sheet label
    pub fn render_parameter_table(&self, label: &str, table: &ParameterTable) -> String {
        let mut output = format!("{} ({} rows)\n", label, table.row_count());

        if table.columns.is_empty() {
            output.push_str("No parameters returned.");
            return output;
        }

        let mut rendered = self.new_table();
        rendered.set_header(
            table
                .columns
                .iter()
                .map(|name| self.header_cell(name))
                .collect::<Vec<_>>(),
        );

        for row in &table.rows {
            let cells: Vec<Cell> = row.iter().map(|value| self.value_cell(value)).collect();
            rendered.add_row(cells);
        }

        output.push_str(&rendered.to_string());
        output
    }

    /// Every outcome of a collection run, failures as one line each
    pub fn render_result_set(&self, results: &ResultSet) -> String {
        let mut sections = Vec::with_capacity(results.len());
        for (label, outcome) in results.iter() {
            match outcome {
                TargetOutcome::Collected(table) => {
                    sections.push(self.render_parameter_table(label, table))
                }
                TargetOutcome::Failed { reason } => {
                    sections.push(format!("{}: failed: {}", label, reason))
                }
            }
        }
        sections.join("\n\n")
    }

    /// Collection summary: label, row count and status per outcome
    pub fn render_summary(&self, results: &ResultSet) -> String {
        let mut table = self.new_table();
        table.set_header(vec![
            self.header_cell("Sheet"),
            self.header_cell("Rows"),
            self.header_cell("Status"),
        ]);

        for (label, outcome) in results.iter() {
            let (rows, status) = match outcome {
                TargetOutcome::Collected(t) => (t.row_count().to_string(), "ok".to_string()),
                TargetOutcome::Failed { reason } => {
                    ("-".to_string(), truncate_text(reason, MAX_CELL_WIDTH))
                }
            };
            let status_cell = match (outcome, self.use_colors) {
                (TargetOutcome::Failed { .. }, true) => Cell::new(status).fg(Color::Red),
                _ => Cell::new(status),
            };
            table.add_row(vec![Cell::new(label), Cell::new(rows), status_cell]);
        }

        table.to_string()
    }

    /// Discovered database or warehouse names
    pub fn render_target_list(&self, kind: TargetKind, names: &[String]) -> String {
        if names.is_empty() {
            return format!("No {} visible to the current role.", kind.plural());
        }

        let mut table = self.new_table();
        table.set_header(vec![self.header_cell("#"), self.header_cell("Name")]);
        for (index, name) in names.iter().enumerate() {
            table.add_row(vec![Cell::new(index + 1), Cell::new(name)]);
        }
        format!("{} {}\n{}", names.len(), kind.plural(), table)
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            // Leave room for borders
            table.set_width(width.saturating_sub(2).max(20) as u16);
        }
        table
    }

    fn header_cell(&self, text: &str) -> Cell {
        let cell = Cell::new(text).add_attribute(Attribute::Bold);
        if self.use_colors {
            cell.fg(Color::Cyan)
        } else {
            cell
        }
    }

    fn value_cell(&self, value: &Value) -> Cell {
        if matches!(value, Value::Null) {
            let cell = Cell::new("-");
            return if self.use_colors {
                cell.fg(Color::DarkGrey).add_attribute(Attribute::Italic)
            } else {
                cell
            };
        }
        Cell::new(truncate_text(&format_cell_value(value), MAX_CELL_WIDTH))
    }
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}
