use crate::query::{display_cell, ResultSet};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// Query result as a table with a leading row-number column
pub fn result_table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return String::new();
    }

    let mut builder = Builder::default();
    let mut header = vec!["#".to_string()];
    header.extend(result.columns.iter().cloned());
    builder.push_record(header);

    for (i, row) in result.rows.iter().enumerate() {
        let mut record = vec![(i + 1).to_string()];
        record.extend(row.iter().map(|c| display_cell(c).to_string()));
        builder.push_record(record);
    }

    builder.build().with(Style::rounded()).to_string()
}
