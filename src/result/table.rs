/// Plain-text table for terminal front ends.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<S: ToString>(&mut self, row: impl IntoIterator<Item = S>) {
        self.rows.push(row.into_iter().map(|cell| cell.to_string()).collect());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return "Empty result set\n".to_string();
        }

        // Calculate column widths
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{:width$}", col, width = widths[i]))
            .collect();
        out.push_str(header.join(" | ").trim_end());
        out.push('\n');

        let separator: String = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");
        out.push_str(&separator);
        out.push('\n');

        for row in &self.rows {
            let row_str: Vec<String> = row
                .iter()
                .enumerate()
                .take(widths.len())
                .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
                .collect();
            out.push_str(row_str.join(" | ").trim_end());
            out.push('\n');
        }

        out.push_str(&format!("\n{} row(s)\n", self.rows.len()));
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}
