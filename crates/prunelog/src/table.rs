//! Plain-text tables for log output.

/// One table cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, Cell::Text(_))
    }

    fn format(&self, precision: usize) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => format!("{:.*}", precision, v),
        }
    }
}

/// Border style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableStyle {
    /// Markdown-like `| a | b |` rows with an alignment rule under the header
    Pipe,
    /// `+---+` framed table with a `|---+---|` header rule
    Psql,
}

/// Column-aligned table. Numeric columns are right-aligned, others left-aligned.
#[derive(Clone, Debug)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    style: TableStyle,
    precision: usize,
}

impl Table {
    /// `precision` is the number of decimals used for float cells.
    pub fn new<S: AsRef<str>>(headers: &[S], style: TableStyle, precision: usize) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
            style,
            precision,
        }
    }

    /// Append a row. Short rows are padded with empty cells, extra cells are dropped.
    pub fn push(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::text(""));
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let cols = self.headers.len();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.format(self.precision)).collect())
            .collect();

        let numeric: Vec<bool> = (0..cols)
            .map(|c| {
                !self.rows.is_empty()
                    && self.rows.iter().all(|row| match &row[c] {
                        Cell::Text(s) => s.is_empty(),
                        cell => cell.is_numeric(),
                    })
            })
            .collect();

        let widths: Vec<usize> = (0..cols)
            .map(|c| {
                body.iter()
                    .map(|row| row[c].chars().count())
                    .chain(std::iter::once(self.headers[c].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| -> String {
            let padded: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(c, s)| {
                    if numeric[c] {
                        format!(" {:>w$} ", s, w = widths[c])
                    } else {
                        format!(" {:<w$} ", s, w = widths[c])
                    }
                })
                .collect();
            format!("|{}|", padded.join("|"))
        };

        let mut out = Vec::with_capacity(body.len() + 4);
        match self.style {
            TableStyle::Pipe => {
                out.push(line(self.headers.as_slice()));
                let rule: Vec<String> = (0..cols)
                    .map(|c| {
                        let dashes = "-".repeat(widths[c] + 1);
                        if numeric[c] {
                            format!("{}:", dashes)
                        } else {
                            format!(":{}", dashes)
                        }
                    })
                    .collect();
                out.push(format!("|{}|", rule.join("|")));
                out.extend(body.iter().map(|row| line(row.as_slice())));
            }
            TableStyle::Psql => {
                let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
                let frame = format!("+{}+", dashes.join("+"));
                out.push(frame.clone());
                out.push(line(self.headers.as_slice()));
                out.push(format!("|{}|", dashes.join("+")));
                out.extend(body.iter().map(|row| line(row.as_slice())));
                out.push(frame);
            }
        }
        out.join("\n")
    }
}
