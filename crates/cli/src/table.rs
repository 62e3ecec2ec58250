// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain column-aligned tables for list commands.

use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Muted,
    Status,
}

#[derive(Debug, Clone)]
pub struct Column {
    title: &'static str,
    style: Style,
    max: Option<usize>,
}

impl Column {
    pub fn left(title: &'static str) -> Self {
        Self { title, style: Style::Plain, max: None }
    }

    pub fn muted(title: &'static str) -> Self {
        Self { title, style: Style::Muted, max: None }
    }

    /// Cells are colored by the run status they name.
    pub fn status(title: &'static str) -> Self {
        Self { title, style: Style::Status, max: None }
    }

    /// Truncate cells longer than `max` characters, ending them with `…`.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max.max(1));
        self
    }

    fn fit(&self, cell: String) -> String {
        match self.max {
            Some(max) if cell.chars().count() > max => {
                let mut cut: String = cell.chars().take(max - 1).collect();
                cut.push('…');
                cut
            }
            _ => cell,
        }
    }

    fn paint(&self, cell: &str) -> String {
        match self.style {
            Style::Plain => cell.to_string(),
            Style::Muted => crate::color::muted(cell),
            Style::Status => crate::color::status(cell),
        }
    }
}

pub struct Table {
    cols: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(cols: Vec<Column>) -> Self {
        Self { cols, rows: Vec::new() }
    }

    /// Add a row. Missing cells render empty; extra cells are dropped.
    pub fn row(&mut self, cells: Vec<String>) {
        let mut cells: Vec<String> =
            cells.into_iter().zip(&self.cols).map(|(cell, col)| col.fit(cell)).collect();
        cells.resize(self.cols.len(), String::new());
        self.rows.push(cells);
    }

    pub fn render(&self, out: &mut (impl Write + ?Sized)) {
        let widths: Vec<usize> = self
            .cols
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows.iter().map(|row| row[i].chars().count()).max().unwrap_or(0).max(col.title.len())
            })
            .collect();

        let header: Vec<String> = self.cols.iter().map(|col| col.title.to_string()).collect();
        let header_line = self.line(&header, &widths, false);
        let _ = writeln!(out, "{}", crate::color::header(&header_line));
        for row in &self.rows {
            let _ = writeln!(out, "{}", self.line(row, &widths, true));
        }
    }

    fn line(&self, cells: &[String], widths: &[usize], styled: bool) -> String {
        let last = cells.len().saturating_sub(1);
        let mut line = String::new();
        for (i, (cell, col)) in cells.iter().zip(&self.cols).enumerate() {
            let pad = widths[i].saturating_sub(cell.chars().count());
            if styled {
                line.push_str(&col.paint(cell));
            } else {
                line.push_str(cell);
            }
            if i < last {
                line.push_str(&" ".repeat(pad + 2));
            }
        }
        line
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
