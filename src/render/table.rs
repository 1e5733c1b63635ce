use std::io::Write;

use super::{format_number, Publisher};
use crate::analyzer::{DashboardSnapshot, Selection, SelectionView};
use crate::config::MetricSchema;
use crate::error::AppError;

/// Plain-text dashboard: KPI cards, the unit table and the selection cards.
pub struct TablePublisher<W: Write + Send> {
    out: W,
    schema: MetricSchema,
}

impl<W: Write + Send> TablePublisher<W> {
    pub fn new(out: W, schema: MetricSchema) -> Self {
        TablePublisher { out, schema }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn conversion_title(&self) -> String {
        format!(
            "Conversion ({} ÷ {})",
            self.schema.conversion_numerator, self.schema.conversion_denominator
        )
    }

    fn write_kpis(&mut self, snapshot: &DashboardSnapshot) -> std::io::Result<()> {
        for (name, total) in snapshot.totals.iter() {
            writeln!(
                self.out,
                "  {:<28} {:>10}   avg/unit {}",
                format!("{name} (Total)"),
                format_number(total),
                format_number(snapshot.averages.get(name)),
            )?;
        }
        let title = self.conversion_title();
        writeln!(
            self.out,
            "  {:<28} {:>10}",
            title,
            format!("{}%", snapshot.conversion)
        )
    }

    fn write_units(&mut self, snapshot: &DashboardSnapshot) -> std::io::Result<()> {
        let mut header: Vec<String> = vec!["Unit".to_string()];
        header.extend(self.schema.names().map(str::to_string));
        header.push("Conv.".to_string());

        let body: Vec<Vec<String>> = snapshot
            .units
            .iter()
            .map(|u| {
                let mut line = vec![u.unit.clone()];
                line.extend(u.metrics.iter().map(|(_, v)| format_number(v)));
                line.push(format!("{}%", u.conversion));
                line
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for line in &body {
            for (w, cell) in widths.iter_mut().zip(line) {
                *w = (*w).max(cell.chars().count());
            }
        }

        write_line(&mut self.out, &header, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(&mut self.out, &rule, &widths)?;
        for line in &body {
            write_line(&mut self.out, line, &widths)?;
        }
        Ok(())
    }

    fn write_selection(&mut self, view: &SelectionView) -> std::io::Result<()> {
        writeln!(self.out, "Selected unit: {}", view.label)?;
        let all = view.selection == Selection::All;
        for (name, value) in view.metrics.iter() {
            let shown = if all { "-".to_string() } else { format_number(value) };
            writeln!(self.out, "  {:<28} {:>10}", format!("{name} (Unit)"), shown)?;
        }
        let conv = if all {
            "-".to_string()
        } else {
            format!("{}%", view.conversion)
        };
        writeln!(self.out, "  {:<28} {:>10}", "Conversion % (Unit)", conv)
    }
}

fn write_line<W: Write>(out: &mut W, cells: &[String], widths: &[usize]) -> std::io::Result<()> {
    let mut line = String::new();
    for (i, (cell, w)) in cells.iter().zip(widths).enumerate() {
        let pad = w.saturating_sub(cell.chars().count());
        if i == 0 {
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
        } else {
            line.push_str(" | ");
            line.push_str(&" ".repeat(pad));
            line.push_str(cell);
        }
    }
    writeln!(out, "{}", line.trim_end())
}

impl<W: Write + Send> Publisher for TablePublisher<W> {
    fn publish(&mut self, snapshot: &DashboardSnapshot) -> Result<(), AppError> {
        writeln!(
            self.out,
            "== Dashboard: {} rows, {} units (updated {})",
            snapshot.meta.total_rows,
            snapshot.meta.unit_count,
            snapshot.meta.computed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )?;
        self.write_kpis(snapshot)?;
        writeln!(self.out)?;
        self.write_units(snapshot)?;
        writeln!(self.out)?;
        self.write_selection(&snapshot.selection)?;
        self.out.flush()?;
        Ok(())
    }

    fn publish_selection(&mut self, view: &SelectionView) -> Result<(), AppError> {
        self.write_selection(view)?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{build_snapshot, DashboardOptions};
    use crate::parser::RawRow;

    fn snapshot(selection: Selection) -> DashboardSnapshot {
        let rows: Vec<RawRow> = vec![
            [("Unidade", "Loja A"), ("Directs", "10"), ("Respostas", "5")]
                .into_iter()
                .collect(),
            [("Unidade", "Loja B"), ("Directs", "20"), ("Respostas", "4")]
                .into_iter()
                .collect(),
        ];
        build_snapshot(
            &rows,
            &MetricSchema::default(),
            &DashboardOptions::default(),
            &selection,
        )
    }

    fn render(selection: Selection) -> String {
        let mut publisher = TablePublisher::new(Vec::new(), MetricSchema::default());
        publisher.publish(&snapshot(selection)).unwrap();
        String::from_utf8(publisher.into_inner()).unwrap()
    }

    #[test]
    fn test_table_lists_units_in_display_order() {
        let text = render(Selection::All);
        let a = text.find("Loja A").unwrap();
        let b = text.find("Loja B").unwrap();
        assert!(b < a, "Loja B has more Directs and must come first");
        assert!(text.contains("20.0%"));
        assert!(text.contains("50.0%"));
    }

    #[test]
    fn test_kpi_cards() {
        let text = render(Selection::All);
        assert!(text.contains("Directs (Total)"));
        assert!(text.contains("Conversion (Respostas ÷ Directs)"));
        assert!(text.contains("30.0%"));
    }

    #[test]
    fn test_all_selection_shows_placeholders() {
        let text = render(Selection::All);
        assert!(text.contains("Selected unit: All Units"));
        let line = text
            .lines()
            .find(|l| l.contains("Directs (Unit)"))
            .unwrap();
        assert!(line.trim_end().ends_with('-'));
    }

    #[test]
    fn test_unit_selection_shows_values() {
        let mut publisher = TablePublisher::new(Vec::new(), MetricSchema::default());
        let snap = snapshot(Selection::Unit("Loja A".into()));
        publisher.publish_selection(&snap.selection).unwrap();
        let text = String::from_utf8(publisher.into_inner()).unwrap();
        assert!(text.starts_with("Selected unit: Loja A"));
        assert!(text.contains("50.0%"));
    }
}
