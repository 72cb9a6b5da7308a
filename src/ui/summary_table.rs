//! Table of the latest totals per country

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::stats::CountryTotals;

/// Height needed to show `rows` countries (borders and header included)
pub fn height_for(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX - 3).saturating_add(3)
}

/// Renders the totals as a bordered table, one row per country
pub fn render(frame: &mut Frame, area: Rect, title: &str, totals: &[CountryTotals]) {
    let header = Row::new(["Country", "As of", "Confirmed", "Deaths", "Recovered", "Active"])
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let rows = totals.iter().map(|t| {
        Row::new(vec![
            Cell::from(t.country.clone()),
            Cell::from(t.as_of.format("%Y-%m-%d").to_string()),
            Cell::from(t.confirmed.to_string()),
            Cell::from(t.deaths.to_string()).style(Style::default().fg(Color::Red)),
            Cell::from(t.recovered.to_string()).style(Style::default().fg(Color::Green)),
            Cell::from(t.active().to_string()),
        ])
    });

    let widths = [
        Constraint::Min(16),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL),
    );

    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};

    fn totals(country: &str, confirmed: u32) -> CountryTotals {
        CountryTotals {
            country: country.to_string(),
            as_of: NaiveDate::from_ymd_opt(2020, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            confirmed,
            deaths: 1,
            recovered: 2,
        }
    }

    #[test]
    fn test_height_for() {
        assert_eq!(height_for(0), 3);
        assert_eq!(height_for(10), 13);
    }

    #[test]
    fn test_table_renders_rows() {
        let rows = vec![totals("brazil", 120), totals("peru", 45)];
        let backend = TestBackend::new(80, height_for(rows.len()));
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, area, "Top countries", &rows);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content().iter().map(|cell| cell.symbol()).collect();

        assert!(content.contains("Top countries"));
        assert!(content.contains("Confirmed"));
        assert!(content.contains("brazil"));
        assert!(content.contains("2020-03-01"));
        assert!(content.contains("117"), "Active column should be shown");
    }
}
