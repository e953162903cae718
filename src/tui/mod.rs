// TUI module for rendering the terminal interface
pub mod colors;
pub mod helpers;
pub mod input;

// Re-exports
pub use colors::*;
pub use helpers::{centered_rect, format_file_size, truncate};
pub use input::{handle_key_event, handle_text_input, KeyAction};

use crate::app::App;
use crate::bridge::CsvData;
use crate::dashboard::{ExecutionState, TableState};
use crate::navigation::Row;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph,
        Row as TableRow, Table, Wrap,
    },
    Frame,
};

/// UI view state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Explorer has focus
    Browsing,
    /// Help overlay visible
    Help,
    /// Typing into the explorer filter
    Filter,
    /// Delimiter prompt
    Delimiter,
    /// Note editor for the opened file
    Note,
    /// Code runner overlay
    Code,
}

/// Renders the whole screen for the current app state
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    render_explorer(frame, panes[0], app);
    render_dashboard(frame, panes[1], app);
    render_footer(frame, chunks[2], app);

    match app.view_state() {
        ViewState::Help => render_help_overlay(frame),
        ViewState::Delimiter => render_prompt_overlay(
            frame,
            " Delimiter ",
            "One or two characters, \\t for tab, , to follow the extension",
            app.input(),
        ),
        ViewState::Note => render_prompt_overlay(
            frame,
            " Note ",
            "Enter to save, Esc to discard",
            app.input(),
        ),
        ViewState::Code => render_code_overlay(frame, app),
        ViewState::Browsing | ViewState::Filter => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let navigation = &app.navigation;
    let mut spans = vec![Span::styled(
        " csvex ",
        Style::default()
            .fg(ACCENT_HIGHLIGHT)
            .add_modifier(Modifier::BOLD),
    )];

    match navigation.directory() {
        Some(directory) => {
            spans.push(Span::styled(
                directory.display().to_string(),
                Style::default().fg(TEXT_PRIMARY),
            ));
            for name in navigation.breadcrumb() {
                spans.push(Span::styled(" › ", Style::default().fg(TEXT_SECONDARY)));
                spans.push(Span::styled(
                    name.to_string(),
                    Style::default().fg(ACCENT_SECONDARY),
                ));
            }
        }
        None => spans.push(Span::styled(
            "No directory opened",
            Style::default().fg(TEXT_SECONDARY),
        )),
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_COLOR)),
    );

    frame.render_widget(header, area);
}

fn render_explorer(frame: &mut Frame, area: Rect, app: &App) {
    let navigation = &app.navigation;
    let focused = matches!(app.view_state(), ViewState::Browsing | ViewState::Filter);

    let block = Block::default()
        .title(" Files ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused {
            ACCENT_HIGHLIGHT
        } else {
            BORDER_COLOR
        }));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let show_filter =
        !navigation.filter_text().is_empty() || app.view_state() == &ViewState::Filter;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if show_filter { 1 } else { 0 }),
            Constraint::Min(0),
        ])
        .split(inner);

    if show_filter {
        let cursor = if app.view_state() == &ViewState::Filter {
            "_"
        } else {
            ""
        };
        let filter = Paragraph::new(Line::from(vec![
            Span::styled("/ ", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::styled(
                format!("{}{}", navigation.filter_text(), cursor),
                Style::default().fg(TEXT_PRIMARY),
            ),
        ]));
        frame.render_widget(filter, chunks[0]);
    }

    if navigation.directory().is_none() {
        frame.render_widget(render_empty_state_widget(), chunks[1]);
        return;
    }

    let rows = navigation.visible_rows();
    if rows.is_empty() {
        let message = if navigation.is_loading() {
            "Loading…"
        } else if navigation.filter_text().is_empty() {
            "No CSV or TSV files here"
        } else {
            "Nothing matches the filter"
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(TEXT_SECONDARY))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, chunks[1]);
        return;
    }

    let opened_file = app.dashboard.file();
    let width = chunks[1].width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| match row {
            Row::Back => ListItem::new(Span::styled(
                "..",
                Style::default().fg(TEXT_SECONDARY),
            )),
            Row::Entry(entry) if entry.is_dir() => ListItem::new(Span::styled(
                truncate(&format!("{}/", entry.name), width),
                Style::default().fg(ACCENT_SECONDARY),
            )),
            Row::Entry(entry) => {
                let mut style = Style::default().fg(TEXT_PRIMARY);
                if opened_file == Some(&entry.path) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                ListItem::new(Span::styled(truncate(&entry.name, width), style))
            }
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(BG_DARK)
                .bg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    let mut state = ListState::default().with_selected(Some(navigation.selected()));

    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_empty_state_widget() -> Paragraph<'static> {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No directory opened",
            Style::default()
                .fg(TEXT_PRIMARY)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("Ctrl+O", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::raw(" or "),
            Span::styled("o", Style::default().fg(ACCENT_HIGHLIGHT)),
            Span::raw(" to pick one"),
        ]),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().fg(TEXT_SECONDARY))
        .wrap(Wrap { trim: true })
}

fn render_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let dashboard = &app.dashboard;
    let title = match dashboard.file().and_then(|f| f.file_name()) {
        Some(name) => format!(" {} ", name.to_string_lossy()),
        None => " Dashboard ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Summary
            Constraint::Min(0),    // Table
            Constraint::Length(4), // Note
        ])
        .split(inner);

    let message = |text: String, color| {
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false })
    };

    match dashboard.table() {
        TableState::Idle => {
            frame.render_widget(
                message(
                    "Open a .csv or .tsv file to preview it".to_string(),
                    TEXT_SECONDARY,
                ),
                chunks[1],
            );
        }
        TableState::NotTabular => {
            frame.render_widget(
                message("Not a CSV or TSV file".to_string(), TEXT_SECONDARY),
                chunks[1],
            );
        }
        TableState::Loading => {
            frame.render_widget(message("Parsing…".to_string(), TEXT_SECONDARY), chunks[1]);
        }
        TableState::Failed(error) => {
            frame.render_widget(
                message(format!("Could not parse file: {}", error), ACCENT_PRIMARY),
                chunks[1],
            );
        }
        TableState::Ready(data) => {
            render_summary(frame, chunks[0], data, dashboard.delimiter());
            render_table(frame, chunks[1], data);
        }
    }

    if dashboard.file().is_some() {
        render_note(frame, chunks[2], dashboard.note());
    }
}

fn render_summary(frame: &mut Frame, area: Rect, data: &CsvData, delimiter: &str) {
    let label = Style::default().fg(TEXT_SECONDARY);
    let value = Style::default()
        .fg(ACCENT_HIGHLIGHT)
        .add_modifier(Modifier::BOLD);

    let summary = Paragraph::new(Line::from(vec![
        Span::styled("Size ", label),
        Span::styled(format_file_size(data.file_size), value),
        Span::raw("  │  "),
        Span::styled("Fields ", label),
        Span::styled(data.fields.len().to_string(), value),
        Span::raw("  │  "),
        Span::styled("Delimiter ", label),
        Span::styled(format!("{:?}", delimiter), value),
    ]));

    frame.render_widget(summary, area);
}

fn render_table(frame: &mut Frame, area: Rect, data: &CsvData) {
    if data.fields.is_empty() {
        let paragraph = Paragraph::new("The file is empty").style(Style::default().fg(TEXT_SECONDARY));
        frame.render_widget(paragraph, area);
        return;
    }

    let header = TableRow::new(data.fields.iter().map(|f| Cell::from(f.as_str()))).style(
        Style::default()
            .fg(ACCENT_HIGHLIGHT)
            .add_modifier(Modifier::BOLD),
    );
    // The first line repeats the header
    let rows = data
        .lines
        .iter()
        .skip(1)
        .map(|line| TableRow::new(line.iter().map(|value| Cell::from(value.as_str()))));
    let widths = vec![Constraint::Fill(1); data.fields.len()];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(table, area);
}

fn render_note(frame: &mut Frame, area: Rect, note: Option<&str>) {
    let text = match note {
        Some(note) if !note.is_empty() => Span::styled(note.to_string(), Style::default().fg(TEXT_PRIMARY)),
        _ => Span::styled("No note. Press n to add one", Style::default().fg(TEXT_SECONDARY)),
    };

    let paragraph = Paragraph::new(Line::from(text))
        .block(
            Block::default()
                .title(" Note ")
                .borders(Borders::TOP)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Renders the help overlay
pub fn render_help_overlay(frame: &mut Frame) {
    let area = frame.area();
    let help_area = centered_rect(50, 70, area);

    // Clear background
    frame.render_widget(Clear, help_area);

    let block = Block::default()
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let key = |k: &'static str| Span::styled(k, Style::default().fg(ACCENT_SECONDARY));
    let help_lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(ACCENT_HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![key("  Ctrl+O / o  "), Span::raw("Open a directory")]),
        Line::from(vec![key("  ↑↓ / k j   "), Span::raw("Move selection")]),
        Line::from(vec![key("  Enter / →  "), Span::raw("Open file or folder")]),
        Line::from(vec![key("  Bksp / ←   "), Span::raw("Back")]),
        Line::from(vec![key("  /          "), Span::raw("Filter by name")]),
        Line::from(vec![key("  r          "), Span::raw("Reload")]),
        Line::from(vec![key("  d          "), Span::raw("Set delimiter")]),
        Line::from(vec![key("  n          "), Span::raw("Edit note")]),
        Line::from(vec![key("  x          "), Span::raw("Run code")]),
        Line::from(vec![key("  q / Esc    "), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled(
            "Drop or paste a file path to open it",
            Style::default().fg(TEXT_SECONDARY),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(help_lines)
        .alignment(Alignment::Left)
        .style(Style::default().fg(TEXT_PRIMARY));

    frame.render_widget(paragraph, inner);
}

/// Renders a single text prompt
pub fn render_prompt_overlay(frame: &mut Frame, title: &str, hint: &str, input: &str) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title.to_string())
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));

    let lines = vec![
        Line::from(Span::styled(
            format!("{}_", input),
            Style::default().fg(TEXT_PRIMARY),
        )),
        Line::from(""),
        Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(TEXT_SECONDARY),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_code_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(80, 70, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Run code ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT_HIGHLIGHT))
        .style(Style::default().bg(BG_DARK));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Min(0)])
        .split(inner);

    let code = Paragraph::new(format!("{}_", app.input()))
        .block(
            Block::default()
                .title(" Code (Enter to run, Esc to close) ")
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .style(Style::default().fg(TEXT_PRIMARY))
        .wrap(Wrap { trim: false });
    frame.render_widget(code, chunks[0]);

    let output = match app.executor.state() {
        ExecutionState::Idle => Paragraph::new("").style(Style::default().fg(TEXT_SECONDARY)),
        ExecutionState::Running => {
            Paragraph::new("Running…").style(Style::default().fg(TEXT_SECONDARY))
        }
        ExecutionState::Done(stdout) => {
            Paragraph::new(stdout.clone()).style(Style::default().fg(ACCENT_SECONDARY))
        }
        ExecutionState::Failed(error) => {
            Paragraph::new(error.clone()).style(Style::default().fg(ACCENT_PRIMARY))
        }
    };
    frame.render_widget(output.wrap(Wrap { trim: false }), chunks[1]);
}

/// Renders the footer with controls, or the latest status message
fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let content = match app.status() {
        Some(status) => Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(ACCENT_PRIMARY),
        )),
        None => Line::from(vec![
            Span::styled(
                "Ctrl+O ",
                Style::default()
                    .fg(ACCENT_HIGHLIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("Open", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("↑↓ ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled("Navigate", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("/ ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled("Filter", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("? ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled("Help", Style::default().fg(TEXT_SECONDARY)),
            Span::raw("  │  "),
            Span::styled("q ", Style::default().fg(TEXT_SECONDARY)),
            Span::styled("Quit", Style::default().fg(TEXT_SECONDARY)),
        ]),
    };

    let footer = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::domain::DirectoryEntry;
    use crate::error::Error;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::PathBuf;

    fn draw(app: &App, width: u16, height: u16) -> String {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn load(app: &mut App) {
        let request = app
            .navigation
            .set_directory(Some(PathBuf::from("/data")))
            .unwrap();
        app.navigation.apply_listing(
            &request,
            Ok(vec![
                DirectoryEntry::file("sales.csv", "/data/sales.csv"),
                DirectoryEntry::directory(
                    "archive",
                    "/data/archive",
                    vec![DirectoryEntry::file("old.tsv", "/data/archive/old.tsv")],
                ),
            ]),
        );
    }

    mod layout_tests {
        use super::*;

        #[test]
        fn test_render_empty_state() {
            let app = test_app();
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("No directory opened"));
            assert!(screen.contains("Ctrl+O"));
        }

        #[test]
        fn test_render_listing() {
            let mut app = test_app();
            load(&mut app);
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("/data"));
            assert!(screen.contains("archive/"));
            assert!(screen.contains("sales.csv"));
        }

        #[test]
        fn test_render_breadcrumb_and_back_row() {
            let mut app = test_app();
            load(&mut app);
            app.navigation.activate();
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("› archive"));
            assert!(screen.contains(".."));
            assert!(screen.contains("old.tsv"));
        }

        #[test]
        fn test_render_loading() {
            let mut app = test_app();
            let _ = app.navigation.set_directory(Some(PathBuf::from("/data")));
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("Loading"));
        }

        #[test]
        fn test_render_footer() {
            let app = test_app();
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("Open"));
            assert!(screen.contains("Filter"));
            assert!(screen.contains("Quit"));
        }
    }

    mod dashboard_tests {
        use super::*;

        #[test]
        fn test_render_parsed_table() {
            let mut app = test_app();
            let request = app
                .dashboard
                .set_file(Some(PathBuf::from("/data/sales.csv")))
                .unwrap();
            app.dashboard.apply_table(
                request.id,
                Ok(CsvData {
                    file_size: 1_536,
                    lines: vec![
                        vec!["region".to_string(), "total".to_string()],
                        vec!["north".to_string(), "12".to_string()],
                    ],
                    fields: vec!["region".to_string(), "total".to_string()],
                }),
            );
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("sales.csv"));
            assert!(screen.contains("1.54 KB"));
            assert!(screen.contains("region"));
            assert!(screen.contains("north"));
            assert!(screen.contains("No note"));
        }

        #[test]
        fn test_render_parse_failure() {
            let mut app = test_app();
            let request = app
                .dashboard
                .set_file(Some(PathBuf::from("/data/sales.csv")))
                .unwrap();
            app.dashboard
                .apply_table(request.id, Err(Error::Execution("boom".to_string())));
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("Could not parse file"));
        }

        #[test]
        fn test_render_not_tabular() {
            let mut app = test_app();
            let _ = app.dashboard.set_file(Some(PathBuf::from("/data/readme.md")));
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("Not a CSV or TSV file"));
        }
    }

    mod overlay_tests {
        use super::*;

        #[test]
        fn test_render_help_overlay() {
            let backend = TestBackend::new(100, 40);
            let mut terminal = Terminal::new(backend).unwrap();
            terminal.draw(|frame| render_help_overlay(frame)).unwrap();

            let buffer = terminal.backend().buffer().clone();
            let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
            assert!(screen.contains("Keyboard Shortcuts"));
            assert!(screen.contains("Open a directory"));
        }

        #[test]
        fn test_render_prompt_overlay() {
            let backend = TestBackend::new(100, 30);
            let mut terminal = Terminal::new(backend).unwrap();
            terminal
                .draw(|frame| render_prompt_overlay(frame, " Delimiter ", "hint", ";"))
                .unwrap();

            let buffer = terminal.backend().buffer().clone();
            let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
            assert!(screen.contains("Delimiter"));
            assert!(screen.contains(";_"));
        }

        #[test]
        fn test_render_status_replaces_footer() {
            let mut app = test_app();
            app.handle_paste("not a path");
            let screen = draw(&app, 100, 30);

            assert!(screen.contains("Pasted text is not a file path"));
        }
    }
}
