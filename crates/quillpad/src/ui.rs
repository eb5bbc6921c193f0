use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::status_manager::MessageKind;
use crate::ui_state::{Mode, SearchFocus};

pub fn draw(f: &mut Frame, app: &mut App) {
    let search_height = match (app.ui.mode(), app.ui.replace_visible()) {
        (Mode::Search, true) => 2,
        (Mode::Search, false) => 1,
        _ => 0,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Editor or preview
            Constraint::Length(search_height),
            Constraint::Length(2), // Shortcuts + status message
        ])
        .split(f.size());

    draw_title_bar(f, app, chunks[0]);

    if app.ui.is_help_shown() {
        draw_help(f, chunks[1]);
    } else if app.ui.is_preview() {
        draw_preview(f, app, chunks[1]);
    } else {
        draw_editor(f, app, chunks[1]);
    }

    if search_height > 0 {
        draw_search_bar(f, app, chunks[2]);
    }
    draw_status_bar(f, app, chunks[3]);
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let name = app
        .files
        .file_name()
        .unwrap_or_else(|| "Ready to write".to_string());
    let mut title = format!("  quillpad -- {}", name);
    if app.is_modified() {
        title.push_str(" [Modified]");
    }
    if app.ui.is_preview() {
        title.push_str(" [Preview]");
    }

    let title_bar = Paragraph::new(title)
        .style(Style::default().bg(Color::Blue).fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(title_bar, area);
}

fn draw_editor(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(5), // Line numbers
            Constraint::Min(0),    // Content
        ])
        .split(area);

    app.session
        .document
        .set_viewport_height(area.height as usize);

    let lines = app.session.document.viewport_lines();
    let offset = app.session.document.viewport_offset();
    let selection = app.session.document.selection_span();

    let line_numbers: Vec<Line> = (0..lines.len())
        .map(|i| Line::from(format!("{:>4} ", offset + i + 1)))
        .collect();
    let line_number_widget = Paragraph::new(line_numbers)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::RIGHT));
    f.render_widget(line_number_widget, chunks[0]);

    let mut text_lines = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let line_str = line.trim_end_matches('\n');
        match selection {
            Some((sel_line, start_col, end_col)) if sel_line == offset + i => {
                text_lines.push(highlighted_line(line_str, start_col, end_col));
            }
            _ => text_lines.push(Line::from(line_str.to_string())),
        }
    }

    let content = Paragraph::new(text_lines).style(Style::default().fg(Color::White));
    f.render_widget(content, chunks[1]);

    // Terminal cursor only while the editor itself has focus
    if app.ui.mode() == Mode::Edit {
        let (cursor_line, cursor_col) = app.session.document.cursor_position();
        if cursor_line >= offset && cursor_line < offset + lines.len().max(1) {
            let line_str = lines
                .get(cursor_line - offset)
                .map(|l| l.trim_end_matches('\n').to_string())
                .unwrap_or_default();
            let prefix: String = line_str.chars().take(cursor_col).collect();
            let x = chunks[1].x + prefix.width() as u16;
            let y = chunks[1].y + (cursor_line - offset) as u16;
            if x < chunks[1].x + chunks[1].width && y < chunks[1].y + chunks[1].height {
                f.set_cursor(x, y);
            }
        }
    }
}

fn highlighted_line(line: &str, start_col: usize, end_col: usize) -> Line<'static> {
    let before: String = line.chars().take(start_col).collect();
    let matched: String = line.chars().skip(start_col).take(end_col - start_col).collect();
    let after: String = line.chars().skip(end_col).collect();
    Line::from(vec![
        Span::raw(before),
        Span::styled(
            matched,
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(after),
    ])
}

fn draw_preview(f: &mut Frame, app: &App, area: Rect) {
    let html = app.ui.preview_html().unwrap_or_default();
    let preview = Paragraph::new(html.to_string())
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Preview (rendered HTML) ")
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(preview, area);
}

fn draw_search_bar(f: &mut Frame, app: &App, area: Rect) {
    let focused = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let unfocused = Style::default().fg(Color::Gray);

    let query_style = if app.ui.search_focus() == SearchFocus::Query {
        focused
    } else {
        unfocused
    };
    let query_line = Line::from(vec![
        Span::styled("Find: ", query_style),
        Span::raw(app.ui.search_input().to_string()),
    ]);

    let mut rows = vec![query_line];
    if app.ui.replace_visible() {
        let replace_style = if app.ui.search_focus() == SearchFocus::Replacement {
            focused
        } else {
            unfocused
        };
        rows.push(Line::from(vec![
            Span::styled("Replace: ", replace_style),
            Span::raw(app.ui.replace_input().to_string()),
        ]));
    }
    f.render_widget(Paragraph::new(rows), area);

    // Cursor at the end of the focused field
    let (label_width, value, row) = match app.ui.search_focus() {
        SearchFocus::Query => ("Find: ".width(), app.ui.search_input(), 0u16),
        SearchFocus::Replacement => ("Replace: ".width(), app.ui.replace_input(), 1u16),
    };
    let x = area.x + (label_width + value.width()) as u16;
    let y = area.y + row;
    if x < area.x + area.width && y < area.y + area.height {
        f.set_cursor(x, y);
    }
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    match app.ui.mode() {
        Mode::Command => {
            let input = Paragraph::new(format!(":{}", app.ui.command_buffer()))
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(input, chunks[0]);
            let x = chunks[0].x + 1 + app.ui.command_buffer().width() as u16;
            if x < chunks[0].x + chunks[0].width {
                f.set_cursor(x, chunks[0].y);
            }
        }
        _ => {
            let shortcuts = shortcut_line(app);
            let shortcut_bar =
                Paragraph::new(shortcuts).style(Style::default().bg(Color::DarkGray));
            f.render_widget(shortcut_bar, chunks[0]);
        }
    }

    let (message, style) = match app.ui.status.current() {
        Some(status) => {
            let color = match status.kind {
                MessageKind::Info => Color::White,
                MessageKind::Success => Color::Green,
                MessageKind::Warning => Color::Yellow,
                MessageKind::Error => Color::Red,
            };
            (status.content.clone(), Style::default().fg(color))
        }
        None => (String::new(), Style::default()),
    };
    f.render_widget(Paragraph::new(message).style(style), chunks[1]);
}

fn shortcut_line(app: &App) -> Line<'static> {
    let bold = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);

    if app.ui.mode() == Mode::Search {
        return Line::from(vec![
            Span::styled("Enter", bold),
            Span::raw(" Next  "),
            Span::styled("Up", bold),
            Span::raw(" Prev  "),
            Span::styled("Tab", bold),
            Span::raw(" Field  "),
            Span::styled("^R", bold),
            Span::raw(" Replace  "),
            Span::styled("^L", bold),
            Span::raw(" Replace all  "),
            Span::styled("Esc", bold),
            Span::raw(" Close"),
        ]);
    }

    Line::from(vec![
        Span::styled("^F", bold),
        Span::raw(" Find  "),
        Span::styled("^H", bold),
        Span::raw(" Replace  "),
        Span::styled("^S", bold),
        Span::raw(" Save  "),
        Span::styled("^P", bold),
        Span::raw(" Preview  "),
        Span::styled("Esc", bold),
        Span::raw(" Commands  "),
        Span::styled("^G", bold),
        Span::raw(" Help  "),
        Span::styled("^Q", bold),
        Span::raw(" Quit"),
    ])
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            " HELP -- quillpad keys and commands",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(" Editing:"),
        Line::from("  Type to insert text; arrows, Home/End, PgUp/PgDn to move"),
        Line::from(""),
        Line::from(" Shortcuts:"),
        Line::from("  Ctrl+F  Find            Ctrl+H  Find and replace"),
        Line::from("  Ctrl+S  Save            Ctrl+N  New note"),
        Line::from("  Ctrl+P  Toggle preview  Ctrl+W  Close file"),
        Line::from("  Ctrl+G  This help       Ctrl+Q  Quit"),
        Line::from(""),
        Line::from(" Search bar:"),
        Line::from("  Enter/Down next match, Up previous, Tab switch field"),
        Line::from("  Ctrl+R replace current, Ctrl+L replace all, Esc close"),
        Line::from(""),
        Line::from(" Commands (Esc, then type):"),
        Line::from("  :w [path]        Save, or save as path"),
        Line::from("  :e <path>        Open file"),
        Line::from("  :recent [n]      List recent files, or open the n-th"),
        Line::from("  :new / :close    New note / close file"),
        Line::from("  :append <path>   Append note to a file (:append! to force)"),
        Line::from("  :prepend <path>  Prepend note to a file"),
        Line::from("  :preview         Toggle Markdown preview"),
        Line::from("  :export <path>   Write rendered HTML"),
        Line::from("  :set <key> <v>   theme, dateformat, includedate, datetext,"),
        Line::from("                   opendir, savedir, stamp"),
        Line::from("  :q / :q! / :wq   Quit / force quit / save and quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Press Esc to close help",
            Style::default().add_modifier(Modifier::ITALIC),
        )]),
    ];

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Left);
    f.render_widget(help, area);
}
