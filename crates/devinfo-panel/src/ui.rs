use devinfo_core::render::{
    DeveloperView, StatusView, ACTIVITIES_HEADING, ASSETS_HEADING, LOADING_LABEL,
    NOT_CONNECTED_LABEL,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::state::{App, Mounted, View};
use crate::theme::{panel_theme, PanelTheme};

pub fn render<S>(frame: &mut Frame, app: &App<S>) {
    let size = frame.size();
    let theme = panel_theme();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);
    frame.render_widget(render_header(app, theme), layout[0]);
    frame.render_widget(render_body(app, theme), layout[1]);
    frame.render_widget(render_footer(theme), layout[2]);
    if app.help_open {
        render_help_overlay(frame, theme);
    }
}

fn render_header<S>(app: &App<S>, theme: PanelTheme) -> Paragraph<'static> {
    let phase = app.phase_label();
    let status_line = Line::from(vec![
        Span::styled(
            format!("View: {}  ", app.view.title()),
            Style::default().fg(theme.text),
        ),
        Span::styled(
            format!("Service: {}  ", app.service_url),
            Style::default().fg(theme.muted),
        ),
        Span::styled(
            format!("State: {phase}"),
            Style::default().fg(theme.phase_color(phase)),
        ),
    ]);
    let app_line = Line::from(Span::styled(
        format!("App: {}  Mount: #{}", app.descriptor, app.mounts),
        Style::default().fg(theme.muted),
    ));

    Paragraph::new(Text::from(vec![status_line, app_line]))
        .style(Style::default().fg(theme.text).bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg))
                .title(Span::styled("Developer Connection", theme.title_style())),
        )
}

fn body_title(view: View) -> &'static str {
    match view {
        View::Connection => "Pieces OS Connection Status",
        View::Developer => "Developer Information",
    }
}

fn render_body<S>(app: &App<S>, theme: PanelTheme) -> Paragraph<'static> {
    let lines = match app.mounted() {
        Some(Mounted::Status(binder)) => {
            status_lines(&StatusView::from_state(&binder.state()), theme)
        }
        Some(Mounted::Developer(binder)) => {
            developer_lines(&DeveloperView::from_state(&binder.state()), theme)
        }
        None => Vec::new(),
    };
    Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text).bg(theme.surface))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.surface))
                .title(Span::styled(body_title(app.view), theme.title_style())),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0))
}

fn status_lines(view: &StatusView, theme: PanelTheme) -> Vec<Line<'static>> {
    let indicator_color = if view.is_connected() {
        theme.ok
    } else {
        theme.critical
    };
    view.lines()
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            let style = if idx == 0 {
                Style::default()
                    .fg(indicator_color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.text)
            };
            Line::from(Span::styled(line, style))
        })
        .collect()
}

fn developer_lines(view: &DeveloperView, theme: PanelTheme) -> Vec<Line<'static>> {
    view.lines()
        .into_iter()
        .map(|line| {
            let style = match line.as_str() {
                ACTIVITIES_HEADING | ASSETS_HEADING => theme.heading_style(),
                LOADING_LABEL => Style::default().fg(theme.muted),
                NOT_CONNECTED_LABEL => Style::default()
                    .fg(theme.critical)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(theme.text),
            };
            Line::from(Span::styled(line, style))
        })
        .collect()
}

fn render_footer(theme: PanelTheme) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        "Tab view  r remount  j/k scroll  ? help  q quit",
        Style::default().fg(theme.muted),
    )))
    .style(Style::default().bg(theme.bg))
}

fn render_help_overlay(frame: &mut Frame, theme: PanelTheme) {
    let area = centered_rect(60, 60, frame.size());
    let lines = vec![
        Line::from(Span::styled("Controls", theme.title_style())),
        Line::from(Span::styled("Views", theme.heading_style())),
        Line::from("  1 / 2    connection / developer information"),
        Line::from("  Tab      cycle view (remounts)"),
        Line::from("  r        remount current view"),
        Line::from(""),
        Line::from(Span::styled("Navigation", theme.heading_style())),
        Line::from("  j/k      scroll"),
        Line::from("  g        jump to top"),
        Line::from(""),
        Line::from("  ? or F1  toggle this help"),
        Line::from("  Esc      close help"),
        Line::from("  q        quit"),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.text).bg(theme.surface))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.border))
                    .style(Style::default().bg(theme.surface))
                    .title(Span::styled("Help", theme.title_style())),
            )
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100u16.saturating_sub(percent_y)) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100u16.saturating_sub(percent_x)) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{new_app, press, StubService};
    use crossterm::event::KeyCode;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn draw<S>(app: &App<S>) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn buffer_text(buffer: &Buffer) -> String {
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn connected_view_shows_indicator_and_dump() {
        let mut app = new_app(StubService::up(), View::Connection);
        app.mount_changed().await;

        let text = buffer_text(&draw(&app));
        assert!(text.contains("Developer Connection"));
        assert!(text.contains("Pieces OS Connection Status"));
        assert!(text.contains("Successfully Connected"));
        assert!(text.contains("\"ok\": true"));
        assert!(text.contains("State: connected"));
        assert!(text.contains("App: Unknown 0.0.1 (Macos)"));
    }

    #[tokio::test]
    async fn failed_view_shows_only_not_connected() {
        let mut app = new_app(StubService::down(), View::Connection);
        app.mount_changed().await;

        let text = buffer_text(&draw(&app));
        assert!(text.contains("Not Connected"));
        assert!(!text.contains("Successfully Connected"));
        assert!(!text.contains("\"ok\""));
        assert!(text.contains("State: disconnected"));
    }

    #[tokio::test]
    async fn pending_view_renders_not_connected() {
        let app = new_app(StubService::up(), View::Connection);
        let text = buffer_text(&draw(&app));
        assert!(text.contains("Not Connected"));
        assert!(text.contains("State: pending"));
    }

    #[tokio::test]
    async fn developer_view_lists_activities_then_assets() {
        let mut app = new_app(StubService::up(), View::Developer);
        assert!(buffer_text(&draw(&app)).contains("Loading..."));

        app.mount_changed().await;
        let text = buffer_text(&draw(&app));
        assert!(text.contains("Developer Information"));
        let activities = text.find("Activities:").unwrap();
        let assets = text.find("Assets:").unwrap();
        assert!(activities < assets);
        assert!(text.contains("snippet.rs"));
    }

    #[tokio::test]
    async fn drawing_twice_is_stable() {
        let mut app = new_app(StubService::up(), View::Connection);
        app.mount_changed().await;
        assert_eq!(draw(&app), draw(&app));
    }

    #[tokio::test]
    async fn help_overlay_lists_controls() {
        let mut app = new_app(StubService::up(), View::Connection);
        app.handle_key(press(KeyCode::Char('?')));
        let text = buffer_text(&draw(&app));
        assert!(text.contains("Controls"));
        assert!(text.contains("remount current view"));
    }
}
