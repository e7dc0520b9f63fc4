//! Drawing: board, sidebar (next letter, stats, controls) and the game-over popup.
//!
//! Reads only a published [`Snapshot`]; never sees the live game state.

use crate::game::Snapshot;
use crate::grid::{Cell, Pos};
use crate::input::Intent;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Terminal columns per board cell (" A ").
const CELL_WIDTH: u16 = 3;
const SIDEBAR_WIDTH: u16 = 26;

/// What the renderer needs besides the snapshot; fixed for the whole game.
pub struct View<'a> {
    pub theme: &'a Theme,
    pub alphabet: &'a [char],
    pub help: &'a [(String, Intent)],
}

/// Board size in terminal cells, border included.
pub fn board_size(rows: usize, cols: usize) -> (u16, u16) {
    let cols = u16::try_from(cols).unwrap_or(u16::MAX);
    let rows = u16::try_from(rows).unwrap_or(u16::MAX);
    (
        cols.saturating_mul(CELL_WIDTH).saturating_add(2),
        rows.saturating_add(2),
    )
}

pub fn draw(frame: &mut Frame, snapshot: &Snapshot, view: &View<'_>) {
    let area = frame.area();
    let (bw, bh) = board_size(snapshot.grid.rows(), snapshot.grid.cols());
    let total_w = bw + SIDEBAR_WIDTH;
    let total_h = bh.max(sidebar_height(view));

    if area.width < total_w || area.height < total_h {
        let msg = Paragraph::new(format!(
            "Terminal too small: need {total_w}x{total_h}, have {}x{}",
            area.width, area.height
        ))
        .style(Style::default().fg(view.theme.main_fg));
        frame.render_widget(msg, area);
        return;
    }

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let board_area = Rect {
        height: bh,
        ..inner[0]
    };
    draw_board(frame, snapshot, view, board_area);
    draw_sidebar(frame, snapshot, view, inner[1]);

    if snapshot.game_over {
        draw_game_over(frame, snapshot, view.theme, vert[1]);
    }
}

fn sidebar_height(view: &View<'_>) -> u16 {
    // next (3) + stats (5) + controls (border + lines)
    let controls = u16::try_from(help_lines(view.help).len()).unwrap_or(u16::MAX);
    3 + 5 + controls.saturating_add(2)
}

fn draw_board(frame: &mut Frame, snapshot: &Snapshot, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let lines: Vec<Line> = (0..snapshot.grid.rows())
        .map(|row| {
            let spans: Vec<Span> = snapshot
                .grid
                .row(row)
                .iter()
                .enumerate()
                .map(|(col, &cell)| cell_span(snapshot, view, Pos::new(row, col), cell))
                .collect();
            Line::from(spans)
        })
        .collect();

    let board = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Lettercrush ", Style::default().fg(theme.title))),
    );
    frame.render_widget(board, area);
}

fn cell_span<'a>(snapshot: &Snapshot, view: &View<'_>, pos: Pos, cell: Cell) -> Span<'a> {
    let theme = view.theme;
    let (text, mut style) = match cell {
        Cell::Letter(c) => (
            format!(" {c} "),
            Style::default()
                .fg(theme.letter_color(c, view.alphabet))
                .bg(theme.bg)
                .add_modifier(Modifier::BOLD),
        ),
        Cell::Empty if snapshot.crushed.contains(&pos) => (
            " * ".to_string(),
            Style::default().fg(theme.title).bg(theme.bg),
        ),
        Cell::Empty => (
            " · ".to_string(),
            Style::default().fg(theme.inactive_fg).bg(theme.bg),
        ),
    };
    if pos == snapshot.cursor {
        style = style.bg(theme.title).fg(Color::Black);
    }
    Span::styled(text, style)
}

fn draw_sidebar(frame: &mut Frame, snapshot: &Snapshot, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let block = || {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
    };

    let help = help_lines(view.help);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(u16::try_from(help.len()).unwrap_or(0) + 2),
            Constraint::Fill(1),
        ])
        .split(area);

    let next = Line::from(vec![
        Span::styled("Next: ", title_style),
        Span::styled(
            snapshot.next_letter.to_string(),
            Style::default()
                .fg(theme.letter_color(snapshot.next_letter, view.alphabet))
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(next).block(block()), chunks[0]);

    let depth = snapshot
        .last_depth
        .map_or_else(|| "-".to_string(), |d| format!("{d} (x{})", d + 1));
    let stats = Text::from(vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(snapshot.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Turn: ", title_style),
            Span::styled(snapshot.turn.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Cascade: ", title_style),
            Span::styled(depth, fg_style),
        ]),
    ]);
    frame.render_widget(Paragraph::new(stats).block(block()), chunks[1]);

    let controls: Vec<Line> = help
        .into_iter()
        .map(|(keys, label)| {
            Line::from(vec![
                Span::styled(format!("{keys:<10}"), title_style),
                Span::styled(label, fg_style),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(controls).block(block().title(Span::styled(" Keys ", title_style))),
        chunks[2],
    );
}

/// Group key labels by intent: one line per action, e.g. ("h Left", "move left").
fn help_lines(help: &[(String, Intent)]) -> Vec<(String, String)> {
    let mut lines: Vec<(Intent, Vec<&str>)> = Vec::new();
    for (key, intent) in help {
        match lines.iter_mut().find(|(i, _)| i == intent) {
            Some((_, keys)) => keys.push(key.as_str()),
            None => lines.push((*intent, vec![key.as_str()])),
        }
    }
    lines.sort_by_key(|(intent, _)| intent_rank(*intent));
    lines
        .into_iter()
        .map(|(intent, mut keys)| {
            keys.sort_by_key(|k| (k.len(), *k));
            keys.truncate(2);
            (keys.join(" "), intent_label(intent))
        })
        .collect()
}

fn intent_rank(intent: Intent) -> u8 {
    use crate::grid::Direction as D;
    let dir = |d: D| match d {
        D::Left => 0,
        D::Down => 1,
        D::Up => 2,
        D::Right => 3,
    };
    match intent {
        Intent::MoveCursor(d) => dir(d),
        Intent::Swap(d) => 4 + dir(d),
        Intent::Drop => 8,
        Intent::Quit => 9,
    }
}

fn intent_label(intent: Intent) -> String {
    use crate::grid::Direction as D;
    let dir = |d: D| match d {
        D::Left => "left",
        D::Down => "down",
        D::Up => "up",
        D::Right => "right",
    };
    match intent {
        Intent::MoveCursor(d) => format!("move {}", dir(d)),
        Intent::Swap(d) => format!("swap {}", dir(d)),
        Intent::Drop => "drop letter".to_string(),
        Intent::Quit => "quit".to_string(),
    }
}

fn draw_game_over(frame: &mut Frame, snapshot: &Snapshot, theme: &Theme, area: Rect) {
    let popup_w = 28u16.min(area.width);
    let popup_h = 7u16.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Board full ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {}  Turns: {} ", snapshot.score, snapshot.turn),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(" q / Esc: quit ", Style::default().fg(theme.main_fg))),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        ),
        popup,
    );
}
