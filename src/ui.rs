use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use vocaclip::{
    export::ExportSummary,
    player::MediaPlayer,
    session::Response,
    timestamp::format_timestamp,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 2;

impl<P: MediaPlayer> Widget for &App<P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::Reviewing => render_card(self, area, buf),
            AppState::Done(summary) => render_summary(summary, area, buf),
        }
    }
}

fn render_card<P: MediaPlayer>(app: &App<P>, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let (Some(index), Some(word)) = (session.current_index(), session.current_word()) else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(Color::Gray);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // progress
            Constraint::Min(0),    // word card
            Constraint::Length(1), // status
            Constraint::Length(3), // keys
        ])
        .split(area);

    // progress
    let playing = if session.is_clip_playing() {
        Span::styled("▶ playing", Style::default().fg(Color::Green))
    } else {
        Span::styled("⏸ paused", dim_style)
    };
    let progress = format!("Word {}/{}", index + 1, session.len());
    let video_room = (chunks[0].width as usize)
        .saturating_sub(progress.width() + playing.content.width() + 8);
    let video = session
        .video_path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let header = Line::from(vec![
        Span::styled(progress, bold_style),
        Span::raw("  "),
        Span::styled(fit_width(&video, video_room), dim_style),
        Span::raw("  "),
        playing,
    ]);
    Paragraph::new(header)
        .block(Block::default().borders(Borders::ALL).title(" vocaclip "))
        .render(chunks[0], buf);

    // word card
    let window = session.current_window();
    let clip = window
        .map(|w| {
            format!(
                "{} → {}",
                format_timestamp(w.start_ms),
                format_timestamp(w.stop_ms)
            )
        })
        .unwrap_or_default();
    let response = session.current_response().unwrap_or_default();
    let response_style = match response {
        Response::Known => Style::default().fg(Color::Green).patch(bold_style),
        Response::Unknown => Style::default().fg(Color::Red).patch(bold_style),
        Response::Unset => dim_style,
    };

    let labelled = |label: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(label, label_style),
            Span::raw(value.to_string()),
        ])
    };

    let card = vec![
        Line::from(Span::styled(
            word.term.clone(),
            Style::default().fg(Color::Cyan).patch(bold_style),
        )),
        Line::default(),
        labelled("English: ", &word.english_meaning),
        labelled("Turkish: ", &word.turkish_meaning),
        Line::default(),
        labelled("Example: ", &word.sample_sentence_in_english),
        labelled("Türkçe: ", &word.sample_sentence_in_turkish),
        Line::default(),
        labelled("Clip: ", &clip),
        Line::from(vec![
            Span::styled("Answer: ", label_style),
            Span::styled(response.to_string(), response_style),
        ]),
    ];
    Paragraph::new(card)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    // status
    if let Some(status) = &app.status {
        Paragraph::new(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Red),
        ))
        .render(chunks[2], buf);
    }

    // keys
    let key = |k: &'static str, action: &'static str, enabled: bool| {
        let style = if enabled { Style::default() } else { dim_style };
        vec![
            Span::styled(k, style.patch(bold_style)),
            Span::styled(action, style),
        ]
    };
    let forward = if session.is_last() { " finish  " } else { " next  " };
    let legend: Vec<Span> = [
        key("(k)", " knew it  ", true),
        key("(d)", " didn't know  ", true),
        key("(←)", " prev  ", index > 0),
        key("(→)", forward, true),
        key("(r)", " replay  ", true),
        key("(esc)", " quit", true),
    ]
    .into_iter()
    .flatten()
    .collect();
    Paragraph::new(Line::from(legend))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn render_summary(summary: &ExportSummary, area: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(
            "Session complete",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(format!(
            "{} of {} words left to study",
            summary.kept, summary.total
        )),
        Line::from(format!("saved to {}", summary.path.display())),
        Line::default(),
        Line::from(Span::styled(
            "press any key to exit",
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        )),
    ];

    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(top), Constraint::Min(0)])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

/// Shortens `s` to at most `max` terminal columns, marking the cut with `…`
fn fit_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
