use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;

/// Trophy card shown when a word lesson is mastered.
pub struct Celebration<'a> {
    pub headline: &'a str,
    pub message: &'a str,
    pub detail: String,
    pub theme: &'a Theme,
}

impl<'a> Celebration<'a> {
    pub fn word_mastered(word_count: usize, theme: &'a Theme) -> Self {
        Self {
            headline: "단어 마스터!",
            message: "모든 단어를 완벽하게 외웠어요!",
            detail: format!("You mastered all {word_count} words."),
            theme,
        }
    }
}

impl Widget for Celebration<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.warning()))
            .style(Style::default().bg(colors.bg()));

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("🏆", Style::default().fg(colors.warning()))),
            Line::from(""),
            Line::from(Span::styled(
                self.headline,
                Style::default()
                    .fg(colors.warning())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(self.message, Style::default().fg(colors.fg()))),
            Line::from(""),
            Line::from(Span::styled(
                self.detail,
                Style::default().fg(colors.success()),
            )),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}
