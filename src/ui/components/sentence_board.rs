use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::content::Lesson;
use crate::engine::SentenceProgress;
use crate::ui::theme::Theme;

/// Missions per row. Up/Down on the board move by this much.
pub const COLUMNS: usize = 2;

const CARD_HEIGHT: u16 = 5;

/// The mission grid of a sentence lesson.
pub struct SentenceBoard<'a> {
    pub lesson: &'a Lesson,
    pub progress: &'a SentenceProgress,
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> SentenceBoard<'a> {
    pub fn new(
        lesson: &'a Lesson,
        progress: &'a SentenceProgress,
        selected: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            lesson,
            progress,
            selected,
            theme,
        }
    }
}

impl Widget for SentenceBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let banner_height = if self.progress.is_lesson_complete() { 4 } else { 2 };
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(banner_height), Constraint::Min(0)])
            .split(area);

        let banner = if self.progress.is_lesson_complete() {
            vec![
                Line::from(Span::styled(
                    "🏆 참 잘했어요! 🏆",
                    Style::default()
                        .fg(colors.warning())
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "All missions complete!",
                    Style::default().fg(colors.success()),
                )),
                Line::from(Span::styled(
                    "오늘 공부 끝!",
                    Style::default().fg(colors.fg()),
                )),
            ]
        } else {
            vec![Line::from(Span::styled(
                "오늘의 미션을 모두 완료해보세요!",
                Style::default().fg(colors.muted()),
            ))]
        };
        Paragraph::new(banner)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let rows = self.lesson.items.len().div_ceil(COLUMNS);
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                (0..rows)
                    .map(|_| Constraint::Length(CARD_HEIGHT))
                    .collect::<Vec<_>>(),
            )
            .split(layout[1]);

        for (row, chunk) in self.lesson.items.chunks(COLUMNS).enumerate() {
            let Some(row_area) = row_areas.get(row) else {
                break;
            };
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, COLUMNS as u32); COLUMNS])
                .split(*row_area);

            for (col, item) in chunk.iter().enumerate() {
                let index = row * COLUMNS + col;
                let selected = index == self.selected;
                let done = self.progress.is_completed(item.id);

                let star = if done { " ★" } else { "" };
                let title_style = if done {
                    Style::default().fg(colors.warning())
                } else {
                    Style::default().fg(colors.accent())
                };
                let border = if selected {
                    colors.border_focused()
                } else {
                    colors.border()
                };
                let block = Block::bordered()
                    .title(Span::styled(
                        format!(" Mission {}{star} ", item.id),
                        title_style.add_modifier(Modifier::BOLD),
                    ))
                    .border_style(Style::default().fg(border));

                let english_style = if selected {
                    Style::default()
                        .fg(colors.fg())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Paragraph::new(vec![
                    Line::from(Span::styled(item.english.as_str(), english_style)),
                    Line::from(Span::styled(
                        item.korean.as_str(),
                        Style::default().fg(colors.muted()),
                    )),
                ])
                .wrap(Wrap { trim: true })
                .block(block)
                .render(cells[col], buf);
            }
        }
    }
}
