use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::content::{Lesson, LessonKind};
use crate::ui::theme::Theme;

/// The home screen: one card per lesson.
pub struct LessonList<'a> {
    pub lessons: &'a [Lesson],
    pub selected: usize,
    pub theme: &'a Theme,
}

impl<'a> LessonList<'a> {
    pub fn new(lessons: &'a [Lesson], selected: usize, theme: &'a Theme) -> Self {
        Self {
            lessons,
            selected,
            theme,
        }
    }
}

impl Widget for LessonList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        let title = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "wordkite",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "오늘은 어떤 수업을 할까요?",
                Style::default().fg(colors.fg()),
            )),
        ])
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        if self.lessons.is_empty() {
            Paragraph::new("No lessons found.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(colors.muted()))
                .render(layout[1], buf);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.lessons
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[1]);

        for (i, (lesson, row)) in self.lessons.iter().zip(rows.iter()).enumerate() {
            let selected = i == self.selected;
            let marker = if selected { ">" } else { " " };
            let badge = match lesson.kind {
                LessonKind::Sentences => "문장",
                LessonKind::Words => "단어",
            };
            let label_style = if selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            let lines = vec![
                Line::from(vec![
                    Span::styled(format!(" {marker} [{}] ", i + 1), label_style),
                    Span::styled(&*lesson.title, label_style),
                ]),
                Line::from(Span::styled(
                    format!(
                        "       {} · {badge} · {} {}",
                        lesson.date,
                        lesson.len(),
                        lesson.kind.noun()
                    ),
                    Style::default().fg(colors.muted()),
                )),
            ];
            Paragraph::new(lines).render(*row, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Catalog;

    fn rendered(widget: LessonList, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn shows_every_lesson_and_marks_the_selection() {
        let catalog = Catalog::builtin().unwrap();
        let theme = Theme::default();
        let text = rendered(LessonList::new(catalog.lessons(), 1, &theme), 60, 16);
        // Wide Korean glyphs pad the buffer, so match the ASCII parts.
        assert!(text.contains("(5 Sentences)"));
        assert!(text.contains("(Magic E Words)"));
        assert!(text.contains("> [2]"));
        assert!(!text.contains("> [1]"));
    }
}
