use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::SentenceStep;
use crate::ui::theme::Theme;

/// Four segments, one per sentence step: done, current, or still ahead.
pub struct StepTracker<'a> {
    pub current: SentenceStep,
    pub theme: &'a Theme,
}

impl<'a> StepTracker<'a> {
    pub fn new(current: SentenceStep, theme: &'a Theme) -> Self {
        Self { current, theme }
    }
}

impl Widget for StepTracker<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let segments = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        for (step, segment) in SentenceStep::ALL.iter().zip(segments.iter()) {
            let (mark, style) = if step.index() < self.current.index() {
                ("✓", Style::default().fg(colors.success()))
            } else if *step == self.current {
                (
                    "●",
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("○", Style::default().fg(colors.muted()))
            };
            let border = if *step == self.current {
                colors.border_focused()
            } else {
                colors.border()
            };
            Paragraph::new(format!("{mark} {}. {}", step.index() + 1, step.label()))
                .style(style)
                .alignment(Alignment::Center)
                .block(Block::bordered().border_style(Style::default().fg(border)))
                .render(*segment, buf);
        }
    }
}
