use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::config::WritingCheck;
use crate::exercise::{
    Blanks, Exercise, Feedback, Media, Quiz, Scramble, StudyCard, Writing, WritingMode,
};
use crate::ui::line_input::LineInput;
use crate::ui::theme::{Theme, ThemeColors};

const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Draws whichever exercise is mounted.
pub struct ExerciseView<'a> {
    pub exercise: &'a Exercise,
    pub title: String,
    pub ticks: u64,
    pub audio_loading: bool,
    pub theme: &'a Theme,
}

impl<'a> ExerciseView<'a> {
    pub fn new(exercise: &'a Exercise, title: String, theme: &'a Theme) -> Self {
        Self {
            exercise,
            title,
            ticks: 0,
            audio_loading: false,
            theme,
        }
    }

    pub fn ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn audio_loading(mut self, loading: bool) -> Self {
        self.audio_loading = loading;
        self
    }
}

impl Widget for ExerciseView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let spinner = SPINNER[(self.ticks as usize) % SPINNER.len()];

        let mut lines = match self.exercise {
            Exercise::Study(card) => study_lines(card, spinner, colors),
            Exercise::Scramble(scramble) => scramble_lines(scramble, colors),
            Exercise::Blanks(blanks) => blanks_lines(blanks, colors),
            Exercise::Writing(writing) => writing_lines(writing, spinner, colors),
            Exercise::Quiz(quiz) => quiz_lines(quiz, colors),
        };
        if self.audio_loading {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{spinner} Getting the sound ready..."),
                Style::default().fg(colors.muted()),
            )));
        }

        let block = Block::bordered()
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ))
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block)
            .render(area, buf);
    }
}

/// The status line under the body, colored by tone.
pub fn feedback_line<'a>(feedback: Option<&'a Feedback>, theme: &Theme) -> Line<'a> {
    match feedback {
        Some(feedback) => Line::from(Span::styled(
            format!("  {}", feedback.message),
            Style::default()
                .fg(theme.colors.tone(feedback.tone))
                .add_modifier(Modifier::BOLD),
        )),
        None => Line::from(""),
    }
}

fn heading<'a>(text: &'a str, colors: &ThemeColors) -> Line<'a> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(colors.fg())
            .add_modifier(Modifier::BOLD),
    ))
}

fn muted<'a>(text: impl Into<String>, colors: &ThemeColors) -> Line<'a> {
    Line::from(Span::styled(text.into(), Style::default().fg(colors.muted())))
}

/// Spans for a text field with a block cursor, padded to `min_width` cells.
fn input_spans<'a>(
    input: &'a LineInput,
    focused: bool,
    min_width: usize,
    base: Style,
    colors: &ThemeColors,
) -> Vec<Span<'a>> {
    let (before, cursor, after) = input.render_parts();
    let mut spans = vec![Span::styled(before, base)];
    let mut used = before.chars().count() + after.chars().count();
    if focused {
        let cursor_style = Style::default().fg(colors.bg()).bg(colors.highlight());
        spans.push(Span::styled(
            cursor.map_or_else(|| " ".to_string(), |c| c.to_string()),
            cursor_style,
        ));
        used += 1;
    } else if let Some(c) = cursor {
        spans.push(Span::styled(c.to_string(), base));
        used += 1;
    }
    spans.push(Span::styled(after, base));
    if used < min_width {
        spans.push(Span::styled(" ".repeat(min_width - used), base));
    }
    spans
}

fn study_lines<'a>(card: &'a StudyCard, spinner: &str, colors: &ThemeColors) -> Vec<Line<'a>> {
    let picture = match &card.image {
        Media::Idle => muted("No picture right now.", colors),
        Media::Loading(_) => muted(format!("{spinner} Drawing a picture..."), colors),
        Media::Ready(path) => Line::from(vec![
            Span::styled("🖼  Picture ready ", Style::default().fg(colors.success())),
            Span::styled(
                format!("({})", path.display()),
                Style::default().fg(colors.muted()),
            ),
        ]),
        Media::Failed => Line::from(Span::styled(
            "The picture could not be drawn. Press r to try again.",
            Style::default().fg(colors.warning()),
        )),
    };

    vec![
        Line::from(""),
        Line::from(Span::styled(
            card.item.english.as_str(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            card.item.korean.as_str(),
            Style::default().fg(colors.fg()),
        )),
        Line::from(""),
        picture,
        Line::from(""),
        muted("Read it out loud, then press Enter.", colors),
    ]
}

fn scramble_lines<'a>(scramble: &'a Scramble, colors: &ThemeColors) -> Vec<Line<'a>> {
    let tile = Style::default().fg(colors.fg()).bg(colors.blank_bg());
    let placed = Style::default().fg(colors.bg()).bg(colors.accent());

    let mut answer: Vec<Span> = Vec::new();
    for token in scramble.answer() {
        answer.push(Span::styled(format!(" {token} "), placed));
        answer.push(Span::raw(" "));
    }
    if answer.is_empty() {
        answer.push(Span::styled(
            "Pick words in order...",
            Style::default().fg(colors.muted()),
        ));
    }

    let mut bank: Vec<Span> = Vec::new();
    for (i, token) in scramble.bank().iter().enumerate() {
        let style = if i == scramble.cursor {
            Style::default()
                .fg(colors.bg())
                .bg(colors.highlight())
                .add_modifier(Modifier::BOLD)
        } else {
            tile
        };
        bank.push(Span::styled(format!(" {token} "), style));
        bank.push(Span::raw(" "));
    }

    let mut lines = vec![
        heading("Put the words in the right order.", colors),
        Line::from(""),
        muted("Your sentence:", colors),
        Line::from(answer),
        Line::from(""),
    ];
    if !scramble.bank().is_empty() {
        lines.push(muted("Words:", colors));
        lines.push(Line::from(bank));
    } else if scramble.ready_to_check() {
        lines.push(muted("All words placed. Press Enter to check.", colors));
    }
    lines
}

fn blanks_lines<'a>(blanks: &'a Blanks, colors: &ThemeColors) -> Vec<Line<'a>> {
    let mut spans: Vec<Span> = Vec::new();
    for (position, token) in blanks.tokens().iter().enumerate() {
        if let Some(input) = blanks.input_at(position) {
            let focused = !blanks.is_solved() && blanks.focused_position() == Some(position);
            let fg = if blanks.is_wrong(position) {
                colors.error()
            } else if blanks.is_solved() {
                colors.success()
            } else {
                colors.fg()
            };
            let base = Style::default()
                .fg(fg)
                .bg(colors.blank_bg())
                .add_modifier(Modifier::UNDERLINED);
            spans.extend(input_spans(
                input,
                focused,
                token.chars().count(),
                base,
                colors,
            ));
        } else {
            spans.push(Span::styled(
                token.as_str(),
                Style::default().fg(colors.fg()),
            ));
        }
        spans.push(Span::raw(" "));
    }

    vec![
        heading("Fill in the missing words.", colors),
        Line::from(""),
        Line::from(spans),
        Line::from(""),
        muted("Tab moves between blanks. Enter checks.", colors),
    ]
}

fn writing_lines<'a>(writing: &'a Writing, spinner: &str, colors: &ThemeColors) -> Vec<Line<'a>> {
    let instruction = match (writing.mode, writing.check) {
        (WritingMode::Recall, WritingCheck::Typed) => "Write the whole sentence in English.",
        (WritingMode::Dictation, WritingCheck::Typed) => "Listen and write the word.",
        (_, WritingCheck::Handwriting) => "Write it on paper, then give the path to a photo.",
    };

    let mut lines = vec![
        heading(instruction, colors),
        Line::from(""),
        Line::from(Span::styled(
            writing.item.korean.as_str(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )),
    ];

    if writing.mode == WritingMode::Dictation {
        lines.push(if writing.hint_shown() || writing.is_solved() {
            Line::from(Span::styled(
                format!("Hint: {}", writing.item.english),
                Style::default().fg(colors.warning()),
            ))
        } else {
            muted("Need help? Ctrl-t shows the word.", colors)
        });
    } else if writing.is_solved() {
        lines.push(Line::from(Span::styled(
            writing.item.english.as_str(),
            Style::default().fg(colors.success()),
        )));
    }

    let label = match writing.check {
        WritingCheck::Typed => "> ",
        WritingCheck::Handwriting => "Photo: ",
    };
    let base = Style::default().fg(colors.fg());
    let mut field = vec![Span::styled(label, Style::default().fg(colors.muted()))];
    let focused = !writing.is_solved() && !writing.is_checking();
    field.extend(input_spans(writing.input(), focused, 0, base, colors));

    lines.push(Line::from(""));
    lines.push(Line::from(field));
    if writing.is_checking() {
        lines.push(Line::from(""));
        lines.push(muted(format!("{spinner} Looking at your writing..."), colors));
    } else if writing.input().completion_error {
        lines.push(Line::from(Span::styled(
            "That folder could not be read.",
            Style::default().fg(colors.warning()),
        )));
    }
    lines
}

fn quiz_lines<'a>(quiz: &'a Quiz, colors: &ThemeColors) -> Vec<Line<'a>> {
    let mut lines = vec![
        heading(quiz.direction.question(), colors),
        Line::from(""),
        Line::from(Span::styled(
            quiz.prompt(),
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, option) in quiz.options().iter().enumerate() {
        let selected = i == quiz.cursor && !quiz.is_solved();
        let (mark, style) = if quiz.is_solved() && quiz.is_answer(option) {
            (
                "✓",
                Style::default()
                    .fg(colors.success())
                    .add_modifier(Modifier::BOLD),
            )
        } else if quiz.is_wrong(option) {
            (
                "✗",
                Style::default()
                    .fg(colors.error())
                    .add_modifier(Modifier::CROSSED_OUT),
            )
        } else if selected {
            (
                ">",
                Style::default()
                    .fg(colors.highlight())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (" ", Style::default().fg(colors.fg()))
        };
        lines.push(Line::from(Span::styled(
            format!(" {mark} [{}] {}", i + 1, quiz.option_label(option)),
            style,
        )));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StudyItem;
    use crate::exercise::QuizDirection;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rendered(widget: ExerciseView, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn words() -> Vec<StudyItem> {
        ["cake", "bike", "rope", "cute"]
            .iter()
            .zip(1..)
            .map(|(word, id)| StudyItem {
                id,
                english: word.to_string(),
                korean: format!("뜻{id}"),
            })
            .collect()
    }

    #[test]
    fn quiz_marks_wrong_picks() {
        let items = words();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut quiz = Quiz::new(&items[0], &items, QuizDirection::KoreanToEnglish, &mut rng);
        let wrong = quiz
            .options()
            .iter()
            .position(|option| option.id != items[0].id)
            .unwrap();
        let label = quiz.option_label(&quiz.options()[wrong]);
        quiz.pick(wrong);

        let exercise = Exercise::Quiz(quiz);
        let text = rendered(
            ExerciseView::new(&exercise, "Find the English word".into(), &Theme::default()),
            60,
            14,
        );
        assert!(text.contains(&format!("✗ [{}] {label}", wrong + 1)));
    }

    #[test]
    fn dictation_hides_the_word_until_hinted() {
        let item = words().remove(1);
        let writing = Writing::new(item, WritingMode::Dictation, WritingCheck::Typed);
        let mut exercise = Exercise::Writing(writing);
        let theme = Theme::default();
        let text = rendered(ExerciseView::new(&exercise, "Listen".into(), &theme), 60, 12);
        assert!(!text.contains("bike"));

        if let Exercise::Writing(writing) = &mut exercise {
            writing.reveal_hint();
        }
        let text = rendered(ExerciseView::new(&exercise, "Listen".into(), &theme), 60, 12);
        assert!(text.contains("Hint: bike"));
    }

    #[test]
    fn scramble_shows_every_tile() {
        let item = StudyItem {
            id: 1,
            english: "I like my kite.".to_string(),
            korean: "나는 내 연이 좋아요.".to_string(),
        };
        let mut rng = SmallRng::seed_from_u64(9);
        let exercise = Exercise::Scramble(Scramble::new(&item, &mut rng));
        let text = rendered(
            ExerciseView::new(&exercise, "Order".into(), &Theme::default()).audio_loading(true),
            80,
            12,
        );
        for token in ["I", "like", "my", "kite."] {
            assert!(text.contains(&format!(" {token} ")));
        }
        assert!(text.contains("Getting the sound ready"));
    }
}
