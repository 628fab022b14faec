use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use wordkite::ai::{self, AiWorker, Timeouts};
use wordkite::ai::cache::MediaCache;
use wordkite::app::{App, AppScreen};
use wordkite::config::{Config, WritingCheck};
use wordkite::content::Catalog;
use wordkite::engine::WordState;
use wordkite::event::{AppEvent, EventHandler};
use wordkite::exercise::{Exercise, WritingMode};
use wordkite::logging;
use wordkite::ui::components::celebration::Celebration;
use wordkite::ui::components::exercise_view::{ExerciseView, feedback_line};
use wordkite::ui::components::lesson_list::LessonList;
use wordkite::ui::components::progress_bar::ProgressBar;
use wordkite::ui::components::sentence_board::{self, SentenceBoard};
use wordkite::ui::components::step_tracker::StepTracker;
use wordkite::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use wordkite::ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "wordkite",
    version,
    about = "Terminal English tutor: sentence missions and word drills"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Open this lesson id straight away")]
    lesson: Option<String>,

    #[arg(long, help = "Seed for shuffles and blanks")]
    seed: Option<u64>,

    #[arg(long, help = "Never call the AI service")]
    offline: bool,

    #[arg(long, help = "Check writing from handwriting photos")]
    handwriting: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let saved_config = Config::load()?;
    let mut config = saved_config.clone();
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if cli.handwriting {
        config.writing_check = WritingCheck::Handwriting;
    }
    config.normalize_theme(&Theme::available_themes());
    config.normalize_timeouts();

    let log_file = logging::init(&config.log_level);
    if let Err(e) = &log_file {
        eprintln!("logging disabled: {e}");
    }

    let catalog = Catalog::load(config.lessons_path().as_deref())?;
    let cache = MediaCache::new()
        .or_else(|| MediaCache::with_base_dir(std::env::temp_dir().join("wordkite-media")).ok());
    if cache.is_none() {
        log::warn!("no media cache directory; pictures and sound will not be kept");
    }
    let rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let events = EventHandler::new(Duration::from_millis(100));
    let capability = ai::connect(&config, cli.offline);
    let worker = AiWorker::new(capability, events.sender(), Timeouts::from_config(&config));

    let mut app = App::new(config, catalog, worker, cache, rng)
        .with_saved_config(saved_config, Config::config_path());
    if let Some(id) = cli.lesson {
        if !app.open_lesson(&id) {
            anyhow::bail!("no lesson with id {id:?}");
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("{err:?}");
        eprintln!("Error: {err:?}");
    }
    log::info!("wordkite exiting");

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.tick(),
            AppEvent::Resize(_, _) => {}
            AppEvent::Ai(response) => app.handle_ai(response),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    app.notice = None;

    match app.screen() {
        AppScreen::LessonList => handle_lesson_list_key(app, key),
        AppScreen::SentenceBoard => handle_board_key(app, key),
        AppScreen::SentenceMission => handle_mission_key(app, key),
        AppScreen::WordDrill => handle_drill_key(app, key),
        AppScreen::WordMastered => handle_mastered_key(app, key),
    }
}

fn handle_lesson_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Up | KeyCode::Char('k') => app.lesson_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.lesson_next(),
        KeyCode::Enter => app.open_selected_lesson(),
        KeyCode::Char('t') => app.cycle_theme(),
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            if index < app.catalog.len() {
                app.lesson_selected = index;
                app.open_selected_lesson();
            }
        }
        _ => {}
    }
}

fn handle_board_key(app: &mut App, key: KeyEvent) {
    let row = sentence_board::COLUMNS as isize;
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.go_home(),
        KeyCode::Left | KeyCode::Char('h') => app.board_move(-1),
        KeyCode::Right | KeyCode::Char('l') => app.board_move(1),
        KeyCode::Up | KeyCode::Char('k') => app.board_move(-row),
        KeyCode::Down | KeyCode::Char('j') => app.board_move(row),
        KeyCode::Enter => app.start_selected_sentence(),
        _ => {}
    }
}

fn handle_mission_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.leave_sentence();
        return;
    }
    handle_exercise_key(app, key);
}

fn handle_drill_key(app: &mut App, key: KeyEvent) {
    let typing = app.exercise.as_ref().is_some_and(Exercise::captures_text);
    match key.code {
        KeyCode::Esc => app.go_home(),
        KeyCode::Char('q') if !typing => app.go_home(),
        _ => handle_exercise_key(app, key),
    }
}

fn handle_mastered_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
        app.go_home();
    }
}

/// Keys shared by every screen that shows an exercise.
fn handle_exercise_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let solved = app.exercise.as_ref().is_some_and(Exercise::is_solved);

    if key.code == KeyCode::Enter && solved {
        app.confirm();
        return;
    }

    match app.exercise.as_mut() {
        None => {}
        Some(Exercise::Study(_)) => match key.code {
            KeyCode::Enter => app.confirm(),
            KeyCode::Char('p') => app.play_current(),
            KeyCode::Char('r') => app.retry_image(),
            KeyCode::Char('v') => app.view_image(),
            _ => {}
        },
        Some(Exercise::Scramble(scramble)) => match key.code {
            KeyCode::Left | KeyCode::Char('h') => scramble.move_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => scramble.move_cursor(1),
            KeyCode::Backspace => scramble.unpick(),
            KeyCode::Char('r') => scramble.reset(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if scramble.ready_to_check() {
                    app.scramble_check();
                } else {
                    scramble.pick();
                }
            }
            _ => {}
        },
        Some(Exercise::Blanks(blanks)) => match key.code {
            KeyCode::Enter => {
                blanks.check();
            }
            KeyCode::Up => blanks.focus_prev(),
            KeyCode::Down => blanks.focus_next(),
            _ => {
                blanks.handle_key(key);
            }
        },
        Some(Exercise::Writing(writing)) => match key.code {
            KeyCode::Enter => app.submit_writing(),
            KeyCode::Char('p') if ctrl => app.play_current(),
            KeyCode::Char('t') if ctrl => writing.reveal_hint(),
            _ => {
                writing.handle_key(key);
            }
        },
        Some(Exercise::Quiz(quiz)) => match key.code {
            KeyCode::Up | KeyCode::Char('k') => quiz.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => quiz.move_cursor(1),
            KeyCode::Enter => app.quiz_pick(None),
            KeyCode::Char('p') => app.play_current(),
            KeyCode::Char(ch @ '1'..='9') => {
                app.quiz_pick(Some(ch as usize - '1' as usize));
            }
            _ => {}
        },
    }
}

// --- Rendering ---

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let hints = footer_hints(app);
    let footer = pack_hint_lines(&hints, area.width as usize);
    let layout = AppLayout::new(area, footer.len() as u16);

    render_header(frame, app, layout.header);

    match app.screen() {
        AppScreen::LessonList => render_lesson_list(frame, app, layout.body),
        AppScreen::SentenceBoard => render_board(frame, app, layout.body),
        AppScreen::SentenceMission => render_mission(frame, app, layout.body),
        AppScreen::WordDrill => render_drill(frame, app, layout.body),
        AppScreen::WordMastered => render_mastered(frame, app, layout.body),
    }

    let feedback = app
        .notice
        .as_ref()
        .or_else(|| app.exercise.as_ref().and_then(Exercise::feedback));
    frame.render_widget(
        Paragraph::new(feedback_line(feedback, app.theme)),
        layout.feedback,
    );

    let footer_lines: Vec<Line> = footer
        .into_iter()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(colors.muted()))))
        .collect();
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;

    let title = match app.selector.lesson() {
        Some(lesson) => format!(" {} · {} ", lesson.date, lesson.title),
        None => String::new(),
    };
    let mut spans = vec![
        Span::styled(
            " wordkite ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            title,
            Style::default().fg(colors.header_fg()).bg(colors.header_bg()),
        ),
    ];
    if !app.is_online() {
        spans.push(Span::styled(
            " offline ",
            Style::default().fg(colors.warning()).bg(colors.header_bg()),
        ));
    }

    let header = Paragraph::new(vec![Line::from(""), Line::from(spans)])
        .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

fn render_lesson_list(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let list_area = centered_rect(60, 90, area);
    frame.render_widget(
        LessonList::new(app.catalog.lessons(), app.lesson_selected, app.theme),
        list_area,
    );
}

fn render_board(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let (Some(lesson), Some(progress)) = (app.selector.lesson(), app.selector.sentences()) else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let bar = ProgressBar::new(
        "Missions",
        format!("{} / {}", progress.completed().len(), progress.total()),
        progress.ratio(),
        app.theme,
    );
    frame.render_widget(bar, layout[0]);
    frame.render_widget(
        SentenceBoard::new(lesson, progress, app.board_selected, app.theme),
        layout[1],
    );
}

fn render_mission(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let (Some(progress), Some(exercise)) = (app.selector.sentences(), app.exercise.as_ref()) else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    frame.render_widget(
        StepTracker::new(progress.current_step(), app.theme),
        layout[0],
    );
    let title = match progress.active_item() {
        Some(id) => format!("Mission {id}"),
        None => String::new(),
    };
    frame.render_widget(
        ExerciseView::new(exercise, title, app.theme)
            .ticks(app.ticks)
            .audio_loading(app.audio_loading()),
        layout[1],
    );
}

fn render_drill(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let (Some(progress), Some(exercise)) = (app.selector.words(), app.exercise.as_ref()) else {
        return;
    };
    let WordState::Phase { phase, index } = progress.state() else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let bar = ProgressBar::new(
        &format!("Step {} of 3 · {}", phase.index() + 1, phase.title()),
        format!("{} / {}", index + 1, progress.total()),
        progress.ratio(),
        app.theme,
    );
    frame.render_widget(bar, layout[0]);
    frame.render_widget(
        ExerciseView::new(exercise, phase.title().to_string(), app.theme)
            .ticks(app.ticks)
            .audio_loading(app.audio_loading()),
        layout[1],
    );
}

fn render_mastered(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let count = app.selector.words().map_or(0, |progress| progress.total());
    frame.render_widget(
        Celebration::word_mastered(count, app.theme),
        centered_rect(50, 60, area),
    );
}

fn footer_hints(app: &App) -> Vec<&'static str> {
    match app.screen() {
        AppScreen::LessonList => vec![
            "[Enter/1-9] Open lesson",
            "[j/k] Move",
            "[t] Theme",
            "[q] Quit",
        ],
        AppScreen::SentenceBoard => vec![
            "[Enter] Start mission",
            "[arrows] Move",
            "[Esc] Lessons",
        ],
        AppScreen::WordMastered => vec!["[Enter] Back to lessons"],
        AppScreen::SentenceMission | AppScreen::WordDrill => {
            let back = if app.screen() == AppScreen::SentenceMission {
                "[Esc] Missions"
            } else {
                "[Esc] Lessons"
            };
            let mut hints = exercise_hints(app.exercise.as_ref());
            hints.push(back);
            hints
        }
    }
}

fn exercise_hints(exercise: Option<&Exercise>) -> Vec<&'static str> {
    let Some(exercise) = exercise else {
        return Vec::new();
    };
    if exercise.is_solved() {
        return vec!["[Enter] Next"];
    }
    match exercise {
        Exercise::Study(_) => vec!["[Enter] Next", "[p] Listen", "[r] Retry picture", "[v] View picture"],
        Exercise::Scramble(_) => vec![
            "[Enter/Space] Place word",
            "[←/→] Choose",
            "[Backspace] Undo",
            "[r] Start over",
        ],
        Exercise::Blanks(_) => vec!["[Enter] Check", "[Tab/↑/↓] Next blank"],
        Exercise::Writing(writing) => match writing.mode {
            WritingMode::Recall => vec!["[Enter] Check", "[Ctrl-p] Listen"],
            WritingMode::Dictation => vec!["[Enter] Check", "[Ctrl-p] Listen", "[Ctrl-t] Hint"],
        },
        Exercise::Quiz(_) => vec!["[Enter/1-4] Answer", "[j/k] Move", "[p] Listen"],
    }
}
