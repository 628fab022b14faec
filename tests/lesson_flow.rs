use std::collections::BTreeSet;
use std::fs;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use wordkite::ai::{AiWorker, OfflineCapability, Timeouts};
use wordkite::app::{App, AppScreen};
use wordkite::config::Config;
use wordkite::content::{Catalog, LessonKind};
use wordkite::engine::{
    AdvanceOutcome, LessonSelector, SentencePhase, SentenceStep, StepOutcome, WordPhase,
    WordState,
};
use wordkite::exercise::{Exercise, Scramble};
use wordkite::validate::{RecallVerdict, check_recall, sequence_matches};

fn app(seed: u64) -> App {
    let (tx, _rx) = mpsc::channel();
    let limit = Duration::from_secs(5);
    let timeouts = Timeouts {
        image: limit,
        audio: limit,
        judge: limit,
    };
    let worker = AiWorker::new(Arc::new(OfflineCapability), tx, timeouts);
    let mut config = Config::default();
    config.audio_player = String::new();
    config.media_cache = false;
    App::new(
        config,
        Catalog::builtin().unwrap(),
        worker,
        None,
        SmallRng::seed_from_u64(seed),
    )
}

fn type_text(text: &str, mut send: impl FnMut(KeyEvent)) {
    for ch in text.chars() {
        send(KeyEvent::from(KeyCode::Char(ch)));
    }
}

/// Drive whatever exercise is mounted to a solved state through its public API.
fn solve(app: &mut App) {
    let english = target(app);
    match app.exercise.as_mut().unwrap() {
        Exercise::Study(_) => {}
        Exercise::Scramble(scramble) => {
            for token in english.split(' ') {
                scramble.cursor = scramble.bank().iter().position(|t| t == token).unwrap();
                scramble.pick();
            }
            app.scramble_check();
        }
        Exercise::Blanks(blanks) => {
            let answers: Vec<String> = blanks
                .blanks()
                .iter()
                .map(|&p| blanks.tokens()[p].clone())
                .collect();
            for answer in answers {
                type_text(&answer, |key| {
                    blanks.handle_key(key);
                });
                blanks.focus_next();
            }
            blanks.check();
        }
        Exercise::Writing(writing) => {
            type_text(&english, |key| {
                writing.handle_key(key);
            });
            app.submit_writing();
        }
        Exercise::Quiz(quiz) => {
            let right = quiz.options().iter().position(|o| quiz.is_answer(o)).unwrap();
            app.quiz_pick(Some(right));
        }
    }
    assert!(app.exercise.as_ref().unwrap().is_solved());
}

/// English text the mounted exercise is built around.
fn target(app: &App) -> String {
    let english = match app.exercise.as_ref().unwrap() {
        Exercise::Study(card) => &card.item.english,
        Exercise::Writing(writing) => &writing.item.english,
        Exercise::Quiz(quiz) => &quiz.item.english,
        Exercise::Scramble(_) | Exercise::Blanks(_) => {
            let id = app.selector.sentences().unwrap().active_item().unwrap();
            &app.selector.lesson().unwrap().item(id).unwrap().english
        }
    };
    english.clone()
}

#[test]
fn builtin_catalog_has_both_lessons() {
    let catalog = Catalog::builtin().unwrap();
    let feb10 = catalog.get("feb-10").unwrap();
    let feb12 = catalog.get("feb-12").unwrap();
    assert_eq!(feb10.kind, LessonKind::Sentences);
    assert_eq!(feb10.len(), 5);
    assert_eq!(feb12.kind, LessonKind::Words);
    assert_eq!(feb12.len(), 11);
}

#[test]
fn every_builtin_sentence_is_solvable() {
    let catalog = Catalog::builtin().unwrap();
    for lesson in catalog.lessons() {
        for item in &lesson.items {
            assert!(sequence_matches(&item.tokens(), &item.english));
            assert_eq!(check_recall(&item.english, &item.english), RecallVerdict::Pass);
            assert_eq!(
                check_recall(&item.english.to_uppercase(), &item.english),
                RecallVerdict::Pass
            );
        }
    }
}

#[test]
fn magic_e_lesson_completes_only_at_the_very_end() {
    let catalog = Catalog::builtin().unwrap();
    let lesson = catalog.get("feb-12").unwrap();
    let mut selector = LessonSelector::new();
    selector.select_lesson(lesson);
    let words = selector.words_mut().unwrap();

    for _ in 0..(3 * lesson.len() - 1) {
        assert!(words.completed().is_empty());
        assert_ne!(words.advance().unwrap(), AdvanceOutcome::Finished);
    }
    assert_eq!(
        words.state(),
        WordState::Phase {
            phase: WordPhase::Dictation,
            index: 10
        }
    );
    assert!(words.completed().is_empty());

    assert_eq!(words.advance().unwrap(), AdvanceOutcome::Finished);
    assert_eq!(words.completed(), &lesson.item_ids());
}

#[test]
fn sentence_lesson_completes_in_any_order() {
    let catalog = Catalog::builtin().unwrap();
    let lesson = catalog.get("feb-10").unwrap();
    let mut selector = LessonSelector::new();
    selector.select_lesson(lesson);
    let sentences = selector.sentences_mut().unwrap();

    let mut ids: Vec<u32> = lesson.items.iter().map(|item| item.id).collect();
    ids.reverse();
    for (done, id) in ids.iter().enumerate() {
        sentences.select_item(*id).unwrap();
        for step in &SentenceStep::ALL[1..] {
            assert_eq!(sentences.advance_step().unwrap(), StepOutcome::Advanced(*step));
        }
        let outcome = sentences.advance_step().unwrap();
        assert_eq!(
            outcome,
            StepOutcome::ItemCompleted {
                item_id: *id,
                lesson_complete: done + 1 == ids.len(),
            }
        );
        assert_eq!(sentences.phase(), SentencePhase::Browsing);
    }
    assert!(sentences.is_lesson_complete());
}

#[test]
fn scramble_never_starts_solved() {
    let catalog = Catalog::builtin().unwrap();
    let lesson = catalog.get("feb-10").unwrap();
    for seed in 0..50 {
        let mut rng = SmallRng::seed_from_u64(seed);
        for item in &lesson.items {
            let scramble = Scramble::new(item, &mut rng);
            assert!(!sequence_matches(scramble.bank(), &item.english));
        }
    }
}

#[test]
fn whole_sentence_lesson_through_the_app() {
    let mut app = app(11);
    assert!(app.open_lesson("feb-10"));
    let total = app.selector.lesson().unwrap().len();

    for position in 0..total {
        app.board_selected = position;
        app.start_selected_sentence();
        for _ in SentenceStep::ALL {
            assert_eq!(app.screen(), AppScreen::SentenceMission);
            solve(&mut app);
            app.confirm();
        }
        assert_eq!(app.screen(), AppScreen::SentenceBoard);
    }

    let progress = app.selector.sentences().unwrap();
    assert!(progress.is_lesson_complete());
    assert_eq!(progress.completed().len(), total);
}

#[test]
fn whole_word_lesson_through_the_app() {
    let mut app = app(5);
    assert!(app.open_lesson("feb-12"));
    let total = app.selector.lesson().unwrap().len();

    for _ in 0..(3 * total) {
        assert_eq!(app.screen(), AppScreen::WordDrill);
        assert!(app.selector.words().unwrap().completed().is_empty());
        solve(&mut app);
        app.confirm();
    }
    assert_eq!(app.screen(), AppScreen::WordMastered);
    assert_eq!(app.selector.words().unwrap().completed().len(), total);

    app.go_home();
    assert_eq!(app.screen(), AppScreen::LessonList);
}

#[test]
fn leaving_a_lesson_discards_its_progress() {
    let mut app = app(1);
    app.open_lesson("feb-10");
    app.start_selected_sentence();
    for _ in SentenceStep::ALL {
        solve(&mut app);
        app.confirm();
    }
    assert_eq!(app.selector.sentences().unwrap().completed().len(), 1);

    app.go_home();
    app.open_lesson("feb-10");
    assert!(app.selector.sentences().unwrap().completed().is_empty());
}

#[test]
fn user_lesson_directory_extends_the_catalog() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("colors.toml"),
        r#"
id = "colors"
date = "3월 2일"
title = "Colors"
kind = "words"

[[items]]
id = 1
english = "red"
korean = "빨강"

[[items]]
id = 2
english = "blue"
korean = "파랑"
"#,
    )
    .unwrap();

    let catalog = Catalog::load(Some(dir.path())).unwrap();
    let ids: BTreeSet<&str> = catalog.lessons().iter().map(|l| l.id.as_str()).collect();
    assert!(ids.contains("feb-10"));
    assert!(ids.contains("feb-12"));
    assert!(ids.contains("colors"));
}
