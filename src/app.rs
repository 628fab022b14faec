use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::rngs::SmallRng;

use crate::ai::audio::{self, Pcm};
use crate::ai::cache::MediaCache;
use crate::ai::{AiOutcome, AiRequest, AiResponse, AiWorker, GeneratedImage, Ticket};
use crate::config::{Config, WritingCheck};
use crate::content::{Catalog, Lesson, LessonKind, StudyItem};
use crate::engine::{
    AdvanceOutcome, LessonSelector, SentencePhase, SentenceStep, StepOutcome, TransitionError,
    WordPhase,
};
use crate::exercise::{
    Blanks, Exercise, Feedback, Quiz, QuizDirection, Scramble, StudyCard, Writing, WritingMode,
};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    LessonList,
    SentenceBoard,
    SentenceMission,
    WordDrill,
    WordMastered,
}

/// Which engine state the mounted exercise was built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExerciseKey {
    Sentence { item_id: u32, step: SentenceStep },
    Word { phase: WordPhase, index: usize },
}

pub struct App {
    pub catalog: Catalog,
    pub selector: LessonSelector,
    pub exercise: Option<Exercise>,
    pub theme: &'static Theme,
    /// Settings for this session, command-line overrides included.
    pub config: Config,
    /// Settings as they are on disk; theme changes are written from here.
    saved_config: Config,
    config_path: PathBuf,
    pub lesson_selected: usize,
    pub board_selected: usize,
    /// Status line shown under the screen, e.g. sound problems.
    pub notice: Option<Feedback>,
    pub should_quit: bool,
    pub ticks: u64,
    rng: SmallRng,
    worker: AiWorker,
    cache: Option<MediaCache>,
    mounted: Option<ExerciseKey>,
    /// Sentence text behind each in-flight image/audio request, so late
    /// results still land in the cache.
    requests: HashMap<Ticket, String>,
    /// Speech that should play as soon as it arrives.
    pending_audio: Option<Ticket>,
}

impl App {
    pub fn new(
        config: Config,
        catalog: Catalog,
        worker: AiWorker,
        cache: Option<MediaCache>,
        rng: SmallRng,
    ) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        Self {
            catalog,
            selector: LessonSelector::new(),
            exercise: None,
            theme,
            saved_config: config.clone(),
            config_path: Config::config_path(),
            config,
            lesson_selected: 0,
            board_selected: 0,
            notice: None,
            should_quit: false,
            ticks: 0,
            rng,
            worker,
            cache,
            mounted: None,
            requests: HashMap::new(),
            pending_audio: None,
        }
    }

    /// Persist theme changes to `saved` at `path` instead of the session
    /// config, so command-line overrides never reach the file.
    pub fn with_saved_config(mut self, saved: Config, path: PathBuf) -> Self {
        self.saved_config = saved;
        self.config_path = path;
        self
    }

    pub fn screen(&self) -> AppScreen {
        if let Some(progress) = self.selector.sentences() {
            return match progress.phase() {
                SentencePhase::Browsing => AppScreen::SentenceBoard,
                SentencePhase::InStep { .. } => AppScreen::SentenceMission,
            };
        }
        if let Some(progress) = self.selector.words() {
            return if progress.is_finished() {
                AppScreen::WordMastered
            } else {
                AppScreen::WordDrill
            };
        }
        AppScreen::LessonList
    }

    pub fn is_online(&self) -> bool {
        self.worker.is_online()
    }

    pub fn audio_loading(&self) -> bool {
        self.pending_audio.is_some()
    }

    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    // --- Lesson list ---

    pub fn lesson_next(&mut self) {
        if !self.catalog.is_empty() {
            self.lesson_selected = (self.lesson_selected + 1) % self.catalog.len();
        }
    }

    pub fn lesson_prev(&mut self) {
        if !self.catalog.is_empty() {
            self.lesson_selected =
                (self.lesson_selected + self.catalog.len() - 1) % self.catalog.len();
        }
    }

    pub fn open_selected_lesson(&mut self) {
        if let Some(lesson) = self.catalog.lessons().get(self.lesson_selected) {
            let id = lesson.id.clone();
            self.open_lesson(&id);
        }
    }

    /// Enter a lesson with fresh progress. Returns false for unknown ids.
    pub fn open_lesson(&mut self, id: &str) -> bool {
        let Some(position) = self.catalog.position(id) else {
            log::warn!("no lesson with id {id:?}");
            return false;
        };
        let lesson = &self.catalog.lessons()[position];
        log::info!(
            "opening lesson {} ({} {})",
            lesson.id,
            lesson.len(),
            lesson.kind.noun()
        );
        self.selector.select_lesson(lesson);
        self.mounted = None;
        self.exercise = None;
        self.lesson_selected = position;
        self.board_selected = 0;
        self.notice = None;
        self.sync_exercise();
        true
    }

    pub fn go_home(&mut self) {
        if let Some(lesson) = self.selector.lesson() {
            log::info!("leaving lesson {}", lesson.id);
        }
        self.selector.go_home();
        self.notice = None;
        self.sync_exercise();
    }

    pub fn cycle_theme(&mut self) {
        let themes = Theme::available_themes();
        let next = match themes.iter().position(|t| *t == self.config.theme) {
            Some(idx) => themes.get((idx + 1) % themes.len()),
            None => themes.first(),
        };
        let Some(name) = next.cloned() else {
            return;
        };
        if let Some(theme) = Theme::load(&name) {
            self.theme = Box::leak(Box::new(theme));
            self.config.theme = name.clone();
            self.saved_config.theme = name;
            if let Err(e) = self.saved_config.save_to(&self.config_path) {
                log::warn!("could not save config: {e}");
            }
        }
    }

    // --- Sentence board ---

    pub fn board_move(&mut self, delta: isize) {
        let Some(lesson) = self.selector.lesson() else {
            return;
        };
        let len = lesson.len() as isize;
        if len > 0 {
            self.board_selected = (self.board_selected as isize + delta).rem_euclid(len) as usize;
        }
    }

    pub fn start_selected_sentence(&mut self) {
        let Some(item_id) = self
            .selector
            .lesson()
            .and_then(|lesson| lesson.items.get(self.board_selected))
            .map(|item| item.id)
        else {
            return;
        };
        let result = self
            .selector
            .sentences_mut()
            .and_then(|progress| progress.select_item(item_id));
        match result {
            Ok(()) => log::info!("starting sentence {item_id}"),
            Err(e) => log_rejected(&e),
        }
        self.sync_exercise();
    }

    /// Abandon the open sentence and return to the board.
    pub fn leave_sentence(&mut self) {
        let result = self
            .selector
            .sentences_mut()
            .and_then(|progress| progress.leave_item());
        if let Err(e) = result {
            log_rejected(&e);
        }
        self.sync_exercise();
    }

    // --- Progression ---

    /// Move the engine on once the exercise reports solved.
    pub fn confirm(&mut self) {
        if !self.exercise.as_ref().is_some_and(Exercise::is_solved) {
            return;
        }
        match self.lesson_kind() {
            Some(LessonKind::Sentences) => {
                match self.selector.sentences_mut().and_then(|p| p.advance_step()) {
                    Ok(StepOutcome::Advanced(step)) => log::debug!("sentence step -> {step:?}"),
                    Ok(StepOutcome::ItemCompleted {
                        item_id,
                        lesson_complete,
                    }) => {
                        log::info!("sentence {item_id} complete");
                        if lesson_complete {
                            log::info!("all sentences complete");
                        }
                    }
                    Err(e) => log_rejected(&e),
                }
            }
            Some(LessonKind::Words) => match self.selector.words_mut().and_then(|p| p.advance()) {
                Ok(AdvanceOutcome::NextItem { .. }) => {}
                Ok(AdvanceOutcome::NextPhase { phase }) => {
                    log::info!("word drill moves to {}", phase.title());
                }
                Ok(AdvanceOutcome::Finished) => log::info!("word lesson mastered"),
                Err(e) => log_rejected(&e),
            },
            None => {}
        }
        self.sync_exercise();
    }

    fn lesson_kind(&self) -> Option<LessonKind> {
        self.selector.lesson().map(|lesson| lesson.kind)
    }

    fn current_key(&self) -> Option<ExerciseKey> {
        if let Some(progress) = self.selector.sentences() {
            return match progress.phase() {
                SentencePhase::InStep { item_id, step } => {
                    Some(ExerciseKey::Sentence { item_id, step })
                }
                SentencePhase::Browsing => None,
            };
        }
        let (phase, index) = self.selector.words()?.exercise_key()?;
        Some(ExerciseKey::Word { phase, index })
    }

    /// Mount a fresh exercise whenever the engine state has moved.
    fn sync_exercise(&mut self) {
        let key = self.current_key();
        if key == self.mounted {
            return;
        }
        self.mounted = key;
        self.pending_audio = None;
        self.exercise = None;

        let Some(key) = key else {
            return;
        };
        let Some(lesson) = self.selector.lesson().cloned() else {
            return;
        };
        match key {
            ExerciseKey::Sentence { item_id, step } => {
                if let Some(item) = lesson.item(item_id).cloned() {
                    self.mount_sentence_step(item, step);
                }
            }
            ExerciseKey::Word { phase, index } => {
                if let Some(item) = lesson.items.get(index).cloned() {
                    self.mount_word_phase(&lesson, item, phase);
                }
            }
        }
    }

    fn mount_sentence_step(&mut self, item: StudyItem, step: SentenceStep) {
        let exercise = match step {
            SentenceStep::Presentation => {
                let mut card = StudyCard::new(item);
                self.load_image(&mut card);
                Exercise::Study(card)
            }
            SentenceStep::Reorder => Exercise::Scramble(Scramble::new(&item, &mut self.rng)),
            SentenceStep::FillBlank => Exercise::Blanks(Blanks::new(&item, &mut self.rng)),
            SentenceStep::FreeRecall => {
                if self.config.auto_play_audio {
                    self.speak(&item.english);
                }
                Exercise::Writing(Writing::new(
                    item,
                    WritingMode::Recall,
                    self.config.writing_check,
                ))
            }
        };
        self.exercise = Some(exercise);
    }

    fn mount_word_phase(&mut self, lesson: &Lesson, item: StudyItem, phase: WordPhase) {
        let english = item.english.clone();
        let (exercise, auto_play) = match phase {
            WordPhase::Meaning => (
                Exercise::Quiz(Quiz::new(
                    &item,
                    &lesson.items,
                    QuizDirection::EnglishToKorean,
                    &mut self.rng,
                )),
                true,
            ),
            WordPhase::Spelling => (
                Exercise::Quiz(Quiz::new(
                    &item,
                    &lesson.items,
                    QuizDirection::KoreanToEnglish,
                    &mut self.rng,
                )),
                false,
            ),
            WordPhase::Dictation => (
                Exercise::Writing(Writing::new(
                    item,
                    WritingMode::Dictation,
                    self.config.writing_check,
                )),
                true,
            ),
        };
        self.exercise = Some(exercise);
        if auto_play && self.config.auto_play_audio {
            self.speak(&english);
        }
    }

    // --- Exercise actions ---

    pub fn scramble_check(&mut self) {
        if let Some(Exercise::Scramble(scramble)) = self.exercise.as_mut() {
            scramble.check(&mut self.rng);
        }
    }

    /// Check the writing answer: locally when typed, through the judge when
    /// handwritten.
    pub fn submit_writing(&mut self) {
        let Some(Exercise::Writing(writing)) = self.exercise.as_mut() else {
            return;
        };
        match writing.check {
            WritingCheck::Typed => {
                writing.submit_typed();
            }
            WritingCheck::Handwriting => {
                let Some(image_base64) = writing.handwriting_payload() else {
                    return;
                };
                let target = writing.item.english.clone();
                let ticket = self.worker.submit(AiRequest::Judge { image_base64, target });
                writing.judging(ticket);
            }
        }
    }

    pub fn quiz_pick(&mut self, index: Option<usize>) {
        let Some(Exercise::Quiz(quiz)) = self.exercise.as_mut() else {
            return;
        };
        let solved = match index {
            Some(index) => quiz.pick(index),
            None => quiz.pick_current(),
        };
        if solved {
            let english = quiz.item.english.clone();
            self.speak(&english);
        }
    }

    /// English text of whatever is on screen, for the play-sound key.
    pub fn current_english(&self) -> Option<&str> {
        match self.exercise.as_ref()? {
            Exercise::Study(card) => Some(&card.item.english),
            Exercise::Quiz(quiz) => Some(&quiz.item.english),
            Exercise::Writing(writing) => Some(&writing.item.english),
            Exercise::Scramble(_) | Exercise::Blanks(_) => None,
        }
    }

    pub fn play_current(&mut self) {
        if let Some(english) = self.current_english().map(str::to_string) {
            self.speak(&english);
        }
    }

    pub fn retry_image(&mut self) {
        if !matches!(&self.exercise, Some(Exercise::Study(card)) if card.can_retry()) {
            return;
        }
        if let Some(Exercise::Study(mut card)) = self.exercise.take() {
            self.load_image(&mut card);
            self.exercise = Some(Exercise::Study(card));
        }
    }

    pub fn view_image(&mut self) {
        let Some(Exercise::Study(card)) = self.exercise.as_ref() else {
            return;
        };
        let Some(path) = card.image.path().cloned() else {
            return;
        };
        match self.config.image_viewer.clone() {
            Some(viewer) => self.launch(&viewer, &path),
            None => {
                self.notice = Some(Feedback::info(format!("Picture saved at {}", path.display())))
            }
        }
    }

    // --- Media ---

    fn load_image(&mut self, card: &mut StudyCard) {
        let sentence = card.item.english.clone();
        if let Some(path) = self.cached(|cache| cache.cached_image(&sentence)) {
            card.image_cached(path);
            return;
        }
        if !self.worker.is_online() {
            return;
        }
        let ticket = self.worker.submit(AiRequest::Image {
            sentence: sentence.clone(),
        });
        self.requests.insert(ticket, sentence);
        card.image_loading(ticket);
    }

    /// Play `sentence`, fetching speech first when it is not cached. A
    /// request already in flight for the same sentence is not repeated.
    fn speak(&mut self, sentence: &str) {
        if self.audio_pending_for(sentence) {
            log::debug!("speech for {sentence:?} already on its way");
            return;
        }
        if let Some(path) = self.cached(|cache| cache.cached_audio(sentence)) {
            self.play(&path);
            return;
        }
        if !self.worker.is_online() {
            log::debug!("no speech for {sentence:?}: AI helper offline");
            return;
        }
        let ticket = self.worker.submit(AiRequest::Audio {
            sentence: sentence.to_string(),
        });
        self.requests.insert(ticket, sentence.to_string());
        self.pending_audio = Some(ticket);
    }

    fn audio_pending_for(&self, sentence: &str) -> bool {
        self.pending_audio
            .and_then(|ticket| self.requests.get(&ticket))
            .is_some_and(|pending| pending == sentence)
    }

    fn cached<F>(&self, lookup: F) -> Option<PathBuf>
    where
        F: FnOnce(&MediaCache) -> Option<PathBuf>,
    {
        if !self.config.media_cache {
            return None;
        }
        self.cache.as_ref().and_then(lookup)
    }

    fn play(&mut self, path: &Path) {
        let player = self.config.audio_player.clone();
        if player.trim().is_empty() {
            self.notice = Some(Feedback::warning("No audio player configured."));
            return;
        }
        self.launch(&player, path);
    }

    fn launch(&mut self, command: &str, path: &Path) {
        if let Err(e) = audio::open_with(command, path) {
            log::error!("{command} {}: {e}", path.display());
            self.notice = Some(Feedback::warning(format!("Could not run {command}.")));
        }
    }

    // --- AI results ---

    pub fn handle_ai(&mut self, response: AiResponse) {
        let AiResponse { ticket, outcome } = response;
        let sentence = self.requests.remove(&ticket);
        match outcome {
            AiOutcome::Image(image) => {
                let path = match (&sentence, image) {
                    (Some(sentence), Some(image)) => self.store_image(sentence, &image),
                    _ => None,
                };
                if let Some(Exercise::Study(card)) = self.exercise.as_mut() {
                    card.accept_image(ticket, path);
                }
            }
            AiOutcome::Audio(data) => {
                let path = match (&sentence, data) {
                    (Some(sentence), Some(data)) => self.store_audio(sentence, &data),
                    _ => None,
                };
                self.finish_audio(ticket, path);
            }
            AiOutcome::Verdict(verdict) => {
                if let Some(Exercise::Writing(writing)) = self.exercise.as_mut() {
                    if !writing.accept_verdict(ticket, verdict) {
                        log::debug!("dropping stale verdict {ticket:?}");
                    }
                }
            }
            AiOutcome::TimedOut => match self.exercise.as_mut() {
                Some(Exercise::Study(card)) => {
                    card.accept_image(ticket, None);
                }
                Some(Exercise::Writing(writing)) => {
                    writing.judge_timed_out(ticket);
                }
                _ => {}
            },
        }
        if self.pending_audio == Some(ticket) {
            self.finish_audio(ticket, None);
        }
    }

    fn finish_audio(&mut self, ticket: Ticket, path: Option<PathBuf>) {
        if self.pending_audio != Some(ticket) {
            return;
        }
        self.pending_audio = None;
        match path {
            Some(path) => self.play(&path),
            None => self.notice = Some(Feedback::warning("Sound is not available right now.")),
        }
    }

    fn store_image(&self, sentence: &str, image: &GeneratedImage) -> Option<PathBuf> {
        let path = self.cache.as_ref()?.store_image(sentence, image);
        if path.is_none() {
            log::warn!("could not save illustration for {sentence:?}");
        }
        path
    }

    fn store_audio(&self, sentence: &str, data: &str) -> Option<PathBuf> {
        let pcm = Pcm::from_base64(data)
            .inspect_err(|e| log::error!("speech for {sentence:?}: {e}"))
            .ok()?;
        self.cache.as_ref()?.store_audio(sentence, &pcm)
    }
}

fn log_rejected(error: &TransitionError) {
    log::warn!("ignored transition: {error}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiCapability, OfflineCapability, Timeouts};
    use crate::event::AppEvent;
    use crate::validate::Verdict;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::Duration;

    fn timeouts() -> Timeouts {
        let limit = Duration::from_secs(5);
        Timeouts {
            image: limit,
            audio: limit,
            judge: limit,
        }
    }

    fn offline_app() -> App {
        let (tx, _rx) = mpsc::channel();
        let worker = AiWorker::new(Arc::new(OfflineCapability), tx, timeouts());
        let mut config = Config::default();
        config.audio_player = String::new();
        App::new(
            config,
            Catalog::builtin().unwrap(),
            worker,
            None,
            SmallRng::seed_from_u64(7),
        )
    }

    struct Judge;

    impl AiCapability for Judge {
        fn generate_image(&self, _sentence: &str) -> Option<GeneratedImage> {
            None
        }

        fn generate_audio(&self, _sentence: &str) -> Option<String> {
            None
        }

        fn judge_handwriting(&self, _image_base64: &str, target: &str) -> Verdict {
            Verdict::pass(format!("You wrote {target}"))
        }
    }

    /// Counts speech requests; each one takes a while to answer.
    #[derive(Default)]
    struct SlowSpeech {
        audio_calls: AtomicUsize,
    }

    impl AiCapability for SlowSpeech {
        fn generate_image(&self, _sentence: &str) -> Option<GeneratedImage> {
            None
        }

        fn generate_audio(&self, _sentence: &str) -> Option<String> {
            self.audio_calls.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(300));
            None
        }

        fn judge_handwriting(&self, _image_base64: &str, _target: &str) -> Verdict {
            Verdict::fail("")
        }
    }

    fn wait_for_audio(rx: &mpsc::Receiver<AppEvent>) -> AiResponse {
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::Ai(response) if matches!(response.outcome, AiOutcome::Audio(_)) => {
                    return response;
                }
                _ => continue,
            }
        }
    }

    fn online_app() -> (App, mpsc::Receiver<AppEvent>) {
        online_app_with(Arc::new(Judge))
    }

    fn online_app_with(capability: Arc<dyn AiCapability>) -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let worker = AiWorker::new(capability, tx, timeouts());
        let mut config = Config::default();
        config.audio_player = String::new();
        config.auto_play_audio = false;
        config.media_cache = false;
        let app = App::new(
            config,
            Catalog::builtin().unwrap(),
            worker,
            None,
            SmallRng::seed_from_u64(7),
        );
        (app, rx)
    }

    fn solve_current(app: &mut App) {
        match app.exercise.as_mut().unwrap() {
            Exercise::Study(_) => {}
            Exercise::Scramble(scramble) => {
                let target: Vec<String> = match app.mounted {
                    Some(ExerciseKey::Sentence { item_id, .. }) => app
                        .selector
                        .lesson()
                        .unwrap()
                        .item(item_id)
                        .unwrap()
                        .tokens()
                        .iter()
                        .map(|t| t.to_string())
                        .collect(),
                    _ => unreachable!(),
                };
                for token in &target {
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
                    for ch in answer.chars() {
                        blanks.handle_key(crossterm::event::KeyEvent::from(
                            crossterm::event::KeyCode::Char(ch),
                        ));
                    }
                    blanks.focus_next();
                }
                blanks.check();
            }
            Exercise::Writing(writing) => {
                let english = writing.item.english.clone();
                for ch in english.chars() {
                    writing.handle_key(crossterm::event::KeyEvent::from(
                        crossterm::event::KeyCode::Char(ch),
                    ));
                }
                app.submit_writing();
            }
            Exercise::Quiz(quiz) => {
                let right = quiz.options().iter().position(|o| quiz.is_answer(o)).unwrap();
                app.quiz_pick(Some(right));
            }
        }
        assert!(app.exercise.as_ref().unwrap().is_solved());
    }

    #[test]
    fn screens_follow_engine_state() {
        let mut app = offline_app();
        assert_eq!(app.screen(), AppScreen::LessonList);

        assert!(app.open_lesson("feb-10"));
        assert_eq!(app.screen(), AppScreen::SentenceBoard);
        assert!(app.exercise.is_none());

        app.start_selected_sentence();
        assert_eq!(app.screen(), AppScreen::SentenceMission);
        assert!(matches!(app.exercise, Some(Exercise::Study(_))));

        app.leave_sentence();
        assert_eq!(app.screen(), AppScreen::SentenceBoard);
        assert!(app.exercise.is_none());

        app.go_home();
        assert_eq!(app.screen(), AppScreen::LessonList);
        assert!(!app.open_lesson("nope"));
    }

    #[test]
    fn confirm_needs_a_solved_exercise() {
        let mut app = offline_app();
        app.open_lesson("feb-10");
        app.start_selected_sentence();
        app.confirm();
        assert!(matches!(app.exercise, Some(Exercise::Scramble(_))));

        app.confirm();
        assert!(matches!(app.exercise, Some(Exercise::Scramble(_))));
        assert_eq!(
            app.selector.sentences().unwrap().current_step(),
            SentenceStep::Reorder
        );
    }

    #[test]
    fn full_sentence_walkthrough_marks_it_complete() {
        let mut app = offline_app();
        app.open_lesson("feb-10");
        app.start_selected_sentence();
        let first = app.selector.lesson().unwrap().items[0].id;
        for _ in 0..4 {
            solve_current(&mut app);
            app.confirm();
        }
        assert_eq!(app.screen(), AppScreen::SentenceBoard);
        assert!(app.selector.sentences().unwrap().is_completed(first));
    }

    #[test]
    fn word_lesson_runs_to_mastered() {
        let mut app = offline_app();
        app.open_lesson("feb-12");
        let n = app.selector.lesson().unwrap().len();
        for _ in 0..3 * n {
            assert_eq!(app.screen(), AppScreen::WordDrill);
            solve_current(&mut app);
            app.confirm();
        }
        assert_eq!(app.screen(), AppScreen::WordMastered);
        assert_eq!(app.selector.words().unwrap().completed().len(), n);
    }

    #[test]
    fn handwriting_verdict_routes_by_ticket() {
        let (mut app, rx) = online_app();
        app.config.writing_check = WritingCheck::Handwriting;
        app.open_lesson("feb-10");
        app.start_selected_sentence();
        for _ in 0..3 {
            solve_current(&mut app);
            app.confirm();
        }
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("page.png");
        std::fs::write(&photo, b"\x89PNG\r\n\x1a\n").unwrap();
        let Some(Exercise::Writing(writing)) = app.exercise.as_mut() else {
            panic!("expected the writing step");
        };
        for ch in photo.display().to_string().chars() {
            writing.handle_key(crossterm::event::KeyEvent::from(
                crossterm::event::KeyCode::Char(ch),
            ));
        }
        app.submit_writing();

        let response = loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                AppEvent::Ai(response) if matches!(response.outcome, AiOutcome::Verdict(_)) => {
                    break response;
                }
                _ => continue,
            }
        };
        app.handle_ai(response);
        assert!(app.exercise.as_ref().unwrap().is_solved());
    }

    #[test]
    fn stale_ai_results_do_not_touch_the_new_exercise() {
        let (mut app, _rx) = online_app();
        app.open_lesson("feb-10");
        app.start_selected_sentence();
        let Some(Exercise::Study(card)) = app.exercise.as_ref() else {
            panic!("expected the study card");
        };
        let ticket = card.image.ticket().unwrap();

        solve_current(&mut app);
        app.confirm();
        app.handle_ai(AiResponse {
            ticket,
            outcome: AiOutcome::Image(None),
        });
        app.handle_ai(AiResponse {
            ticket,
            outcome: AiOutcome::Verdict(Verdict::pass("")),
        });
        assert!(matches!(app.exercise, Some(Exercise::Scramble(_))));
        assert!(!app.exercise.as_ref().unwrap().is_solved());
    }

    #[test]
    fn repeated_listen_presses_share_one_request() {
        let speech = Arc::new(SlowSpeech::default());
        let (mut app, rx) = online_app_with(speech.clone());
        app.open_lesson("feb-10");
        app.start_selected_sentence();
        for _ in 0..5 {
            app.play_current();
        }
        assert!(app.audio_loading());

        let response = wait_for_audio(&rx);
        app.handle_ai(response);
        assert!(!app.audio_loading());
        assert_eq!(speech.audio_calls.load(Ordering::SeqCst), 1);

        app.play_current();
        wait_for_audio(&rx);
        assert_eq!(speech.audio_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn writing_step_reads_the_sentence_aloud() {
        let speech = Arc::new(SlowSpeech::default());
        let (mut app, rx) = online_app_with(speech.clone());
        app.config.auto_play_audio = true;
        app.open_lesson("feb-10");
        app.start_selected_sentence();
        for _ in 0..3 {
            solve_current(&mut app);
            app.confirm();
        }
        assert!(matches!(
            &app.exercise,
            Some(Exercise::Writing(writing)) if writing.mode == WritingMode::Recall
        ));
        assert!(app.audio_loading());
        let english = app.selector.lesson().unwrap().items[0].english.clone();
        assert_eq!(app.current_english(), Some(english.as_str()));

        wait_for_audio(&rx);
        assert_eq!(speech.audio_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn theme_change_keeps_session_overrides_out_of_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let saved = Config::default();
        let mut app = offline_app().with_saved_config(saved, path.clone());
        app.config.writing_check = WritingCheck::Handwriting;

        let before = app.config.theme.clone();
        app.cycle_theme();
        assert_ne!(app.config.theme, before);

        let written: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.theme, app.config.theme);
        assert_eq!(written.writing_check, WritingCheck::Typed);
    }
}
