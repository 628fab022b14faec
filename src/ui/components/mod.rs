pub mod celebration;
pub mod exercise_view;
pub mod lesson_list;
pub mod progress_bar;
pub mod sentence_board;
pub mod step_tracker;
