use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::ai::{AiCapability, GeneratedImage};
use crate::config::Config;
use crate::event::AppEvent;
use crate::validate::Verdict;

pub const JUDGE_FAILED_FEEDBACK: &str = "Something went wrong while checking. Let's try again!";

/// Identifies one request. Exercises remember the tickets they issued and
/// ignore responses carrying any other ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

#[derive(Clone, Debug)]
pub enum AiRequest {
    Image { sentence: String },
    Audio { sentence: String },
    Judge { image_base64: String, target: String },
}

impl AiRequest {
    fn kind(&self) -> &'static str {
        match self {
            AiRequest::Image { .. } => "image",
            AiRequest::Audio { .. } => "audio",
            AiRequest::Judge { .. } => "handwriting",
        }
    }

    /// What the caller sees when the request thread dies without answering.
    fn failed(&self, feedback: &str) -> AiOutcome {
        match self {
            AiRequest::Image { .. } => AiOutcome::Image(None),
            AiRequest::Audio { .. } => AiOutcome::Audio(None),
            AiRequest::Judge { .. } => AiOutcome::Verdict(Verdict::fail(feedback)),
        }
    }

    fn run(self, capability: &dyn AiCapability) -> AiOutcome {
        match self {
            AiRequest::Image { sentence } => AiOutcome::Image(capability.generate_image(&sentence)),
            AiRequest::Audio { sentence } => AiOutcome::Audio(capability.generate_audio(&sentence)),
            AiRequest::Judge { image_base64, target } => {
                AiOutcome::Verdict(capability.judge_handwriting(&image_base64, &target))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AiOutcome {
    Image(Option<GeneratedImage>),
    Audio(Option<String>),
    Verdict(Verdict),
    /// No answer within the caller-side deadline.
    TimedOut,
}

#[derive(Clone, Debug)]
pub struct AiResponse {
    pub ticket: Ticket,
    pub outcome: AiOutcome,
}

#[derive(Clone, Copy, Debug)]
pub struct Timeouts {
    pub image: Duration,
    pub audio: Duration,
    pub judge: Duration,
}

impl Timeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image: Duration::from_secs(config.image_timeout_secs),
            audio: Duration::from_secs(config.audio_timeout_secs),
            judge: Duration::from_secs(config.judge_timeout_secs),
        }
    }

    fn for_request(&self, request: &AiRequest) -> Duration {
        match request {
            AiRequest::Image { .. } => self.image,
            AiRequest::Audio { .. } => self.audio,
            AiRequest::Judge { .. } => self.judge,
        }
    }
}

/// Runs AI requests off the UI thread and posts results into the event loop.
///
/// Each request gets its own thread plus a supervisor that enforces the
/// caller-side deadline; a result arriving after the deadline is dropped.
pub struct AiWorker {
    capability: Arc<dyn AiCapability>,
    events: mpsc::Sender<AppEvent>,
    timeouts: Timeouts,
    next_ticket: u64,
}

impl AiWorker {
    pub fn new(
        capability: Arc<dyn AiCapability>,
        events: mpsc::Sender<AppEvent>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            capability,
            events,
            timeouts,
            next_ticket: 1,
        }
    }

    pub fn is_online(&self) -> bool {
        self.capability.is_online()
    }

    pub fn submit(&mut self, request: AiRequest) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        let limit = self.timeouts.for_request(&request);
        let capability = Arc::clone(&self.capability);
        let events = self.events.clone();
        let kind = request.kind();
        log::debug!("dispatching {kind} request {ticket:?}");

        thread::spawn(move || {
            let fallback = request.failed(JUDGE_FAILED_FEEDBACK);
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let _ = tx.send(request.run(capability.as_ref()));
            });

            let outcome = match rx.recv_timeout(limit) {
                Ok(outcome) => outcome,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("{kind} request {ticket:?} timed out after {limit:?}");
                    AiOutcome::TimedOut
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::error!("{kind} request {ticket:?} died without answering");
                    fallback
                }
            };
            let _ = events.send(AppEvent::Ai(AiResponse { ticket, outcome }));
        });

        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowEcho {
        delay: Duration,
    }

    impl AiCapability for SlowEcho {
        fn generate_image(&self, sentence: &str) -> Option<GeneratedImage> {
            thread::sleep(self.delay);
            Some(GeneratedImage {
                uri: format!("data:image/png;base64,{sentence}"),
            })
        }

        fn generate_audio(&self, _sentence: &str) -> Option<String> {
            thread::sleep(self.delay);
            Some("AAAA".to_string())
        }

        fn judge_handwriting(&self, _image_base64: &str, target: &str) -> Verdict {
            thread::sleep(self.delay);
            Verdict::pass(target)
        }
    }

    fn worker(delay: Duration, limit: Duration) -> (AiWorker, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let timeouts = Timeouts {
            image: limit,
            audio: limit,
            judge: limit,
        };
        (AiWorker::new(Arc::new(SlowEcho { delay }), tx, timeouts), rx)
    }

    fn recv(rx: &mpsc::Receiver<AppEvent>) -> AiResponse {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            AppEvent::Ai(response) => response,
            _ => panic!("expected an AI response"),
        }
    }

    #[test]
    fn delivers_results_with_their_ticket() {
        let (mut worker, rx) = worker(Duration::ZERO, Duration::from_secs(5));
        let ticket = worker.submit(AiRequest::Image {
            sentence: "QUJD".to_string(),
        });
        let response = recv(&rx);
        assert_eq!(response.ticket, ticket);
        assert_eq!(
            response.outcome,
            AiOutcome::Image(Some(GeneratedImage {
                uri: "data:image/png;base64,QUJD".to_string()
            }))
        );
    }

    #[test]
    fn tickets_increase() {
        let (mut worker, _rx) = worker(Duration::ZERO, Duration::from_secs(5));
        let a = worker.submit(AiRequest::Audio {
            sentence: "hole".to_string(),
        });
        let b = worker.submit(AiRequest::Audio {
            sentence: "pole".to_string(),
        });
        assert!(b > a);
    }

    #[test]
    fn slow_requests_time_out() {
        let (mut worker, rx) = worker(Duration::from_millis(500), Duration::from_millis(20));
        let ticket = worker.submit(AiRequest::Judge {
            image_base64: "AAAA".to_string(),
            target: "Hi.".to_string(),
        });
        let response = recv(&rx);
        assert_eq!(response.ticket, ticket);
        assert_eq!(response.outcome, AiOutcome::TimedOut);
    }

    struct Panics;

    impl AiCapability for Panics {
        fn generate_image(&self, _sentence: &str) -> Option<GeneratedImage> {
            panic!("boom")
        }

        fn generate_audio(&self, _sentence: &str) -> Option<String> {
            panic!("boom")
        }

        fn judge_handwriting(&self, _image_base64: &str, _target: &str) -> Verdict {
            panic!("boom")
        }
    }

    #[test]
    fn dead_judge_is_still_a_verdict() {
        let (tx, rx) = mpsc::channel();
        let timeouts = Timeouts {
            image: Duration::from_secs(5),
            audio: Duration::from_secs(5),
            judge: Duration::from_secs(5),
        };
        let mut worker = AiWorker::new(Arc::new(Panics), tx, timeouts);
        worker.submit(AiRequest::Judge {
            image_base64: "AAAA".to_string(),
            target: "Hi.".to_string(),
        });
        match recv(&rx).outcome {
            AiOutcome::Verdict(verdict) => {
                assert!(!verdict.correct);
                assert_eq!(verdict.feedback, JUDGE_FAILED_FEEDBACK);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
