use std::path::PathBuf;

use crate::ai::Ticket;
use crate::content::StudyItem;
use crate::exercise::Media;

/// Sentence step one: read the sentence and its meaning, with an
/// illustration when one can be made. Always satisfiable.
pub struct StudyCard {
    pub item: StudyItem,
    pub image: Media,
}

impl StudyCard {
    pub fn new(item: StudyItem) -> Self {
        Self {
            item,
            image: Media::Idle,
        }
    }

    pub fn is_solved(&self) -> bool {
        true
    }

    pub fn image_loading(&mut self, ticket: Ticket) {
        self.image = Media::Loading(ticket);
    }

    pub fn image_cached(&mut self, path: PathBuf) {
        self.image = Media::Ready(path);
    }

    /// Take a finished image request. Returns false, and changes nothing,
    /// when the ticket belongs to an earlier request.
    pub fn accept_image(&mut self, ticket: Ticket, path: Option<PathBuf>) -> bool {
        if self.image.ticket() != Some(ticket) {
            return false;
        }
        self.image = path.map_or(Media::Failed, Media::Ready);
        true
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.image, Media::Idle | Media::Failed)
    }
}
