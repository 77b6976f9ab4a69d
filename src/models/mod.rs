pub mod download;
pub mod media;
pub mod monitored;
pub mod profile;
pub mod subtitle;
pub mod tag;

pub use download::DownloadRecord;
pub use media::MediaItem;
pub use monitored::{MonitorStatus, MonitoredItem};
pub use profile::{LanguageProfile, ProfileLanguage};
pub use subtitle::{ModificationType, SubtitleRecord};
pub use tag::{HasEntityIdentity, Tag, TagAssignment};
