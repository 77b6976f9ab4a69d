pub mod prelude;

pub mod downloads;
pub mod language_profiles;
pub mod media_items;
pub mod media_profiles;
pub mod monitored_items;
pub mod subtitles;
pub mod tag_associations;
pub mod tags;
