pub use super::downloads::Entity as Downloads;
pub use super::language_profiles::Entity as LanguageProfiles;
pub use super::media_items::Entity as MediaItems;
pub use super::media_profiles::Entity as MediaProfiles;
pub use super::monitored_items::Entity as MonitoredItems;
pub use super::subtitles::Entity as Subtitles;
pub use super::tag_associations::Entity as TagAssociations;
pub use super::tags::Entity as Tags;
