pub mod download;
pub mod media;
pub mod monitored;
pub mod profile;
pub mod subtitle;
pub mod tag;

pub use download::DownloadRepository;
pub use media::MediaRepository;
pub use monitored::MonitoredRepository;
pub use profile::ProfileRepository;
pub use subtitle::SubtitleRepository;
pub use tag::TagRepository;
