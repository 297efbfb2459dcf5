pub mod episode;
pub mod media_kind;
pub mod resolved_stream;
pub mod source;

pub use episode::{DownloadLink, EpisodeDetails, Server};
pub use media_kind::MediaKind;
pub use resolved_stream::ResolvedStream;
pub use source::SourceCandidate;
