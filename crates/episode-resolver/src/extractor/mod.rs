pub mod episode;
pub mod utils;

pub use episode::{parse_episode_page, parse_server_page};
