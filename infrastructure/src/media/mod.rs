//! Media adapters: HTTP download and audio containers

mod http_downloader;
mod wav;

pub use http_downloader::HttpMediaDownloader;
pub use wav::pcm_to_wav;
