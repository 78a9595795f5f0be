use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A build-fatal error. Everything here aborts the build before or during
/// orchestration; per-page failures are represented separately (see
/// [`crate::scheduler::PageFailure`]) and never surface as an `Error`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to prepare output directory {path}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy static assets from {path}")]
    StaticAssets {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read configuration file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration file {path} must contain a mapping")]
    ConfigNotAMapping { path: PathBuf },

    #[error("failed to compile stylesheet `{name}`")]
    Stylesheet {
        name: String,
        #[source]
        source: Box<grass::Error>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}
