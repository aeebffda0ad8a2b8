use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid compose file: {0}")]
    Compose(String),

    #[error("invalid theme: {0}")]
    Theme(String),

    #[error("invalid layout settings: {0}")]
    Layout(String),

    #[error("unknown service '{0}'")]
    Selection(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("failed to serialize graph: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported output format: .{0} (use .svg, .png, .pdf or .json)")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
