use std::path::PathBuf;

/// Fatal errors that end the program
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("standard output is not a terminal; ballcourt needs a terminal to draw into")]
    NotATerminal,

    #[error("could not determine the terminal size")]
    UnknownTerminalSize,

    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
