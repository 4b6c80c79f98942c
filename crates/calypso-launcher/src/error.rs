use std::io;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("a capture is already running")]
    AlreadyRunning,

    #[error("{0} requires confirmation")]
    NotConfirmed(&'static str),
}
