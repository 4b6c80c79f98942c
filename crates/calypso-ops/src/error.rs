use calypso_console::ConsoleError;
use calypso_core::IdentityError;
use calypso_hlr::HlrError;

#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    /// The console could not be reached at all
    #[error("cannot connect to console: {0}")]
    Connection(#[source] ConsoleError),

    /// An exchange on an open session failed (timeout, closed stream)
    #[error("console exchange failed: {0}")]
    Console(#[from] ConsoleError),

    #[error("{0} not found")]
    NotFound(String),

    /// The controller rejected a command with an error marker
    #[error("command `{command}` failed{}: {response}", iteration_suffix(.iteration))]
    Command {
        iteration: Option<u32>,
        command: String,
        response: String,
    },

    #[error("{0}")]
    Store(#[from] HlrError),

    #[error("{0}")]
    Invalid(#[from] IdentityError),

    #[error("interrupted")]
    Interrupted,
}

fn iteration_suffix(iteration: &Option<u32>) -> String {
    match iteration {
        Some(i) => format!(" in iteration {}", i),
        None => String::new(),
    }
}

impl OpsError {
    pub fn command(command: &str, response: &str) -> Self {
        OpsError::Command {
            iteration: None,
            command: command.to_string(),
            response: response.to_string(),
        }
    }

    /// Process exit status for a tool that ends with this error
    pub fn exit_code(&self) -> i32 {
        match self {
            OpsError::Interrupted => 130,
            _ => 1,
        }
    }
}
