//! Command-line surface over the library.
//!
//! Each invocation runs one command against the garage stored under the data
//! directory (`$AUTOSERVE_HOME` or `~/.autoserve`).

mod context;
mod handlers;
pub mod help;
pub mod output;
pub mod registry;

pub use context::CliContext;
pub use registry::{CommandEntry, CommandRegistry};

use crate::errors::{AutoServeError, Result};

/// Dispatches `args` (without the program name) to the matching command.
pub fn run_cli<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = args.into_iter().map(|arg| arg.as_ref().to_string()).collect();
    let registry = handlers::registry();

    let Some((raw, rest)) = args.split_first() else {
        help::print_overview(&registry);
        return Ok(());
    };
    let command = raw.to_lowercase();
    let handler = registry.handler(&command).ok_or_else(|| {
        AutoServeError::InvalidInput(format!("unknown command `{raw}`, try `help`"))
    })?;
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    tracing::debug!(command = %command, args = rest.len(), "dispatching command");
    handler(&registry, &rest)
}
