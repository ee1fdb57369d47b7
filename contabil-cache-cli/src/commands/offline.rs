//! Offline page command.

use contabil_cache::worker::OFFLINE_PAGE;

use crate::error::CliError;

/// Print the offline fallback page as served to document requests.
pub fn run() -> Result<(), CliError> {
    print!("{}", OFFLINE_PAGE);
    Ok(())
}
