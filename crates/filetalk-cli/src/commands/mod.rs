//! Command implementations.

mod card;
mod config;
mod emit;
mod parse;
mod watch;

pub use card::CardCommand;
pub use config::ConfigCommand;
pub use emit::EmitCommand;
pub use parse::ParseCommand;
pub use watch::WatchCommand;

use std::io::Read;
use std::path::{Path, PathBuf};

use filetalk_form::FormSpec;
use tracing::debug;

use crate::error::CliError;

/// Largest description file accepted.
const MAX_DESCRIPTION_SIZE: usize = 1024 * 1024;

/// A form description read from a file or stdin.
pub(crate) struct LoadedForm {
    pub spec: FormSpec,
    /// `None` when read from stdin.
    pub source: Option<PathBuf>,
}

/// Read and parse a description; `-` means stdin.
pub(crate) fn load_form(path: &Path) -> Result<LoadedForm, CliError> {
    let (text, source) = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        (text, None)
    } else {
        if !path.is_file() {
            return Err(CliError::user_with_hint(
                format!("form description not found: {}", path.display()),
                "pass a description file, or `-` to read from stdin",
            ));
        }
        let text = filetalk_common_fs::read_to_string(path, MAX_DESCRIPTION_SIZE)?;
        (text, Some(path.to_path_buf()))
    };

    let spec = FormSpec::parse(&text)?;
    debug!(fields = spec.len(), "parsed form description");
    Ok(LoadedForm { spec, source })
}
