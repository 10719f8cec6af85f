use crate::ConstructionError;
use std::path::{Path, PathBuf};

const FILE_DOT_ENV_LOCAL: &str = ".env.local";
const FILE_DOT_ENV_GLOBAL: &str = ".env";

/// Name of the environment variable that points to an explicit dot-env file.
pub const ENV_FILE_VARIABLE: &str = "ENV_FILE";

/// A facade for loading environment variables from dot-env files before the
/// service flags are resolved.
///
/// Loading never overrides variables that are already set in the process
/// environment.
pub struct DotEnv;

impl DotEnv {
    /// Loads the dot-env file(s) applicable to this process.
    ///
    /// - If `explicit` is given, or the `ENV_FILE` environment variable is set,
    ///   that single file is loaded, and it must exist.
    /// - Otherwise `.env.local` and then `.env` are loaded from the current
    ///   directory, each only if present. Variables from `.env.local` take
    ///   precedence.
    pub fn load(explicit: Option<&Path>) -> Result<(), ConstructionError> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_FILE_VARIABLE).map(PathBuf::from));

        match explicit {
            Some(path) => Self::load_required(&path),
            None => {
                Self::load_optional(Path::new(FILE_DOT_ENV_LOCAL))?;
                Self::load_optional(Path::new(FILE_DOT_ENV_GLOBAL))
            }
        }
    }

    /// Loads the given file, failing if it is missing or malformed.
    pub fn load_required(path: &Path) -> Result<(), ConstructionError> {
        dotenvy::from_path(path)
            .map(|_| ())
            .map_err(|source| ConstructionError::EnvFile {
                path: path.to_path_buf(),
                message: source.to_string(),
            })
    }

    /// Loads the given file if it exists, failing only if it is malformed.
    pub fn load_optional(path: &Path) -> Result<(), ConstructionError> {
        if !path.is_file() {
            return Ok(());
        }

        Self::load_required(path)
    }
}
