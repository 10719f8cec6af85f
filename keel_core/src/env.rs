use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// The string that is recognized as the [**development**](AppEnv::Dev)
/// environment.
pub const APP_ENV_DEV: &str = "dev";

/// The string that is recognized as the [**staging**](AppEnv::Stg)
/// environment.
pub const APP_ENV_STG: &str = "stg";

/// The string that is recognized as the [**production**](AppEnv::Prd)
/// environment.
pub const APP_ENV_PRD: &str = "prd";

/// The deployment environment of the service, resolved from the `app-env`
/// flag (environment variable `APP_ENV`) at construction time.
///
/// There are three **well-known environments**: [`Dev`](AppEnv::Dev),
/// [`Stg`](AppEnv::Stg), and [`Prd`](AppEnv::Prd). Any other name is kept as a
/// [custom](AppEnv::Custom) environment, forced to lowercase.
///
/// The environment is reported to crash reporting and in the startup log
/// entry; the service itself implements no environment-specific logic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppEnv {
    /// The **development** environment. This is the default.
    Dev,

    /// The **staging** environment.
    Stg,

    /// The **production** environment.
    Prd,

    /// Any custom environment name.
    Custom(String),
}

impl AppEnv {
    /// Constructs an [`AppEnv`] from the given name.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim().to_lowercase();

        match name.as_str() {
            "" => Self::default(),
            APP_ENV_DEV => Self::Dev,
            APP_ENV_STG => Self::Stg,
            APP_ENV_PRD => Self::Prd,
            _ => Self::Custom(name),
        }
    }

    /// Reports whether this is the [**development**](AppEnv::Dev)
    /// environment.
    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    /// Reports whether this is the [**staging**](AppEnv::Stg) environment.
    pub fn is_stg(&self) -> bool {
        matches!(self, Self::Stg)
    }

    /// Reports whether this is the [**production**](AppEnv::Prd) environment.
    pub fn is_prd(&self) -> bool {
        matches!(self, Self::Prd)
    }

    /// Exposes a view on this [`AppEnv`] as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            AppEnv::Dev => APP_ENV_DEV,
            AppEnv::Stg => APP_ENV_STG,
            AppEnv::Prd => APP_ENV_PRD,
            AppEnv::Custom(name) => name.as_str(),
        }
    }
}

impl Display for AppEnv {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for AppEnv {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for AppEnv {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl From<&str> for AppEnv {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Default for AppEnv {
    fn default() -> Self {
        Self::Dev
    }
}
