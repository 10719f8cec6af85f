use std::collections::HashMap;
use std::fmt::{Display, Formatter, Write};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// An ordered set of externally configurable parameters (flags), declared by
/// components during [`init_flags`](crate::Component::init_flags).
///
/// Every flag is resolved from an environment variable whose name is derived
/// from the flag name: upper-cased, with dashes replaced by underscores
/// (`db-uri` becomes `DB_URI`). Flags whose variable is not set keep their
/// default value.
#[derive(Debug, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
    index: HashMap<String, usize>,
    duplicates: Vec<String>,
}

/// A handle on a single declared flag. Cheap to clone.
///
/// The value becomes available once the owning [`FlagSet`] is parsed; until
/// then, [`value`](Flag::value) reports the default.
#[derive(Debug, Clone)]
pub struct Flag {
    inner: Arc<FlagInner>,
}

#[derive(Debug)]
struct FlagInner {
    name: String,
    default: String,
    usage: String,
    value: OnceLock<String>,
}

/// Represents a failure to interpret a flag value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// The value could not be parsed as the requested type.
    #[error("invalid value '{value}' for flag '{flag}': {message}")]
    Parse {
        /// The flag name.
        flag: String,
        /// The offending value.
        value: String,
        /// The parser's message.
        message: String,
    },
}

impl FlagSet {
    /// Creates an empty flag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a flag with the given name, default value, and usage text, and
    /// returns its [`Flag`] handle.
    ///
    /// Declaring the same name twice returns the handle of the first
    /// declaration and records the name as a duplicate, which makes the
    /// service construction fail.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        default: impl Into<String>,
        usage: impl Into<String>,
    ) -> Flag {
        let name = name.into();

        if let Some(&position) = self.index.get(&name) {
            self.duplicates.push(name);
            return self.flags[position].clone();
        }

        let flag = Flag {
            inner: Arc::new(FlagInner {
                name: name.clone(),
                default: default.into(),
                usage: usage.into(),
                value: OnceLock::new(),
            }),
        };

        self.index.insert(name, self.flags.len());
        self.flags.push(flag.clone());

        flag
    }

    /// Returns the flag declared under the given name, if any.
    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.index.get(name).map(|&position| &self.flags[position])
    }

    /// Iterates over the declared flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Reports the number of declared flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Reports whether no flags were declared.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Names declared more than once.
    pub(crate) fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    /// Resolves every declared flag from the process environment.
    pub fn parse(&self) {
        self.parse_with(|name| std::env::var(name).ok());
    }

    /// Resolves every declared flag using the given lookup, which receives the
    /// [environment variable name](Flag::env_name) of each flag.
    ///
    /// Flags that were already resolved keep their value.
    pub fn parse_with<F>(&self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for flag in &self.flags {
            if let Some(value) = lookup(&flag.env_name()) {
                let _ = flag.inner.value.set(value);
            }
        }
    }

    /// Renders a sample dot-env file listing every declared flag with its
    /// usage text and default value.
    pub fn sample_env(&self) -> String {
        let mut output = String::new();

        for flag in &self.flags {
            let _ = writeln!(output, "## {} (-{})", flag.usage(), flag.name());
            let _ = writeln!(output, "{}={}", flag.env_name(), flag.default());
        }

        output
    }
}

impl Flag {
    /// The flag name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The default value.
    pub fn default(&self) -> &str {
        &self.inner.default
    }

    /// The usage text.
    pub fn usage(&self) -> &str {
        &self.inner.usage
    }

    /// The environment variable this flag is resolved from.
    pub fn env_name(&self) -> String {
        self.inner.name.to_uppercase().replace('-', "_")
    }

    /// Reports whether a value was resolved from the environment.
    pub fn is_set(&self) -> bool {
        self.inner.value.get().is_some()
    }

    /// The resolved value, or the default if none was resolved.
    pub fn value(&self) -> &str {
        self.inner
            .value
            .get()
            .map(String::as_str)
            .unwrap_or(&self.inner.default)
    }

    /// Parses the [value](Flag::value) as `T`.
    pub fn parse<T>(&self) -> Result<T, FlagError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.value();

        value.parse::<T>().map_err(|error| FlagError::Parse {
            flag: self.name().to_string(),
            value: value.to_string(),
            message: error.to_string(),
        })
    }
}

impl Display for Flag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "-{}={}", self.name(), self.value())
    }
}
