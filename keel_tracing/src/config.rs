use crate::{FormatFlavor, Verbosity};
use serde::Deserialize;
use std::collections::BTreeMap;

pub mod flavor;
pub mod verbosity;

/// Represents the logging configuration: everything related to pre-configuring
/// the [formatted layer](tracing_subscriber::fmt::Layer) provided by the
/// `tracing-subscriber` crate.
///
/// Deserializes from a (possibly sparse) map. Missing keys keep their
/// [default](TracingConfig::default) values, and most keys accept a few
/// aliases (e.g., `level` for `verbosity`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    #[serde(alias = "level")]
    verbosity: Verbosity,
    #[serde(alias = "flavour", alias = "format")]
    flavor: FormatFlavor,
    #[serde(
        alias = "with_color",
        alias = "colour",
        alias = "show_color",
        alias = "show_colors"
    )]
    color: bool,
    #[serde(alias = "with_timestamp")]
    show_timestamp: bool,
    #[serde(alias = "with_target")]
    show_target: bool,
    #[serde(alias = "with_file")]
    show_file: bool,
    #[serde(alias = "show_line", alias = "with_line_number")]
    show_line_number: bool,
    #[serde(alias = "with_level")]
    show_level: bool,
    #[serde(alias = "with_thread_id")]
    show_thread_id: bool,
    #[serde(alias = "with_thread_name")]
    show_thread_name: bool,
    #[cfg(feature = "json")]
    #[serde(alias = "flat_json")]
    flatten_json: bool,
    #[serde(alias = "custom_targets")]
    targets: BTreeMap<String, Verbosity>,
}

impl TracingConfig {
    /// Replaces the root [`Verbosity`] level.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;

        self
    }

    /// Replaces the [`FormatFlavor`].
    pub fn with_flavor(mut self, flavor: FormatFlavor) -> Self {
        self.flavor = flavor;

        self
    }

    /// Enables or disables colored output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;

        self
    }

    /// Merges an extra per-target [`Verbosity`] level into this config.
    pub fn with_target(
        mut self,
        target: impl Into<String>,
        verbosity: impl Into<Verbosity>,
    ) -> Self {
        self.targets.insert(target.into(), verbosity.into());

        self
    }
}

impl TracingConfig {
    /// Reports the root [verbosity level](Verbosity).
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Reports the [formatting flavor](FormatFlavor).
    pub fn flavor(&self) -> FormatFlavor {
        self.flavor
    }

    /// Reports whether colored output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Reports whether the timestamp is included in the output.
    pub fn show_timestamp(&self) -> bool {
        self.show_timestamp
    }

    /// Reports whether the target is included in the output.
    pub fn show_target(&self) -> bool {
        self.show_target
    }

    /// Reports whether the source file is included in the output.
    pub fn show_file(&self) -> bool {
        self.show_file
    }

    /// Reports whether the line number is included in the output.
    pub fn show_line_number(&self) -> bool {
        self.show_line_number
    }

    /// Reports whether the level is included in the output.
    pub fn show_level(&self) -> bool {
        self.show_level
    }

    /// Reports whether the thread ID is included in the output.
    pub fn show_thread_id(&self) -> bool {
        self.show_thread_id
    }

    /// Reports whether the thread name is included in the output.
    pub fn show_thread_name(&self) -> bool {
        self.show_thread_name
    }

    /// Reports whether the JSON output is flattened.
    #[cfg(feature = "json")]
    pub fn flatten_json(&self) -> bool {
        self.flatten_json
    }

    /// Reports the per-target verbosity overrides.
    pub fn targets(&self) -> &BTreeMap<String, Verbosity> {
        &self.targets
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            flavor: FormatFlavor::default(),
            color: true,
            show_timestamp: true,
            show_target: true,
            show_file: false,
            show_line_number: false,
            show_level: true,
            show_thread_id: true,
            show_thread_name: false,
            #[cfg(feature = "json")]
            flatten_json: true,
            targets: BTreeMap::default(),
        }
    }
}

impl AsRef<TracingConfig> for TracingConfig {
    fn as_ref(&self) -> &TracingConfig {
        self
    }
}
