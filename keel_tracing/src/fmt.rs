use crate::{FormatFlavor, TracingConfig};
use tracing_core::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::fmt::format::{Compact, DefaultFields, Format, Pretty};
use tracing_subscriber::fmt::{FormatFields, layer as make_fmt_layer};
use tracing_subscriber::registry::LookupSpan;

/// Creates a console [formatted `Layer`](FmtLayer) based on the given
/// [config](TracingConfig).
pub fn make_layer<S>(config: impl AsRef<TracingConfig>) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let config = config.as_ref();
    let targets = make_targets(config);

    // Applies the timestamp choice and the target filter, then boxes the layer
    macro_rules! finish {
        ($layer:expr) => {{
            let layer = $layer;
            if config.show_timestamp() {
                Box::new(layer.with_filter(targets))
            } else {
                Box::new(layer.without_time().with_filter(targets))
            }
        }};
    }

    match config.flavor() {
        FormatFlavor::Full => {
            let layer: FmtLayer<S> = configure(make_fmt_layer(), config);
            finish!(layer)
        }
        FormatFlavor::Compact => {
            let layer: FmtLayer<S, DefaultFields, Format<Compact>> =
                configure(make_fmt_layer().compact(), config);
            finish!(layer)
        }
        FormatFlavor::Pretty => {
            let layer: FmtLayer<S, Pretty, Format<Pretty>> =
                configure(make_fmt_layer().pretty(), config);
            finish!(layer)
        }
        #[cfg(feature = "json")]
        FormatFlavor::Json => {
            use tracing_subscriber::fmt::format::{Json, JsonFields};

            let layer: FmtLayer<S, JsonFields, Format<Json>> =
                configure(make_fmt_layer().json(), config)
                    .flatten_event(config.flatten_json());
            finish!(layer)
        }
    }
}

/// Applies the display toggles chosen in the given [config](TracingConfig) to
/// a generic base layer.
pub(crate) fn configure<S, N, L, T, W>(
    mut layer: FmtLayer<S, N, Format<L, T>, W>,
    config: &TracingConfig,
) -> FmtLayer<S, N, Format<L, T>, W>
where
    N: for<'writer> FormatFields<'writer> + 'static,
{
    #[allow(unused_mut)]
    let mut no_color = !config.color();

    #[cfg(feature = "json")]
    if config.flavor() == FormatFlavor::Json {
        no_color = true;
    }

    if no_color {
        layer = layer.with_ansi(false);
    }

    layer
        .with_target(config.show_target())
        .with_file(config.show_file())
        .with_line_number(config.show_line_number())
        .with_level(config.show_level())
        .with_thread_ids(config.show_thread_id())
        .with_thread_names(config.show_thread_name())
}

/// Creates the [per-target filter](Targets) from the root verbosity and the
/// per-target overrides.
pub(crate) fn make_targets(config: &TracingConfig) -> Targets {
    Targets::new()
        .with_default(config.verbosity())
        .with_targets(config.targets())
}
