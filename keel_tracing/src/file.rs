use crate::TracingConfig;
use crate::fmt::{configure, make_targets};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_core::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::fmt::layer as make_fmt_layer;
use tracing_subscriber::registry::LookupSpan;

/// A boxed layer that writes log entries to a file, together with the guard
/// that keeps its background writer alive.
///
/// Dropping the [guard](WorkerGuard) flushes the buffered entries; keep it
/// around until the application is done logging.
pub struct FileLayer<S> {
    /// The layer to add to the subscriber.
    pub layer: Box<dyn Layer<S> + Send + Sync>,
    /// The guard of the non-blocking writer.
    pub guard: WorkerGuard,
}

/// Creates a layer that appends log entries to `dir/file_name` through a
/// non-blocking writer.
///
/// The directory is created if missing. Entries are written without ANSI
/// colors, using the verbosity and display toggles of the given
/// [config](TracingConfig).
pub fn make_file_layer<S>(
    config: impl AsRef<TracingConfig>,
    dir: impl AsRef<Path>,
    file_name: impl AsRef<Path>,
) -> io::Result<FileLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let config = config.as_ref();
    let dir = dir.as_ref();

    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let base: FmtLayer<S> = configure(make_fmt_layer(), config);
    let layer = base
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(make_targets(config));

    Ok(FileLayer {
        layer: Box::new(layer),
        guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Registry, SubscriberExt};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn writes_to_file() {
        // Given
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("keel-tracing-{}", nanos));
        let _cleanup = scopeguard::guard(dir.clone(), |dir| {
            let _ = std::fs::remove_dir_all(dir);
        });
        let FileLayer { layer, guard } =
            make_file_layer::<Registry>(TracingConfig::default(), &dir, "test.log").unwrap();
        let subscriber = Registry::default().with(layer);

        // When
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(component = "db", "Initializing");
        });
        drop(guard);

        // Then
        let contents = std::fs::read_to_string(dir.join("test.log")).unwrap();
        assert!(contents.contains("Initializing"));
        assert!(!contents.contains('\u{1b}'));
    }
}
