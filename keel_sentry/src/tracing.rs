use keel_core::ALERT_FIELD_NAME;
use sentry_tracing::{EventMapping, SentryLayer};
use std::fmt::Debug;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Creates a [`SentryLayer`] that generates a Sentry event for every `tracing`
/// event carrying a field named [`ALERT_FIELD_NAME`], and ignores all other
/// events.
///
/// The value of the field picks the kind of Sentry event:
///
/// - `"breadcrumb"` or `"crumb"` generates a breadcrumb,
/// - `false` generates nothing,
/// - anything else generates a normal event.
///
/// The level of the `tracing` event does not matter.
///
/// ## Examples
///
/// ```
/// tracing::error!(alert = true, component = "db", "Connection lost");
///
/// tracing::info!(alert = "breadcrumb", "Cache warmed up");
///
/// // Not sent to Sentry
/// tracing::info!("Request served");
/// ```
pub fn make_layer<S>() -> SentryLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    sentry_tracing::layer().event_mapper(map_event)
}

fn map_event<S>(event: &Event, ctx: Context<'_, S>) -> EventMapping
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let mut visitor = AlertVisitor::default();
    event.record(&mut visitor);

    match visitor.kind {
        None => EventMapping::Ignore,
        Some(AlertKind::Event) => EventMapping::Event(sentry_tracing::event_from_event(event, &ctx)),
        Some(AlertKind::Breadcrumb) => {
            EventMapping::Breadcrumb(sentry_tracing::breadcrumb_from_event(event, &ctx))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlertKind {
    Event,
    Breadcrumb,
}

/// Looks for the alert field among the fields of an event.
#[derive(Default)]
struct AlertVisitor {
    kind: Option<AlertKind>,
}

impl Visit for AlertVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == ALERT_FIELD_NAME {
            self.kind = value.then_some(AlertKind::Event);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == ALERT_FIELD_NAME {
            self.kind = Some(match value {
                "breadcrumb" | "crumb" => AlertKind::Breadcrumb,
                _ => AlertKind::Event,
            });
        }
    }

    // Every other value type lands here
    fn record_debug(&mut self, field: &Field, _value: &dyn Debug) {
        if field.name() == ALERT_FIELD_NAME {
            self.kind = Some(AlertKind::Event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt;

    fn captured(emit: impl FnOnce()) -> Vec<sentry::protocol::Event<'static>> {
        sentry::test::with_captured_events(|| {
            let subscriber = tracing_subscriber::registry().with(make_layer());
            tracing::subscriber::with_default(subscriber, emit);
        })
    }

    #[test]
    fn alert_generates_event() {
        let events = captured(|| {
            tracing::error!(alert = true, component = "db", "Connection lost");
        });

        assert_eq!(events.len(), 1);
    }

    #[test]
    fn plain_event_is_ignored() {
        let events = captured(|| {
            tracing::error!(component = "db", "Connection lost");
            tracing::warn!(alert = false, "Retrying");
        });

        assert_eq!(events.len(), 0);
    }

    #[test]
    fn breadcrumb_is_not_an_event() {
        let events = captured(|| {
            tracing::info!(alert = "crumb", "Cache warmed up");
        });

        assert_eq!(events.len(), 0);
    }
}
