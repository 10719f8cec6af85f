#[cfg(test)]
mod tests {
    use keel::{
        BoxError, Component, ConstructionError, Context, Gate, KeyedComponent, LaunchError,
        Handle, Launchpad, ServiceError, async_trait, with_file_logger_in, with_init_runnable,
        with_name, with_runnable,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct Broken {
        prefix: &'static str,
    }

    #[async_trait]
    impl Component for Broken {
        async fn run(&self, _ctx: &Context) -> Result<(), BoxError> {
            Err("unreachable host".into())
        }

        fn stop(&self) -> Gate {
            Gate::ready()
        }
    }

    impl KeyedComponent for Broken {
        fn prefix(&self) -> &str {
            self.prefix
        }

        fn handle(&self) -> Handle {
            Arc::new(())
        }
    }

    #[test]
    fn construction_error() {
        // When
        let result = Launchpad::new([
            with_name("launchpad-duplicates"),
            with_init_runnable(Broken { prefix: "db" }),
            with_init_runnable(Broken { prefix: "db" }),
        ])
        .run();

        // Then
        match result {
            Err(LaunchError::Construction(error)) => assert_eq!(
                error,
                ConstructionError::DuplicatePrefix {
                    prefix: "db".to_string(),
                },
            ),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn init_error() {
        // When
        let result = Launchpad::new([
            with_name("launchpad-init"),
            with_init_runnable(Broken { prefix: "db" }),
        ])
        .run();

        // Then
        match result {
            Err(LaunchError::Service(ServiceError::Init { prefix, source })) => {
                assert_eq!(prefix, "db");
                assert_eq!(source.to_string(), "unreachable host");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn background_error() {
        // When
        let result = Launchpad::new([
            with_name("launchpad-background"),
            with_runnable(Broken { prefix: "unused" }),
        ])
        .run();

        // Then
        assert!(matches!(
            result,
            Err(LaunchError::Service(ServiceError::Component { .. })),
        ));
    }

    #[test]
    #[cfg(feature = "tracing")]
    fn file_logging_creates_directory() {
        // Given
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("keel-launchpad-{}", nanos));

        // When
        let result = Launchpad::new([
            with_name("launchpad-files"),
            with_file_logger_in(&dir),
            with_init_runnable(Broken { prefix: "db" }),
        ])
        .run();

        // Then
        assert!(result.is_err());
        assert!(dir.is_dir());

        let _ = std::fs::remove_dir_all(dir);
    }
}
