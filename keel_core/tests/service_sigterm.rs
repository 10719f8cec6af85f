#[cfg(all(test, unix))]
mod tests {
    use keel_core::{Exit, Service, ServiceState, Signal, with_name};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn sigterm() {
        // Given
        let service = Arc::new(Service::new([with_name("sigterm")]));
        service.init().await.unwrap();
        let running = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.start().await }
        });
        while service.state() != ServiceState::Running {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // When
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        let exit = tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        // Then
        assert_eq!(exit, Exit::Signal(Signal::Terminate));
        assert_eq!(service.state(), ServiceState::Stopped);
    }
}
