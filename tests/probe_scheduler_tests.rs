// tests/probe_scheduler_tests.rs
use async_trait::async_trait;
use netwatch::health::{Health, Notifier, Transition};
use netwatch::probe::{Probe, ProbeError, TlsProbe};
use netwatch::scheduler::{Jitter, ProbeRunner};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, name: &str, transition: &Transition) {
        let detail = match transition {
            Transition::FirstFailure { error } => error.to_string(),
            Transition::Recovered { previous, .. } => previous.to_string(),
            other => panic!("non-notifying transition reached notifier: {:?}", other),
        };
        self.events
            .lock()
            .unwrap()
            .push((format!("{}:{}", name, transition.label()), detail));
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_tls_outage_notifies_once() {
    let port = closed_port().await;
    let tls = Arc::new(
        TlsProbe::new("127.0.0.1", port, Duration::from_secs(20))
            .with_timeout(Duration::from_secs(5)),
    );
    let notifier = Arc::new(RecordingNotifier::default());
    let mut runner = ProbeRunner::new(tls, notifier.clone(), Jitter::new(Duration::ZERO));

    let first = runner.tick().await;
    assert!(matches!(first, Transition::FirstFailure { .. }));
    assert_eq!(runner.state().health(), Health::Bad);

    for _ in 2..=5 {
        let t = runner.tick().await;
        assert!(matches!(t, Transition::StillFailing { .. }));
        assert!(!t.is_notifying());
        assert_eq!(runner.state().health(), Health::Bad);
    }
    assert!(matches!(
        runner.state().last_error(),
        Some(ProbeError::Connect { .. })
    ));

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].0,
        format!("TLS 127.0.0.1:{}:first_failure", port)
    );
    assert!(events[0].1.contains(&format!("127.0.0.1:{}", port)));
}

#[tokio::test]
async fn test_interval_is_constant() {
    let tls = TlsProbe::new("9.9.9.9", 443, Duration::from_secs(40));
    for _ in 0..5 {
        assert_eq!(tls.interval(), Duration::from_secs(40));
    }
}
