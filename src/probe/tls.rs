// src/probe/tls.rs
use super::{Probe, ProbeError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

/// Opens a TCP connection and negotiates TLS against the platform trust store.
#[derive(Debug, Clone)]
pub struct TlsProbe {
    host: String,
    port: u16,
    interval: Duration,
    timeout: Option<Duration>,
    #[cfg(test)]
    test_root_pem: Option<Vec<u8>>,
}

impl TlsProbe {
    pub fn new(host: impl Into<String>, port: u16, interval: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            interval,
            timeout: None,
            #[cfg(test)]
            test_root_pem: None,
        }
    }

    /// Bound connect + handshake. Without it the OS connect timeout applies.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn handshake(&self, target: &str) -> Result<(), ProbeError> {
        let tcp = TcpStream::connect(target)
            .await
            .map_err(|source| ProbeError::Connect {
                target: target.to_string(),
                source,
            })?;

        let connector = self.connector().map_err(|source| ProbeError::Tls {
            target: target.to_string(),
            source,
        })?;
        let connector = tokio_native_tls::TlsConnector::from(connector);

        let mut stream = connector
            .connect(&self.host, tcp)
            .await
            .map_err(|source| ProbeError::Tls {
                target: target.to_string(),
                source,
            })?;

        // close_notify is best effort, the stream is dropped either way
        if let Err(e) = stream.shutdown().await {
            debug!("TLS shutdown for {} returned: {}", target, e);
        }

        Ok(())
    }

    fn connector(&self) -> Result<native_tls::TlsConnector, native_tls::Error> {
        let builder = native_tls::TlsConnector::builder();
        #[cfg(test)]
        let builder = self.with_test_root(builder)?;
        builder.build()
    }
}

#[cfg(test)]
impl TlsProbe {
    fn trusting(mut self, root_pem: &[u8]) -> Self {
        self.test_root_pem = Some(root_pem.to_vec());
        self
    }

    fn with_test_root(
        &self,
        mut builder: native_tls::TlsConnectorBuilder,
    ) -> Result<native_tls::TlsConnectorBuilder, native_tls::Error> {
        if let Some(pem) = &self.test_root_pem {
            builder.add_root_certificate(native_tls::Certificate::from_pem(pem)?);
        }
        Ok(builder)
    }
}

#[async_trait]
impl Probe for TlsProbe {
    async fn run(&self) -> Result<(), ProbeError> {
        let target = self.target();

        match self.timeout {
            Some(limit) => timeout(limit, self.handshake(&target))
                .await
                .map_err(|_| ProbeError::Timeout {
                    target: target.clone(),
                    after: limit,
                })??,
            None => self.handshake(&target).await?,
        }

        info!("TLS connection established to {}", target);
        Ok(())
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> String {
        format!("TLS {}", self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{Health, Notifier, Transition};
    use crate::scheduler::{Jitter, ProbeRunner};
    use std::sync::{Arc, Mutex};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const CA_PEM: &[u8] = include_bytes!("../../tests/fixtures/ca.pem");
    const SERVER_PEM: &[u8] = include_bytes!("../../tests/fixtures/server.pem");
    const SERVER_KEY: &[u8] = include_bytes!("../../tests/fixtures/server.key");

    /// Completes TLS handshakes with the fixture certificate for 127.0.0.1.
    fn serve_tls(listener: TcpListener) -> JoinHandle<()> {
        let identity = native_tls::Identity::from_pkcs8(SERVER_PEM, SERVER_KEY).unwrap();
        let acceptor =
            tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    if let Ok(mut stream) = acceptor.accept(tcp).await {
                        let mut buf = [0u8; 16];
                        let _ = stream.read(&mut buf).await;
                    }
                });
            }
        })
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, _name: &str, transition: &Transition) {
            self.seen.lock().unwrap().push(transition.label());
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[test]
    fn test_name_and_interval() {
        let probe = TlsProbe::new("1.1.1.1", 443, Duration::from_secs(20));
        assert_eq!(probe.name(), "TLS 1.1.1.1:443");
        assert_eq!(probe.interval(), Duration::from_secs(20));
        assert_eq!(probe.interval(), probe.interval());
    }

    #[tokio::test]
    async fn test_handshake_with_reachable_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = serve_tls(listener);

        let check = TlsProbe::new("127.0.0.1", port, Duration::from_secs(20))
            .with_timeout(Duration::from_secs(5))
            .trusting(CA_PEM);
        let result = check.run().await;
        assert!(result.is_ok(), "handshake should succeed: {:?}", result);

        server.abort();
    }

    #[tokio::test]
    async fn test_default_trust_rejects_unknown_issuer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = serve_tls(listener);

        let check = TlsProbe::new("127.0.0.1", port, Duration::from_secs(20))
            .with_timeout(Duration::from_secs(5));
        let result = check.run().await;
        assert!(
            matches!(result, Err(ProbeError::Tls { .. })),
            "expected TLS error, got {:?}",
            result
        );

        server.abort();
    }

    #[tokio::test]
    async fn test_outage_then_recovery_when_port_reopens() {
        // Grab a free port, then release it so ticks 1-5 are refused
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let check = Arc::new(
            TlsProbe::new("127.0.0.1", port, Duration::from_secs(20))
                .with_timeout(Duration::from_secs(5))
                .trusting(CA_PEM),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let mut runner = ProbeRunner::new(check, notifier.clone(), Jitter::new(Duration::ZERO));

        assert!(matches!(runner.tick().await, Transition::FirstFailure { .. }));
        for _ in 2..=5 {
            let transition = runner.tick().await;
            assert!(matches!(transition, Transition::StillFailing { .. }));
            assert!(!transition.is_notifying());
            assert_eq!(runner.state().health(), Health::Bad);
        }

        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let server = serve_tls(listener);

        match runner.tick().await {
            Transition::Recovered { previous, .. } => match &*previous {
                ProbeError::Connect { target, .. } => {
                    assert_eq!(*target, format!("127.0.0.1:{}", port))
                }
                other => panic!("expected the connection error, got {:?}", other),
            },
            other => panic!("expected recovery on tick 6, got {:?}", other),
        }
        assert_eq!(runner.state().health(), Health::Good);
        assert!(runner.state().last_error().is_none());
        assert_eq!(
            *notifier.seen.lock().unwrap(),
            vec!["first_failure", "recovered"]
        );

        server.abort();
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Grab a free port, then release it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = TlsProbe::new("127.0.0.1", port, Duration::from_secs(1));
        match probe.run().await {
            Err(ProbeError::Connect { target, .. }) => {
                assert_eq!(target, format!("127.0.0.1:{}", port));
            }
            other => panic!("expected connect error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_peer_closing_before_handshake_is_tls_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let probe = TlsProbe::new("127.0.0.1", port, Duration::from_secs(1))
            .with_timeout(Duration::from_secs(5));
        let result = probe.run().await;
        assert!(
            matches!(result, Err(ProbeError::Tls { .. })),
            "expected TLS error, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept and hold the connection without ever answering the ClientHello
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let probe = TlsProbe::new("127.0.0.1", port, Duration::from_secs(1))
            .with_timeout(Duration::from_millis(200));
        match probe.run().await {
            Err(ProbeError::Timeout { after, .. }) => {
                assert_eq!(after, Duration::from_millis(200))
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
