//! Diagnostic run orchestration and failure isolation
//!
//! The orchestrator validates a [`DiagnosticRequest`], runs the applicable
//! probes concurrently as independent tasks, converts each step's failure
//! into a report entry without disturbing the other steps, and assembles a
//! single [`DiagnosticReport`]. It holds no per-run state: concurrent calls
//! to [`DiagnosticOrchestrator::run`] do not interfere.

use crate::{
    error::{AppError, Result},
    logging::Logger,
    probes::{BandwidthProbe, GeoLookup, PortProbe},
    types::{
        BandwidthSample, DiagnosticReport, DiagnosticRequest, GeoRecord, PortResult, PortState,
        ProbeStep, StepError,
    },
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Default upper bound for a single probe step
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Message recorded for steps that were cancelled before completing
const CANCELLED_MESSAGE: &str = "cancelled before completion";

/// Outcomes collected from the spawned step tasks.
///
/// Each task writes its own slot when it finishes; a slot left `None` means
/// the task was aborted by cancellation before it could complete.
#[derive(Default)]
struct StepOutcomes {
    geo: Option<Result<GeoRecord>>,
    bandwidth: Option<Result<BandwidthSample>>,
    port: Option<Result<PortResult>>,
}

/// Runs the three diagnostic probes and aggregates their outcomes
pub struct DiagnosticOrchestrator {
    geo: Arc<dyn GeoLookup>,
    bandwidth: Arc<dyn BandwidthProbe>,
    port: Arc<dyn PortProbe>,
    step_timeout: Duration,
    logger: Logger,
}

impl DiagnosticOrchestrator {
    /// Create an orchestrator over the three probe collaborators
    pub fn new(
        geo: Arc<dyn GeoLookup>,
        bandwidth: Arc<dyn BandwidthProbe>,
        port: Arc<dyn PortProbe>,
    ) -> Self {
        Self {
            geo,
            bandwidth,
            port,
            step_timeout: DEFAULT_STEP_TIMEOUT,
            logger: Logger::disabled(),
        }
    }

    /// Override the per-step timeout
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Attach a logger for step-level events
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Run a full diagnostic without external cancellation
    pub async fn run(&self, request: DiagnosticRequest) -> Result<DiagnosticReport> {
        // A channel whose sender lives for the whole call: never cancels
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.run_with_cancel(request, cancel_rx).await
    }

    /// Run a full diagnostic, returning early if `cancel` flips to `true`.
    ///
    /// On cancellation, outstanding probe tasks are aborted and the report
    /// carries whatever steps had already completed; the rest are recorded
    /// as cancelled step errors. The run itself only fails for an invalid
    /// request, before any probe is started.
    pub async fn run_with_cancel(
        &self,
        request: DiagnosticRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<DiagnosticReport> {
        let address = request.address.trim().to_string();
        if address.is_empty() {
            return Err(AppError::validation("address must not be empty"));
        }

        let run_id = Uuid::new_v4();
        let correlation = run_id.to_string();
        self.logger.debug(
            "orchestrator",
            Some(&correlation),
            &format!(
                "starting diagnostic run for {} (port: {:?})",
                address, request.port
            ),
        );

        let outcomes = Arc::new(Mutex::new(StepOutcomes::default()));

        // Spawn each applicable step as its own task so one slow or failing
        // probe never blocks the others
        let mut geo_handle = self.spawn_geo(&address, outcomes.clone());
        let mut bandwidth_handle = self.spawn_bandwidth(outcomes.clone());
        let mut port_handle = request
            .port
            .map(|port| self.spawn_port(&address, port, outcomes.clone()));

        let was_cancelled = tokio::select! {
            _ = async {
                let _ = (&mut geo_handle).await;
                let _ = (&mut bandwidth_handle).await;
                if let Some(handle) = port_handle.as_mut() {
                    let _ = handle.await;
                }
            } => false,
            _ = wait_for_cancel(&mut cancel) => true,
        };

        if was_cancelled {
            self.logger.warn(
                "orchestrator",
                Some(&correlation),
                "run cancelled, aborting outstanding probes",
            );
            geo_handle.abort();
            bandwidth_handle.abort();
            if let Some(handle) = port_handle.as_ref() {
                handle.abort();
            }
            // Await the aborted handles so the tasks are fully retired
            // before we harvest partial results
            let _ = geo_handle.await;
            let _ = bandwidth_handle.await;
            if let Some(handle) = port_handle {
                let _ = handle.await;
            }
        }

        let collected = {
            let mut slots = outcomes
                .lock()
                .map_err(|_| AppError::internal("step outcome lock poisoned"))?;
            std::mem::take(&mut *slots)
        };

        let report = self.assemble(run_id, &request, collected);
        self.logger.debug(
            "orchestrator",
            Some(&correlation),
            &format!(
                "run finished with {} step error(s)",
                report.errors.len()
            ),
        );
        Ok(report)
    }

    fn spawn_geo(&self, address: &str, outcomes: Arc<Mutex<StepOutcomes>>) -> JoinHandle<()> {
        let geo = self.geo.clone();
        let address = address.to_string();
        let timeout = self.step_timeout;
        tokio::spawn(async move {
            let outcome =
                with_step_timeout(timeout, ProbeStep::Geolocation, geo.lookup(&address)).await;
            if let Ok(mut slots) = outcomes.lock() {
                slots.geo = Some(outcome);
            }
        })
    }

    fn spawn_bandwidth(&self, outcomes: Arc<Mutex<StepOutcomes>>) -> JoinHandle<()> {
        let bandwidth = self.bandwidth.clone();
        let timeout = self.step_timeout;
        tokio::spawn(async move {
            let outcome =
                with_step_timeout(timeout, ProbeStep::Bandwidth, bandwidth.measure()).await;
            if let Ok(mut slots) = outcomes.lock() {
                slots.bandwidth = Some(outcome);
            }
        })
    }

    fn spawn_port(
        &self,
        address: &str,
        port: u16,
        outcomes: Arc<Mutex<StepOutcomes>>,
    ) -> JoinHandle<()> {
        let probe = self.port.clone();
        let address = address.to_string();
        let timeout = self.step_timeout;
        tokio::spawn(async move {
            let outcome =
                with_step_timeout(timeout, ProbeStep::PortCheck, probe.probe(&address, port))
                    .await;
            if let Ok(mut slots) = outcomes.lock() {
                slots.port = Some(outcome);
            }
        })
    }

    /// Build the aggregate report from the collected step outcomes.
    ///
    /// Step errors are recorded in a fixed order (geolocation, bandwidth,
    /// port) so repeated runs with deterministic collaborators produce
    /// identical reports.
    fn assemble(
        &self,
        run_id: Uuid,
        request: &DiagnosticRequest,
        outcomes: StepOutcomes,
    ) -> DiagnosticReport {
        let mut report = DiagnosticReport::new(run_id);

        match outcomes.geo {
            Some(Ok(record)) => report.geo = Some(record),
            Some(Err(e)) => report
                .errors
                .push(StepError::new(ProbeStep::Geolocation, e.to_string())),
            None => report
                .errors
                .push(StepError::new(ProbeStep::Geolocation, CANCELLED_MESSAGE)),
        }

        match outcomes.bandwidth {
            Some(Ok(sample)) => report.bandwidth = Some(sample),
            Some(Err(e)) => report
                .errors
                .push(StepError::new(ProbeStep::Bandwidth, e.to_string())),
            None => report
                .errors
                .push(StepError::new(ProbeStep::Bandwidth, CANCELLED_MESSAGE)),
        }

        if let Some(port) = request.port {
            match outcomes.port {
                // Open and Closed are both successful probe outcomes
                Some(Ok(result)) => report.port = Some(result),
                Some(Err(e)) => {
                    // The probe itself failed; surface that in the result
                    // state as well as the error list so callers can tell
                    // "measurement failed" apart from "port closed"
                    report.port = Some(PortResult::new(port, PortState::ProbeFailed));
                    report
                        .errors
                        .push(StepError::new(ProbeStep::PortCheck, e.to_string()));
                }
                None => report
                    .errors
                    .push(StepError::new(ProbeStep::PortCheck, CANCELLED_MESSAGE)),
            }
        }

        report
    }
}

/// Wrap a probe future in the orchestrator-level step timeout
async fn with_step_timeout<T, F>(limit: Duration, step: ProbeStep, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::timeout(format!(
            "{} step exceeded {:?}",
            step, limit
        ))),
    }
}

/// Resolve once the cancel signal flips to `true` (or its sender is dropped)
async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender dropped without cancelling: wait forever so the
            // join arm of the select wins
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AddressClassification, BandwidthTier, GeoRecord, UNKNOWN_HOSTNAME};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    /// Geo mock with a scripted outcome and a call counter
    struct MockGeo {
        bogon: bool,
        fail: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockGeo {
        fn ok(bogon: bool) -> Self {
            Self {
                bogon,
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                bogon: false,
                fail: true,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                bogon: false,
                fail: false,
                delay,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GeoLookup for MockGeo {
        async fn lookup(&self, address: &str) -> Result<GeoRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AppError::lookup("mock lookup failure"));
            }
            Ok(GeoRecord {
                address: address.to_string(),
                city: "Test City".to_string(),
                region: "Test Region".to_string(),
                country: "TC".to_string(),
                organization: "Test Org".to_string(),
                hostname: UNKNOWN_HOSTNAME.to_string(),
                classification: AddressClassification::from_bogon(self.bogon),
            })
        }
    }

    /// Bandwidth mock returning a fixed Mbps figure
    struct MockBandwidth {
        mbps: f64,
        fail: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockBandwidth {
        fn ok(mbps: f64) -> Self {
            Self {
                mbps,
                fail: false,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(mbps: f64, delay: Duration) -> Self {
            Self {
                mbps,
                fail: false,
                delay,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BandwidthProbe for MockBandwidth {
        async fn measure(&self) -> Result<BandwidthSample> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(AppError::probe("mock probe failure"));
            }
            Ok(BandwidthSample::new(self.mbps))
        }
    }

    /// Port mock with a scripted state
    struct MockPort {
        state: Option<PortState>, // None means the probe errors out
        calls: AtomicUsize,
    }

    impl MockPort {
        fn ok(state: PortState) -> Self {
            Self {
                state: Some(state),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                state: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PortProbe for MockPort {
        async fn probe(&self, _address: &str, port: u16) -> Result<PortResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.state {
                Some(state) => Ok(PortResult::new(port, state)),
                None => Err(AppError::timeout("mock transport failure")),
            }
        }
    }

    fn orchestrator(
        geo: Arc<MockGeo>,
        bandwidth: Arc<MockBandwidth>,
        port: Arc<MockPort>,
    ) -> DiagnosticOrchestrator {
        DiagnosticOrchestrator::new(geo, bandwidth, port)
    }

    #[tokio::test]
    async fn test_empty_address_fails_before_any_probe_runs() {
        let geo = Arc::new(MockGeo::ok(false));
        let bandwidth = Arc::new(MockBandwidth::ok(50.0));
        let port = Arc::new(MockPort::ok(PortState::Open));
        let orch = orchestrator(geo.clone(), bandwidth.clone(), port.clone());

        let result = orch.run(DiagnosticRequest::new("")).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));

        let result = orch.run(DiagnosticRequest::new("   ")).await;
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));

        assert_eq!(geo.call_count(), 0);
        assert_eq!(bandwidth.call_count(), 0);
        assert_eq!(port.call_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_run_without_port() {
        let geo = Arc::new(MockGeo::ok(false));
        let bandwidth = Arc::new(MockBandwidth::ok(50.0));
        let port = Arc::new(MockPort::ok(PortState::Open));
        let orch = orchestrator(geo, bandwidth, port.clone());

        let report = orch.run(DiagnosticRequest::new("8.8.8.8")).await.unwrap();

        let geo_record = report.geo.unwrap();
        assert_eq!(
            geo_record.classification,
            AddressClassification::PotentiallyDynamicPublic
        );
        let sample = report.bandwidth.unwrap();
        assert_eq!(sample.tier, BandwidthTier::Moderate);
        assert!(report.port.is_none());
        assert!(report.errors.is_empty());
        // Port probe must be skipped entirely, not run-and-ignored
        assert_eq!(port.call_count(), 0);
    }

    #[tokio::test]
    async fn test_geo_failure_does_not_suppress_bandwidth() {
        let geo = Arc::new(MockGeo::failing());
        let bandwidth = Arc::new(MockBandwidth::ok(90.0));
        let port = Arc::new(MockPort::ok(PortState::Open));
        let orch = orchestrator(geo, bandwidth, port);

        let report = orch.run(DiagnosticRequest::new("8.8.8.8")).await.unwrap();

        assert!(report.geo.is_none());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].step, ProbeStep::Geolocation);
        let sample = report.bandwidth.unwrap();
        assert_eq!(sample.tier, BandwidthTier::Good);
    }

    #[tokio::test]
    async fn test_closed_port_is_not_an_error() {
        let geo = Arc::new(MockGeo::ok(true));
        let bandwidth = Arc::new(MockBandwidth::ok(10.0));
        let port = Arc::new(MockPort::ok(PortState::Closed));
        let orch = orchestrator(geo, bandwidth, port);

        let report = orch
            .run(DiagnosticRequest::with_port("10.0.0.5", 8080))
            .await
            .unwrap();

        let port_result = report.port.unwrap();
        assert_eq!(port_result.state, PortState::Closed);
        assert_eq!(port_result.port, 8080);
        assert!(report.errors.is_empty());
        assert_eq!(
            report.geo.unwrap().classification,
            AddressClassification::NonRoutable
        );
    }

    #[tokio::test]
    async fn test_port_probe_failure_is_recorded_both_ways() {
        let geo = Arc::new(MockGeo::ok(false));
        let bandwidth = Arc::new(MockBandwidth::ok(30.0));
        let port = Arc::new(MockPort::failing());
        let orch = orchestrator(geo, bandwidth, port);

        let report = orch
            .run(DiagnosticRequest::with_port("8.8.8.8", 443))
            .await
            .unwrap();

        assert_eq!(report.port.unwrap().state, PortState::ProbeFailed);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].step, ProbeStep::PortCheck);
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let delay = Duration::from_millis(150);
        let geo = Arc::new(MockGeo::slow(delay));
        let bandwidth = Arc::new(MockBandwidth::slow(40.0, delay));
        let port = Arc::new(MockPort::ok(PortState::Open));
        let orch = orchestrator(geo, bandwidth, port);

        let started = Instant::now();
        let report = orch.run(DiagnosticRequest::new("8.8.8.8")).await.unwrap();
        let elapsed = started.elapsed();

        assert!(report.geo.is_some());
        assert!(report.bandwidth.is_some());
        // Sequential execution would take at least 2x the delay
        assert!(
            elapsed < delay * 2,
            "probes appear to have run sequentially: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_step_timeout_converts_to_step_error() {
        let geo = Arc::new(MockGeo::slow(Duration::from_secs(5)));
        let bandwidth = Arc::new(MockBandwidth::ok(50.0));
        let port = Arc::new(MockPort::ok(PortState::Open));
        let orch = orchestrator(geo, bandwidth, port)
            .with_step_timeout(Duration::from_millis(50));

        let report = orch.run(DiagnosticRequest::new("8.8.8.8")).await.unwrap();

        assert!(report.geo.is_none());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].step, ProbeStep::Geolocation);
        assert!(report.errors[0].message.contains("exceeded"));
        // The slow step must not block the fast one
        assert!(report.bandwidth.is_some());
    }

    #[tokio::test]
    async fn test_cancellation_returns_promptly_with_partial_results() {
        let geo = Arc::new(MockGeo::ok(false));
        let bandwidth = Arc::new(MockBandwidth::slow(50.0, Duration::from_secs(30)));
        let port = Arc::new(MockPort::ok(PortState::Open));
        let orch = orchestrator(geo, bandwidth, port);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = cancel_tx.send(true);
        });

        let started = Instant::now();
        let report = orch
            .run_with_cancel(DiagnosticRequest::new("8.8.8.8"), cancel_rx)
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(
            elapsed < Duration::from_secs(2),
            "cancelled run did not return promptly: {:?}",
            elapsed
        );
        // The fast step completed before cancellation
        assert!(report.geo.is_some());
        // The slow step was aborted and recorded as cancelled
        assert!(report.bandwidth.is_none());
        assert!(report
            .errors
            .iter()
            .any(|e| e.step == ProbeStep::Bandwidth && e.message.contains("cancelled")));
    }

    #[tokio::test]
    async fn test_deterministic_given_deterministic_mocks() {
        let orch = orchestrator(
            Arc::new(MockGeo::ok(false)),
            Arc::new(MockBandwidth::ok(50.0)),
            Arc::new(MockPort::ok(PortState::Closed)),
        );

        let first = orch
            .run(DiagnosticRequest::with_port("8.8.8.8", 22))
            .await
            .unwrap();
        let second = orch
            .run(DiagnosticRequest::with_port("8.8.8.8", 22))
            .await
            .unwrap();

        // run_id and timestamps differ per run; the measured content must not
        assert_eq!(first.geo, second.geo);
        assert_eq!(
            first.bandwidth.as_ref().unwrap().mbps,
            second.bandwidth.as_ref().unwrap().mbps
        );
        assert_eq!(first.port, second.port);
        assert_eq!(first.errors, second.errors);
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_not_interfere() {
        let orch = Arc::new(orchestrator(
            Arc::new(MockGeo::ok(false)),
            Arc::new(MockBandwidth::ok(50.0)),
            Arc::new(MockPort::ok(PortState::Open)),
        ));

        let a = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run(DiagnosticRequest::with_port("1.1.1.1", 53)).await })
        };
        let b = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run(DiagnosticRequest::new("8.8.8.8")).await })
        };

        let report_a = a.await.unwrap().unwrap();
        let report_b = b.await.unwrap().unwrap();

        assert_eq!(report_a.geo.as_ref().unwrap().address, "1.1.1.1");
        assert_eq!(report_a.port.unwrap().port, 53);
        assert_eq!(report_b.geo.as_ref().unwrap().address, "8.8.8.8");
        assert!(report_b.port.is_none());
        assert_ne!(report_a.run_id, report_b.run_id);
    }
}
