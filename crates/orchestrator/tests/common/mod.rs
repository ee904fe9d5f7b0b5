//! Test doubles shared by the orchestrator integration suites.
#![allow(dead_code)]

use std::collections::HashSet;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cluster::{
    ClusterClient, ClusterError, Manifest, ResourceRef, ResourceState, ResourceStatus,
};
use edge::{DnsProvider, DnsRecord, IngressDevice, PortForward};
use events::RunOutcome;
use orchestrator::{
    Phase, PhaseContext, PhaseError, PhaseRegistry, PhaseResult, Step, StepReporter,
};
use platform_core::ProvisionInputs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Begin(String),
    Complete,
    Fail(String),
    Finish(RunOutcome),
}

#[derive(Default)]
pub struct RecordingReporter {
    calls: Mutex<Vec<Call>>,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn begun(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Begin(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.calls().into_iter().find_map(|c| match c {
            Call::Finish(outcome) => Some(outcome),
            _ => None,
        })
    }

    /// Every begin is followed by exactly one complete or fail before the
    /// next begin, and the run ends with nothing left open.
    pub fn assert_alternation(&self) {
        let mut open = false;
        for call in self.calls() {
            match call {
                Call::Begin(name) => {
                    assert!(!open, "step {name} began while another was open");
                    open = true;
                }
                Call::Complete | Call::Fail(_) => {
                    assert!(open, "step resolved without being begun");
                    open = false;
                }
                Call::Finish(_) => assert!(!open, "run finished with a step open"),
            }
        }
        assert!(!open, "last step never resolved");
    }
}

impl StepReporter for RecordingReporter {
    fn begin_step(&self, step: &Step) {
        self.calls.lock().unwrap().push(Call::Begin(step.name.clone()));
    }

    fn complete_step(&self) {
        self.calls.lock().unwrap().push(Call::Complete);
    }

    fn fail_step(&self, error: &(dyn Error + 'static)) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Fail(error.to_string()));
    }

    fn finish_run(&self, outcome: &RunOutcome) {
        self.calls.lock().unwrap().push(Call::Finish(outcome.clone()));
    }
}

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    /// Never returns on its own
    Hang,
}

pub struct ScriptedPhase {
    name: String,
    checkpoint: Option<String>,
    behavior: Behavior,
    timeout: Duration,
    pub invocations: Arc<AtomicUsize>,
}

impl ScriptedPhase {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            checkpoint: None,
            behavior,
            timeout: Duration::from_secs(60),
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn checkpoint(mut self, alias: &str) -> Self {
        self.checkpoint = Some(alias.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.invocations.clone()
    }
}

#[async_trait]
impl Phase for ScriptedPhase {
    fn name(&self) -> &str {
        &self.name
    }

    fn checkpoint(&self) -> Option<&str> {
        self.checkpoint.as_deref()
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn run(&self, _ctx: &PhaseContext<'_>) -> PhaseResult {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(reason) => Err(PhaseError::Failed(reason.clone())),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// Management phase names with scripted behavior, plus their counters.
pub fn scripted_management(
    failing: Option<&str>,
) -> (PhaseRegistry, Vec<(String, Arc<AtomicUsize>)>) {
    let layout = [
        ("validate", None),
        ("create-cluster", None),
        ("install-argocd", Some("argocd")),
        ("configure-ingress", Some("ingress")),
        ("provision-vclusters", Some("vcluster")),
        ("install-vault", Some("vault")),
        ("install-catalog-apps", None),
    ];

    let mut builder = PhaseRegistry::builder();
    let mut counters = Vec::new();
    for (name, checkpoint) in layout {
        let behavior = if failing == Some(name) {
            Behavior::Fail(format!("{name} exploded"))
        } else {
            Behavior::Succeed
        };
        let mut phase = ScriptedPhase::new(name, behavior);
        if let Some(alias) = checkpoint {
            phase = phase.checkpoint(alias);
        }
        counters.push((name.to_string(), phase.counter()));
        builder = builder.phase(phase);
    }
    (builder.build().unwrap(), counters)
}

pub fn invocations(counters: &[(String, Arc<AtomicUsize>)], name: &str) -> usize {
    counters
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, c)| c.load(Ordering::SeqCst))
        .unwrap()
}

/// A cluster where everything asked about already exists and is healthy.
pub struct FakeCluster {
    pub calls: AtomicUsize,
    pub applied: Mutex<Vec<Manifest>>,
    missing: HashSet<String>,
    lb_address: Ipv4Addr,
}

impl FakeCluster {
    pub fn healthy() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            applied: Mutex::new(Vec::new()),
            missing: HashSet::new(),
            lb_address: Ipv4Addr::new(10, 0, 12, 1),
        }
    }

    /// Report the named resource as absent.
    pub fn without(mut self, name: &str) -> Self {
        self.missing.insert(name.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Names of applied manifests, in order
    pub fn applied(&self) -> Vec<String> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    pub fn manifest(&self, name: &str) -> Option<Manifest> {
        self.applied
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.name == name)
            .cloned()
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn apply_manifest(&self, manifest: &Manifest) -> cluster::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.applied.lock().unwrap().push(manifest.clone());
        Ok(())
    }

    async fn get_resource_status(
        &self,
        resource: &ResourceRef,
    ) -> cluster::Result<ResourceStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing.contains(&resource.name) {
            return Ok(ResourceStatus::Missing);
        }

        let mut state = ResourceState::default();
        state
            .conditions
            .insert("Available".to_string(), "True".to_string());
        state.health = Some("Healthy".to_string());
        state.sync = Some("Synced".to_string());
        state.load_balancer_ip = Some(self.lb_address.into());
        Ok(ResourceStatus::Present(state))
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(10)
    }
}

/// A cluster whose API never answers successfully.
pub struct UnreachableCluster;

#[async_trait]
impl ClusterClient for UnreachableCluster {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn apply_manifest(&self, _manifest: &Manifest) -> cluster::Result<()> {
        Err(ClusterError::CommandFailed("connection refused".to_string()))
    }

    async fn get_resource_status(
        &self,
        _resource: &ResourceRef,
    ) -> cluster::Result<ResourceStatus> {
        Err(ClusterError::CommandFailed("connection refused".to_string()))
    }
}

#[derive(Default)]
pub struct FakeDns {
    pub records: Mutex<Vec<(String, String, Ipv4Addr)>>,
}

#[async_trait]
impl DnsProvider for FakeDns {
    fn name(&self) -> &'static str {
        "fake-dns"
    }

    async fn upsert_a_record(
        &self,
        zone: &str,
        record: &str,
        address: Ipv4Addr,
    ) -> edge::Result<DnsRecord> {
        self.records
            .lock()
            .unwrap()
            .push((zone.to_string(), record.to_string(), address));
        Ok(DnsRecord {
            id: format!("rec-{record}"),
            name: record.to_string(),
            content: address.to_string(),
            proxied: false,
        })
    }
}

pub struct FakeRouter {
    pub wan: Ipv4Addr,
    pub forwards: Mutex<Vec<PortForward>>,
}

impl FakeRouter {
    pub fn new(wan: Ipv4Addr) -> Self {
        Self {
            wan,
            forwards: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl IngressDevice for FakeRouter {
    fn name(&self) -> &'static str {
        "fake-router"
    }

    async fn wan_address(&self) -> edge::Result<Ipv4Addr> {
        Ok(self.wan)
    }

    async fn ensure_port_forward(&self, rule: &PortForward) -> edge::Result<()> {
        self.forwards.lock().unwrap().push(rule.clone());
        Ok(())
    }
}

pub fn inputs() -> ProvisionInputs {
    ProvisionInputs {
        alerts_email: "ops@example.com".to_string(),
        domain_name: "example.com".to_string(),
        github_org: Some("acme".to_string()),
        ..ProvisionInputs::default()
    }
}
