//! Test helpers for gmp-player integration tests
//!
//! Provides scriptable collaborator fakes:
//! - ScriptedResolver: deterministic titles, failing and blocking queries
//! - FakeTransport: records starts, completes only when told to
//! - RecordingSurface: records renders, replays scripted outcomes
//! - FakeAudience: settable listener count (or unknown)

#![allow(dead_code)]

use async_trait::async_trait;
use gmp_player::collaborators::{
    AudienceSource, CompletionSignal, ConnectionInfo, RenderOutcome, Resolver,
    SessionCollaborators, Transport, UiSurface,
};
use gmp_player::config::PlayerConfig;
use gmp_player::manager::SessionFactory;
use gmp_player::session::{PlaybackSession, SessionStatus};
use gmp_player::track::{ResolvedStream, StreamHandle};
use gmp_player::{Error, Result};
use gmp_common::TenantId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Poll `condition` until it holds; panics after 10s (virtual or real)
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let polled = tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {}", what);
}

// ============================================================================
// Resolver
// ============================================================================

#[derive(Default)]
pub struct ScriptedResolver {
    failing: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, query: &str) {
        self.failing.lock().unwrap().insert(query.to_string());
    }

    /// Hold resolution of `query` until the returned notify fires
    pub fn block(&self, query: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(query.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn title_for(query: &str) -> String {
    format!("Title {}", query)
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedStream> {
        self.calls.lock().unwrap().push(query.to_string());

        let gate = self.gates.lock().unwrap().get(query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing.lock().unwrap().contains(query) {
            return Err(Error::Resolution(format!("no results for {}", query)));
        }

        Ok(ResolvedStream {
            title: title_for(query),
            artist: Some("Test Artist".to_string()),
            url: None,
            duration: Some(180),
            stream: StreamHandle(query.to_string()),
            thumbnail: None,
        })
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Default)]
struct TransportState {
    connected: bool,
    started: Vec<String>,
    pending: Option<CompletionSignal>,
    playing: bool,
    paused: bool,
    volume: f32,
    stops: usize,
    disconnects: usize,
    refuse_start: bool,
}

pub struct FakeTransport {
    state: Mutex<TransportState>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(TransportState {
                connected: true,
                ..Default::default()
            }),
        })
    }

    /// Streams started so far, in order
    pub fn started(&self) -> Vec<String> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn started_count(&self) -> usize {
        self.state.lock().unwrap().started.len()
    }

    pub fn last_started(&self) -> Option<String> {
        self.state.lock().unwrap().started.last().cloned()
    }

    /// Natural end of the current stream
    pub fn finish(&self) {
        self.complete(None);
    }

    /// Runtime failure of the current stream
    pub fn fail_current(&self, error: &str) {
        self.complete(Some(error.to_string()));
    }

    fn complete(&self, error: Option<String>) {
        let signal = {
            let mut state = self.state.lock().unwrap();
            state.playing = false;
            state.paused = false;
            state.pending.take()
        };
        if let Some(signal) = signal {
            signal.complete(error);
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().unwrap().connected = connected;
    }

    pub fn refuse_start(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_start = refuse;
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().unwrap().volume
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn start(
        &self,
        stream: &StreamHandle,
        volume: f32,
        on_complete: CompletionSignal,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.connected || state.refuse_start {
            return Err(Error::Transport("cannot start".to_string()));
        }
        state.started.push(stream.0.clone());
        state.pending = Some(on_complete);
        state.playing = true;
        state.paused = false;
        state.volume = volume;
        Ok(())
    }

    fn stop(&self) {
        self.state.lock().unwrap().stops += 1;
        self.complete(None);
    }

    fn pause(&self) {
        self.state.lock().unwrap().paused = true;
    }

    fn resume(&self) {
        self.state.lock().unwrap().paused = false;
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn is_playing(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.playing && !state.paused
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn connection_info(&self) -> Option<ConnectionInfo> {
        let state = self.state.lock().unwrap();
        state.connected.then(|| ConnectionInfo {
            guild: Some("Test Guild".to_string()),
            channel: Some("Test Channel".to_string()),
        })
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.disconnects += 1;
        Ok(())
    }
}

// ============================================================================
// Surface and audience
// ============================================================================

#[derive(Default)]
pub struct RecordingSurface {
    script: Mutex<VecDeque<RenderOutcome>>,
    renders: Mutex<Vec<SessionStatus>>,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Outcomes returned by the next renders, before falling back to Edited
    pub fn script(&self, outcomes: &[RenderOutcome]) {
        self.script.lock().unwrap().extend(outcomes.iter().copied());
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }

    pub fn last_render(&self) -> Option<SessionStatus> {
        self.renders.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl UiSurface for RecordingSurface {
    async fn render(&self, status: &SessionStatus) -> RenderOutcome {
        self.renders.lock().unwrap().push(status.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RenderOutcome::Edited)
    }
}

pub struct FakeAudience {
    participants: Mutex<Option<usize>>,
}

impl FakeAudience {
    pub fn new(participants: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            participants: Mutex::new(participants),
        })
    }

    pub fn set(&self, participants: Option<usize>) {
        *self.participants.lock().unwrap() = participants;
    }
}

impl AudienceSource for FakeAudience {
    fn current_participants(&self, _channel: &ConnectionInfo) -> Option<usize> {
        *self.participants.lock().unwrap()
    }
}

// ============================================================================
// Session fixtures
// ============================================================================

pub struct Fixture {
    pub session: Arc<PlaybackSession>,
    pub resolver: Arc<ScriptedResolver>,
    pub transport: Arc<FakeTransport>,
    pub audience: Arc<FakeAudience>,
}

pub fn test_config() -> PlayerConfig {
    PlayerConfig::default()
}

pub fn fixture() -> Fixture {
    fixture_with(test_config())
}

pub fn fixture_with(config: PlayerConfig) -> Fixture {
    let resolver = ScriptedResolver::new();
    let transport = FakeTransport::new();
    let audience = FakeAudience::new(Some(1));
    let session = PlaybackSession::new(
        1,
        config,
        SessionCollaborators {
            resolver: resolver.clone(),
            transport: transport.clone(),
            audience: audience.clone(),
        },
    );

    Fixture {
        session,
        resolver,
        transport,
        audience,
    }
}

/// Factory handing out fake transports and remembering them per tenant
#[derive(Default)]
pub struct FakeFactory {
    pub resolver: Arc<ScriptedResolver>,
    transports: Mutex<HashMap<TenantId, Arc<FakeTransport>>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn transport(&self, tenant: TenantId) -> Option<Arc<FakeTransport>> {
        self.transports.lock().unwrap().get(&tenant).cloned()
    }
}

impl SessionFactory for FakeFactory {
    fn collaborators(&self, tenant: TenantId) -> SessionCollaborators {
        let transport = FakeTransport::new();
        self.transports
            .lock()
            .unwrap()
            .insert(tenant, transport.clone());
        SessionCollaborators {
            resolver: self.resolver.clone(),
            transport,
            audience: FakeAudience::new(Some(1)),
        }
    }
}
