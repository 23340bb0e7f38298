//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use apinav_core::config::SyncConfig;
use apinav_core::result::AppResult;
use apinav_core::traits::state::StateBackend;
use apinav_core::types::generator::SequentialGenerator;
use apinav_core::types::id::{CollectionId, SurfaceId};
use apinav_entity::{Collection, Snapshot};
use apinav_realtime::{
    InboundMessage, OutboundMessage, SurfaceController, SurfaceKind, SurfaceModel, SyncEngine,
};
use apinav_service::{CollectionService, Mutation, TreeMutator};
use apinav_storage::CollectionStore;
use apinav_storage::providers::MemoryStateBackend;

/// Durable key used by every test host.
pub const STATE_KEY: &str = "apiSidebar.collections";

/// Host-side wiring over an arbitrary backend.
pub struct TestHost {
    /// The sync engine under test
    pub engine: Arc<SyncEngine>,
    /// The store behind it, for direct inspection
    pub store: Arc<CollectionStore>,
}

impl TestHost {
    /// Host over an in-memory backend seeded with collection `c1` named `Demo`.
    pub async fn new() -> Self {
        let host = Self::with_backend(Arc::new(MemoryStateBackend::new()), SyncConfig::default());
        host.seed(vec![Collection::new(CollectionId::new("c1"), "Demo")])
            .await;
        host
    }

    /// Host over `backend` with node ids `n-1`, `n-2`, ….
    pub fn with_backend(backend: Arc<dyn StateBackend>, sync: SyncConfig) -> Self {
        let store = Arc::new(CollectionStore::new(backend, STATE_KEY));
        let mutator = TreeMutator::new(Arc::new(SequentialGenerator::new("n")));
        let service = Arc::new(CollectionService::new(store.clone(), mutator, &sync));
        Self {
            engine: Arc::new(SyncEngine::new(service, sync)),
            store,
        }
    }

    /// Replace the stored snapshot.
    pub async fn seed(&self, collections: Vec<Collection>) {
        self.store
            .overwrite(&Snapshot::new(collections))
            .await
            .expect("seed snapshot");
    }

    /// Current stored snapshot.
    pub async fn stored(&self) -> Snapshot {
        self.store.load().await.expect("load snapshot").value
    }

    /// Register a surface without signalling readiness.
    pub async fn open(&self, name: &str, kind: SurfaceKind) -> TestSurface {
        let id = SurfaceId::new(name);
        let (_, rx) = self.engine.register(id.clone(), kind).await;
        let model = SurfaceModel::new(kind, Arc::new(SequentialGenerator::new(format!("{name}-local"))));
        TestSurface {
            id,
            rx,
            model,
            engine: self.engine.clone(),
        }
    }

    /// Register a surface and complete its handshake.
    pub async fn open_ready(&self, name: &str, kind: SurfaceKind) -> TestSurface {
        let mut surface = self.open(name, kind).await;
        surface.ready().await;
        surface
    }
}

/// A registered surface driven through its [`SurfaceModel`].
pub struct TestSurface {
    /// Surface id
    pub id: SurfaceId,
    /// Outbound messages addressed to this surface
    pub rx: mpsc::Receiver<OutboundMessage>,
    /// Surface-side state
    pub model: SurfaceModel,
    engine: Arc<SyncEngine>,
}

impl TestSurface {
    /// Send one frame as raw JSON, the way a real surface would.
    pub async fn send(&self, msg: &InboundMessage) {
        let raw = serde_json::to_string(msg).expect("encode frame");
        self.engine
            .handle_inbound(&self.id, &raw)
            .await
            .expect("handle frame");
    }

    /// Signal readiness and absorb the flush.
    pub async fn ready(&mut self) -> Vec<OutboundMessage> {
        let frame = self.model.ready();
        self.send(&frame).await;
        self.pump()
    }

    /// Issue a mutation through the model and absorb the replies.
    pub async fn issue(&mut self, mutation: Mutation) -> Vec<OutboundMessage> {
        let frame = self.model.issue(mutation);
        self.send(&frame).await;
        self.pump()
    }

    /// Render a mutation locally and return the frame without sending it.
    pub fn model_issue(&mut self, mutation: Mutation) -> InboundMessage {
        self.model.issue(mutation)
    }

    /// Feed every queued message into the model and return them.
    pub fn pump(&mut self) -> Vec<OutboundMessage> {
        let mut received = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            self.model.on_message(&msg);
            received.push(msg);
        }
        received
    }
}

/// Delays reads so concurrent mutations both load before either saves.
#[derive(Debug, Default)]
pub struct SlowReads {
    inner: MemoryStateBackend,
}

#[async_trait]
impl StateBackend for SlowReads {
    fn provider_type(&self) -> &str {
        "slow"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.write(key, value).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.inner.remove(key).await
    }
}

/// Commands of a batch of messages, for order assertions.
pub fn commands(messages: &[OutboundMessage]) -> Vec<&'static str> {
    messages.iter().map(OutboundMessage::command).collect()
}
