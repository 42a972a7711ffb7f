pub mod channels;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::{Mutex, MutexGuard, Notify};
use tracing::info;

use crate::{
    config::AppConfig,
    dao::record_store::RecordStore,
    error::ServiceError,
    platform::{BotUser, ChatPlatform},
};

pub use self::channels::ChannelRegistry;

pub type SharedState = Arc<AppState>;

/// Proof that the caller is the only command currently mutating the list.
pub type MutationGuard<'a> = MutexGuard<'a, ()>;

/// Central application state shared by the ingress routes and command tasks.
pub struct AppState {
    config: AppConfig,
    platform: Arc<dyn ChatPlatform>,
    bot_user: BotUser,
    store: RecordStore,
    channels: ChannelRegistry,
    mutation_gate: Mutex<()>,
    shutdown: Notify,
    shutting_down: AtomicBool,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, platform: Arc<dyn ChatPlatform>, bot_user: BotUser) -> SharedState {
        let store = RecordStore::new(config.database_path.clone());
        Arc::new(Self {
            config,
            platform,
            bot_user,
            store,
            channels: ChannelRegistry::new(),
            mutation_gate: Mutex::new(()),
            shutdown: Notify::new(),
            shutting_down: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Chat platform every remote effect goes through.
    pub fn platform(&self) -> &dyn ChatPlatform {
        self.platform.as_ref()
    }

    /// Account the bot is logged in as; messages by anyone else are foreign.
    pub fn bot_user(&self) -> &BotUser {
        &self.bot_user
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Claim exclusive access for a load → mutate → reconcile → save span.
    ///
    /// Never waits: when another mutating command is in flight the caller is
    /// rejected with [`ServiceError::Busy`].
    pub fn try_begin_mutation(&self) -> Result<MutationGuard<'_>, ServiceError> {
        self.mutation_gate
            .try_lock()
            .map_err(|_| ServiceError::Busy)
    }

    /// Ask the process to stop serving once in-flight work has been handed off.
    pub fn request_shutdown(&self) {
        info!("shutdown requested");
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Wait until no mutating command holds the store.
    pub async fn wait_for_idle(&self) {
        let _idle = self.mutation_gate.lock().await;
    }

    /// Resolve once [`AppState::request_shutdown`] has been called.
    pub async fn shutdown_requested(&self) {
        let notified = self.shutdown.notified();
        if self.is_shutting_down() {
            return;
        }
        notified.await;
    }
}
