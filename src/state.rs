// src/state.rs

use axum::extract::FromRef;

use crate::chain::Contracts;
use crate::clients::{FaceClient, IpfsClient};
use crate::config::Config;
use crate::store::{MintQueue, NonceStore, RosterStore, SessionTracker};

/// Process-wide state, constructed once at startup and cloned into handlers.
/// All stores are explicit instances here; nothing module-level.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub nonces: NonceStore,
    pub sessions: SessionTracker,
    pub mints: MintQueue,
    pub roster: RosterStore,
    pub contracts: Contracts,
    pub face: FaceClient,
    pub ipfs: IpfsClient,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for NonceStore {
    fn from_ref(state: &AppState) -> Self {
        state.nonces.clone()
    }
}

impl FromRef<AppState> for SessionTracker {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for MintQueue {
    fn from_ref(state: &AppState) -> Self {
        state.mints.clone()
    }
}

impl FromRef<AppState> for RosterStore {
    fn from_ref(state: &AppState) -> Self {
        state.roster.clone()
    }
}

impl FromRef<AppState> for Contracts {
    fn from_ref(state: &AppState) -> Self {
        state.contracts.clone()
    }
}

impl FromRef<AppState> for FaceClient {
    fn from_ref(state: &AppState) -> Self {
        state.face.clone()
    }
}

impl FromRef<AppState> for IpfsClient {
    fn from_ref(state: &AppState) -> Self {
        state.ipfs.clone()
    }
}
