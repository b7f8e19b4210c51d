// src/store/mod.rs

pub mod mint;
pub mod nonce;
pub mod roster;
pub mod session;

pub use mint::MintQueue;
pub use nonce::NonceStore;
pub use roster::RosterStore;
pub use session::SessionTracker;
