//! nfod: an ephemeral viewer for scene info files.
//!
//! Clients upload a base64 `.nfo` plus optional `.sfv` sidecars. Each payload
//! is rasterized with the CP437 bitmap font, stored under a random id, and
//! served back as a viewer page, PNG and (optionally) the raw bytes until the
//! retention window closes and the whole group is evicted.

pub mod auth;
pub mod eviction;
pub mod groups;
pub mod index;
pub mod pages;
pub mod telemetry;
pub mod tls;
pub mod web;

pub use auth::TokenSet;
pub use eviction::{EvictionReport, EvictionScheduler, EvictionTicket};
pub use groups::{GroupError, GroupService, GroupView, NewGroup, NewSidecar};
pub use index::SidecarIndex;
pub use pages::Pages;
pub use web::{router, WebState};
