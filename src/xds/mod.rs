//! Discovery layer fed by the deployment index
//!
//! Holds the process-wide deployment index, the snapshot version observed by
//! discovery subscribers, and the projection of accepted API projects into
//! the resource schema the discovery transport serves to gateway nodes. The
//! transport itself (the streaming protocol and its snapshot cache) lives
//! with the embedding service; it consumes this module through
//! [`XdsState::subscribe_updates`] and
//! [`DeploymentIndex::snapshot_for_environment`].

pub mod index;
pub mod resources;
mod state;

pub use index::DeploymentIndex;
pub use state::XdsState;
