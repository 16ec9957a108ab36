//! services/client/src/flows/mod.rs
//!
//! The client's components. Each flow owns its collaborators as trait objects
//! and reports to the user through the `View` port.

pub mod enrichment;
pub mod identity;
pub mod launch;
pub mod recorder;
pub mod resources;
pub mod tutor;
pub mod view;

pub use enrichment::EnrichmentProxies;
pub use identity::IdentityGateway;
pub use launch::{apply_launch_url, EXTERNAL_LOGIN_COMPLETED};
pub use recorder::StudyRecorder;
pub use resources::ResourceManager;
pub use tutor::Tutor;
