pub mod backend;
pub mod direct_llm;
pub mod firebase;
pub mod memory;
pub mod recording_view;
pub mod session_file;
pub mod terminal_view;

pub use backend::{BackendClient, BackendTutor};
pub use direct_llm::DirectChatTutor;
pub use firebase::{FirebaseAuth, FirebaseStorage, Firestore};
pub use memory::{DbOp, MemoryAuth, MemoryBlobStorage, MemoryDatabase, MemorySessionStore};
pub use recording_view::{RecordingView, ViewEvent};
pub use session_file::FileSessionStore;
pub use terminal_view::TerminalView;

use crybaby_core::{AuthStateStream, AuthUser};
use tokio::sync::watch;

/// Turns an auth-state watch channel into the stream the `AuthProvider` port hands out:
/// the current value first, then one item per change, ending when the sender is dropped.
pub(crate) fn auth_state_stream(rx: watch::Receiver<Option<AuthUser>>) -> AuthStateStream {
    Box::pin(futures::stream::unfold(
        (rx, true),
        |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let current = rx.borrow_and_update().clone();
            Some((current, (rx, false)))
        },
    ))
}
