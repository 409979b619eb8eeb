pub mod save_sink;
pub mod session_store;

pub use save_sink::{DirectorySink, SaveSink};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
