//! Import sessions and record writing.
//!
//! - [`ImportSession`]: detects earlier persisted runs of a source and gates
//!   writes behind an explicit [`Decision`]
//! - [`ImportWriter`]: previews or persists a mapped dataset through a
//!   [`Sink`](sink::Sink)
//! - [`store`]: ledger and flag stores backing sessions
//! - [`ImportProfile`]: JSON description of an import

mod error;
mod io;
mod profile;
mod session;
pub mod sink;
pub mod store;
pub mod text;
mod writer;

pub use error::{ImportError, Result, SinkError, StoreError};
pub use io::compute_file_hash;
pub use profile::ImportProfile;
pub use session::{
    Decision, ImportSession, ParseDecisionError, SESSION_KEY_PREFIX, SessionState, SessionStatus,
    session_key, slug,
};
pub use writer::{ImportWriter, RecordPreview, WriteMode, WriteReport};
