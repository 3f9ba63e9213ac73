pub mod config;
pub mod error;
pub mod ingest;
pub mod markup;
pub mod placeholder;
pub mod types;

pub use config::{ProjectState, STATE_FILE, apply_state, load_state, save_state, state_from_site};
pub use error::{Error, Result};
pub use ingest::load_site;
pub use types::*;
