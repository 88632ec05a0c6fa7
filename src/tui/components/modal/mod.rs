//! Modal overlay for confirmation dialogs
//!
//! The overlay owns its visibility; hosts request transitions and fill the
//! regions it lays out.

pub mod overlay;
pub mod types;

pub use overlay::ModalOverlay;
pub use types::*;
