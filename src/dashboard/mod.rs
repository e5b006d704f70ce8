//! Reactive dashboard engine.
//!
//! Input signals update a [`SelectionState`], the router names the stale
//! view groups, the composer rebuilds them, and the [`Session`] publishes
//! the merged [`ViewBundle`].

pub mod bundle;
pub mod composer;
pub mod router;
pub mod selection;
pub mod session;

pub use bundle::ViewBundle;
pub use router::{SignalKind, ViewGroup};
pub use selection::{SelectionDefaults, SelectionState, Signal};
pub use session::{Session, Update};
