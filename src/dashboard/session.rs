//! Dashboard session.
//!
//! A [`Session`] owns one selection and the last published bundle, and
//! shares the read-only store with other sessions. Each dispatched signal is
//! one transaction: the selection change and the recomputed groups are
//! committed together, or not at all.

use super::bundle::ViewBundle;
use super::composer::{ViewComposer, DEFAULT_RANKING_SIZE};
use super::router::{SignalKind, ViewGroup};
use super::selection::{SelectionDefaults, SelectionState, Signal};
use crate::error::DashboardError;
use crate::store::RecordStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub signal: SignalKind,
    pub recomputed: BTreeSet<ViewGroup>,
}

/// Per-user dashboard state.
#[derive(Debug, Clone)]
pub struct Session {
    store: Arc<RecordStore>,
    selection: SelectionState,
    bundle: ViewBundle,
    ranking_size: usize,
}

impl Session {
    /// Open a session and build the full initial bundle.
    #[allow(dead_code)] // Convenience wrapper with the default ranking size
    pub fn open(
        store: Arc<RecordStore>,
        defaults: &SelectionDefaults,
    ) -> Result<Self, DashboardError> {
        Self::open_with_ranking_size(store, defaults, DEFAULT_RANKING_SIZE)
    }

    pub fn open_with_ranking_size(
        store: Arc<RecordStore>,
        defaults: &SelectionDefaults,
        ranking_size: usize,
    ) -> Result<Self, DashboardError> {
        let selection = SelectionState::with_defaults(&store, defaults)?;
        let bundle = ViewComposer::new(&store)
            .with_ranking_size(ranking_size)
            .recompute(&selection, &ViewGroup::all())?;

        debug!(
            "Session opened: year={} band={} country={}",
            selection.year, selection.age_band, selection.focused_country
        );

        Ok(Self {
            store,
            selection,
            bundle,
            ranking_size,
        })
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The last consistent bundle.
    pub fn bundle(&self) -> &ViewBundle {
        &self.bundle
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Apply a signal and publish the recomputed groups.
    ///
    /// On any error the selection and the bundle stay as they were.
    pub fn dispatch(&mut self, signal: Signal) -> Result<Update, DashboardError> {
        let mut next = self.selection.clone();
        let result = next.apply(&self.store, signal).map_err(|e| {
            warn!("Rejected signal: {}", e);
            e
        })?;

        let partial = ViewComposer::new(&self.store)
            .with_ranking_size(self.ranking_size)
            .recompute(&next, &result.stale)?;

        self.selection = next;
        self.bundle.merge(partial);
        debug_assert!(self.bundle.is_complete());

        debug!(
            "Applied {} signal, recomputed {:?}",
            result.signal, result.stale
        );

        Ok(Update {
            signal: result.signal,
            recomputed: result.stale,
        })
    }

    /// Parse and dispatch a `name=value` line.
    pub fn dispatch_assignment(&mut self, line: &str) -> Result<Update, DashboardError> {
        let signal = Signal::parse_assignment(line).map_err(|e| {
            warn!("Rejected signal: {}", e);
            e
        })?;
        self.dispatch(signal)
    }
}
