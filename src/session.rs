//! The per-view state machine.
//!
//! `Uninitialized → Empty → Loading → Ready`, then `Ready → Loading → Ready`
//! for every further load. Navigation, filter and orientation changes keep
//! the session in `Ready`. Every transition goes through a method here and
//! ends by pulling a fresh [`Metadata`] snapshot from the engine.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::enums::{FailurePolicy, Orientation};
use crate::error::{InvalidOperation, SessionError};
use crate::hierarchy::{Hierarchy, SeriesKey};
use crate::metadata::Metadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No engine yet
    Uninitialized,
    /// Engine present, nothing loaded
    Empty,
    Loading,
    Ready,
}

/// What the UI shows of the loaded dataset
#[derive(Default)]
struct View {
    metadata: Metadata,
    hierarchy: Option<Arc<Hierarchy>>,
    active_filter: Option<SeriesKey>,
    orientation: Orientation,
}

pub struct Session<E> {
    engine: Option<E>,
    config: SessionConfig,
    view: View,
    loading: bool,
}

/// Clears the loading flag however a load ends. A load dropped before the
/// engine answered counts as failed.
struct LoadGuard<'a> {
    loading: &'a mut bool,
    view: &'a mut View,
    policy: FailurePolicy,
    settled: bool,
}

impl LoadGuard<'_> {
    fn fail(&mut self) {
        self.settled = true;
        if self.policy == FailurePolicy::ClearOnFailure {
            *self.view = View::default();
        }
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Load was abandoned before the engine finished");
            self.fail();
        }
        *self.loading = false;
    }
}

impl<E> Default for Session<E> {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl<E> Session<E> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            engine: None,
            config,
            view: View::default(),
            loading: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.engine.is_none() {
            SessionState::Uninitialized
        } else if self.loading {
            SessionState::Loading
        } else if self.view.hierarchy.is_some() {
            SessionState::Ready
        } else {
            SessionState::Empty
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn metadata(&self) -> Metadata {
        self.view.metadata
    }

    pub fn hierarchy(&self) -> Option<Arc<Hierarchy>> {
        self.view.hierarchy.clone()
    }

    pub fn active_filter(&self) -> Option<&SeriesKey> {
        self.view.active_filter.as_ref()
    }

    pub fn orientation(&self) -> Orientation {
        self.view.orientation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn mark_loading(&mut self) {
        self.loading = true;
    }
}

impl<E: Engine> Session<E> {
    /// Takes ownership of the engine. A second call is rejected and drops
    /// the engine it was given.
    pub fn initialize(&mut self, engine: E) -> Result<(), SessionError> {
        if self.engine.is_some() {
            return Err(SessionError::AlreadyInitialized);
        }
        self.engine = Some(engine);
        self.view.metadata = Metadata::empty();
        debug!("Session initialized");
        Ok(())
    }

    /// Replaces the loaded dataset with `buffers`.
    ///
    /// Dropping the returned future before it resolves is handled like a
    /// failed load under the configured [`FailurePolicy`].
    pub async fn load_files(&mut self, buffers: Vec<Vec<u8>>) -> Result<Metadata, SessionError> {
        if self.loading {
            return Err(InvalidOperation::LoadInProgress.into());
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or(InvalidOperation::NotInitialized)?;

        info!("Loading {} files", buffers.len());
        self.loading = true;
        let mut guard = LoadGuard {
            loading: &mut self.loading,
            view: &mut self.view,
            policy: self.config.failure_policy,
            settled: false,
        };
        let result = engine.decode_and_load(buffers).await;

        match result {
            Ok(()) => {
                guard.settled = true;
                engine.render_at(0);
                *guard.view = View {
                    metadata: engine.metadata(),
                    hierarchy: Some(Arc::new(engine.hierarchy())),
                    active_filter: None,
                    orientation: Orientation::Axial,
                };
                info!("{} files successfully loaded", guard.view.metadata.total());
                Ok(guard.view.metadata)
            }
            Err(err) => {
                warn!("Could not load files: {err}");
                guard.fail();
                Err(err.into())
            }
        }
    }

    pub fn set_filter(&mut self, series: SeriesKey) -> Result<Metadata, SessionError> {
        let known = self
            .view
            .hierarchy
            .as_ref()
            .is_some_and(|hierarchy| hierarchy.contains_series(&series));
        let engine = self.ready_engine()?;
        if !known {
            warn!("Series {series} is not part of the loaded hierarchy");
        }
        engine.set_series_filter(&series);
        debug!("Filtering on series {series}");
        self.view.active_filter = Some(series);
        self.refresh_metadata()
    }

    pub fn reset_filter(&mut self) -> Result<Metadata, SessionError> {
        self.ready_engine()?.reset_filter();
        self.view.active_filter = None;
        self.refresh_metadata()
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<Metadata, SessionError> {
        self.ready_engine()?.set_orientation(orientation);
        debug!("Orientation set to {orientation:?}");
        self.view.orientation = orientation;
        self.refresh_metadata()
    }

    pub fn render_at(&mut self, index: usize) -> Result<Metadata, SessionError> {
        self.ready_engine()?.render_at(index);
        self.refresh_metadata()
    }

    pub fn render_next(&mut self) -> Result<Metadata, SessionError> {
        self.ready_engine()?.render_next();
        self.refresh_metadata()
    }

    pub fn render_previous(&mut self) -> Result<Metadata, SessionError> {
        self.ready_engine()?.render_previous();
        self.refresh_metadata()
    }

    /// Pulls the engine's current position
    pub fn refresh_metadata(&mut self) -> Result<Metadata, SessionError> {
        if self.loading {
            return Err(InvalidOperation::LoadInProgress.into());
        }
        let engine = self
            .engine
            .as_ref()
            .ok_or(InvalidOperation::NotInitialized)?;
        self.view.metadata = engine.metadata();
        Ok(self.view.metadata)
    }

    fn ready_engine(&mut self) -> Result<&mut E, InvalidOperation> {
        if self.loading {
            return Err(InvalidOperation::LoadInProgress);
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or(InvalidOperation::NotInitialized)?;
        if self.view.hierarchy.is_none() {
            return Err(InvalidOperation::NotLoaded);
        }
        Ok(engine)
    }
}
