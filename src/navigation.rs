//! Turns input gestures into session transitions.
//!
//! Scrolling down (a negative wheel delta) moves to the next slice and
//! scrolling up moves to the previous one. Slider positions are 1-based.

use tracing::debug;

use crate::engine::Engine;
use crate::enums::Orientation;
use crate::error::SessionError;
use crate::hierarchy::SeriesKey;
use crate::metadata::Metadata;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Mouse wheel; `delta_y < 0` is scrolling down
    Scroll { delta_y: f64 },
    /// Slider or index field, 1-based
    Slider { position: usize },
    /// A series node was picked in the hierarchy tree
    SelectSeries(SeriesKey),
    ResetFilter,
    PickOrientation(Orientation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Applied(Metadata),
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next,
    Previous,
}

fn scroll_step(delta_y: f64) -> Option<Step> {
    if delta_y < 0.0 {
        Some(Step::Next)
    } else if delta_y > 0.0 {
        Some(Step::Previous)
    } else {
        None
    }
}

/// 1-based position the UI shows for a snapshot, 0 when nothing is loaded
pub fn display_index(metadata: &Metadata) -> usize {
    if metadata.is_empty() {
        0
    } else {
        metadata.current_index() + 1
    }
}

pub struct Navigator<'a, E> {
    session: &'a mut Session<E>,
}

impl<'a, E: Engine> Navigator<'a, E> {
    pub fn new(session: &'a mut Session<E>) -> Self {
        Self { session }
    }

    pub fn handle(&mut self, gesture: Gesture) -> Result<GestureOutcome, SessionError> {
        if self.session.is_loading() {
            debug!("Ignoring {gesture:?} while loading");
            return Ok(GestureOutcome::Ignored);
        }

        let metadata = match gesture {
            Gesture::Scroll { delta_y } => match scroll_step(delta_y) {
                Some(Step::Next) => self.session.render_next()?,
                Some(Step::Previous) => self.session.render_previous()?,
                None => return Ok(GestureOutcome::Ignored),
            },
            Gesture::Slider { position } => match position.checked_sub(1) {
                Some(index) => self.session.render_at(index)?,
                None => return Ok(GestureOutcome::Ignored),
            },
            Gesture::SelectSeries(series) => self.session.set_filter(series)?,
            Gesture::ResetFilter => self.session.reset_filter()?,
            Gesture::PickOrientation(orientation) => self.session.set_orientation(orientation)?,
        };

        Ok(GestureOutcome::Applied(metadata))
    }
}
