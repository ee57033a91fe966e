use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::error::SessionError;
use crate::ingest::{ByteSource, ingest};
use crate::metadata::Metadata;
use crate::navigation::{Gesture, GestureOutcome, Navigator};
use crate::notification::{NotificationSink, notify_load, notify_rejected};
use crate::session::Session;

/// One view: a session, the engine it owns and where its messages go
pub struct Viewer<E, N> {
    session: Session<E>,
    sink: N,
}

impl<E: Engine, N: NotificationSink> Viewer<E, N> {
    pub fn new(engine: E, sink: N, config: SessionConfig) -> Result<Self, SessionError> {
        let mut session = Session::new(config);
        session.initialize(engine)?;
        Ok(Self { session, sink })
    }

    /// Reads, loads and reports a batch of files.
    ///
    /// A batch that cannot be read never reaches the session.
    pub async fn open<S: ByteSource>(
        &mut self,
        sources: impl IntoIterator<Item = S>,
    ) -> Result<Metadata, SessionError> {
        let outcome = match ingest(sources).await {
            Ok(buffers) => self.session.load_files(buffers).await,
            Err(err) => Err(err.into()),
        };
        notify_load(&mut self.sink, &outcome);
        outcome
    }

    /// Applies a gesture. Rejections are reported, applied gestures are silent.
    pub fn gesture(&mut self, gesture: Gesture) -> Result<GestureOutcome, SessionError> {
        let outcome = Navigator::new(&mut self.session).handle(gesture);
        if let Err(err) = &outcome {
            notify_rejected(&mut self.sink, err);
        }
        outcome
    }

    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }
}
