//! Captures log levels emitted under a tracing target.

use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone)]
pub struct CapturedLevels {
    target: &'static str,
    levels: Arc<Mutex<Vec<Level>>>,
}

impl CapturedLevels {
    /// Installs a thread-local subscriber; keep the guard alive while logging.
    pub fn install(target: &'static str) -> (Self, DefaultGuard) {
        let captured = Self {
            target,
            levels: Arc::default(),
        };
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        (captured, tracing::subscriber::set_default(subscriber))
    }

    pub fn levels(&self) -> Vec<Level> {
        self.levels.lock().expect("levels lock").clone()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLevels {
    fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
        if event.metadata().target() == self.target {
            self.levels
                .lock()
                .expect("levels lock")
                .push(*event.metadata().level());
        }
    }
}
