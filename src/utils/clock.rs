use chrono::{DateTime, Local};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
pub trait Clock: Sync + Send + 'static {
    /// Wall clock time, used for day keys and the on-screen clock.
    fn time(&self) -> DateTime<Local>;

    /// Monotonic time, used for accrual and the autosave schedule.
    fn instant(&self) -> Instant;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}
