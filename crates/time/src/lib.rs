pub use chrono;
pub use chrono_tz;

pub mod clock;
pub mod range;
pub mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use range::DateWindow;
pub use zone::CivilZone;

use chrono::Duration;

pub fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}
