//!  Storage is organized through [log_store::LogStoreImpl].
//!  The basic idea is:
//!   - A single text log holds every day, and doubles as a readable report.
//!   - Each day starts with a `YYYY-MM-DD` line, followed by a `TOTAL:` summary and one
//!     `#   task: H:MM:SS (H:MM:SS/HH:MM:SS) P%` line per task.
//!   - The summary is derived on every save and is never read back.
//!   - A CSV export with the same base name is rewritten alongside the log.

pub mod entities;
pub mod log_format;
pub mod log_store;
