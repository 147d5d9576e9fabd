mod clock;
pub mod sla;
mod trace;

pub use clock::{Clock, ManualClock, SystemClock};
pub use trace::{ensure_trace_id, new_trace_id};
