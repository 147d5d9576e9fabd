mod channel;
mod event_types;
mod hooks;
mod notifier;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use notifier::{dispute_mediated_notification, notify_on_dispute_mediated};
