use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::task::JoinHandle;

use crate::events::{DisputeMediatedEvent, EventHandler, EventProducer, Handler};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub dispute_mediated_producer: Vec<EventProducer<DisputeMediatedEvent>>,
}

impl EventProducers {
    pub fn is_empty(&self) -> bool {
        self.dispute_mediated_producer.is_empty()
    }
}

pub struct EventHandlers {
    pub on_dispute_mediated: Option<EventHandler<DisputeMediatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_dispute_mediated = hooks.on_dispute_mediated.map(|f| EventHandler::new(buffer_size, f));
        Self { on_dispute_mediated }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_dispute_mediated {
            result.dispute_mediated_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per configured hook and returns their handles. The tasks end once every producer handed out by
    /// [`Self::producers`] has been dropped and the queued events have been handled.
    pub async fn start_handlers(self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();
        if let Some(handler) = self.on_dispute_mediated {
            info!("📬️ Starting dispute mediation hook");
            tasks.push(tokio::spawn(async move {
                handler.start_handler().await;
            }));
        }
        tasks
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_dispute_mediated: Option<Handler<DisputeMediatedEvent>>,
}

impl EventHooks {
    pub fn on_dispute_mediated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(DisputeMediatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_dispute_mediated = Some(Arc::new(f));
        self
    }
}
