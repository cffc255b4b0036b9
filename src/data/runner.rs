//! Effect runner binding a Data Machine to a [`ResourceService`]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::event::{DataEffect, DataEvent, DataReply};
use super::machine::DataMachine;
use super::service::ResourceService;
use crate::machine::{EffectRunner, Interpreter, MachineHandle};
use crate::notice::NoticeSink;
use crate::resource::Resource;

pub struct DataRunner<R: Resource> {
    service: Arc<dyn ResourceService<R>>,
}

impl<R: Resource> DataRunner<R> {
    pub fn new(service: Arc<dyn ResourceService<R>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: Resource> EffectRunner<DataMachine<R>> for DataRunner<R> {
    async fn run(&self, effect: DataEffect<R>) -> Option<DataEvent<R>> {
        let ticket = effect.ticket();
        let op = effect.as_str();

        let outcome = match effect {
            DataEffect::List { query, .. } => self.service.list(&query).await.map(DataReply::Listed),
            DataEffect::Create { draft, .. } => {
                self.service.create(draft).await.map(DataReply::Created)
            }
            DataEffect::Update { record, .. } => {
                self.service.update(record).await.map(DataReply::Updated)
            }
            DataEffect::Delete { id, .. } => {
                self.service.delete(&id).await.map(|()| DataReply::Deleted)
            }
        };

        Some(match outcome {
            Ok(reply) => DataEvent::Resolved { ticket, reply },
            Err(failure) => {
                warn!(
                    service = self.service.name(),
                    op,
                    ticket = %ticket,
                    error = %failure,
                    transient = failure.kind.is_transient(),
                    "Adapter call failed"
                );
                DataEvent::Rejected { ticket, failure }
            }
        })
    }
}

/// Start a Data Machine for `R` on the current runtime
pub fn spawn_data_machine<R: Resource>(
    name: &'static str,
    service: Arc<dyn ResourceService<R>>,
    buffer: usize,
    notices: Option<Arc<dyn NoticeSink>>,
) -> MachineHandle<DataMachine<R>> {
    let runner = Arc::new(DataRunner::new(service));
    let (interpreter, handle) = Interpreter::new(DataMachine::new(name), runner, buffer);
    let interpreter = match notices {
        Some(sink) => interpreter.with_notices(sink),
        None => interpreter,
    };
    interpreter.spawn();
    handle
}
