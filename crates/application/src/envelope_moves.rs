//! Envelope-to-envelope move, orchestrating the pure domain service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::transfer_between_envelopes;
use uuid::Uuid;

use crate::{
    error::{AppResult, ApplicationError},
    ports::{EnvelopeRepository, EventPublisher},
    publish_best_effort,
    uow::{UnitOfWork, WriteBatch},
};

#[derive(Clone, Debug)]
pub struct MoveBetweenEnvelopes {
    pub budget_id: Uuid,
    pub source_envelope_id: Uuid,
    pub target_envelope_id: Uuid,
    pub amount_minor: i64,
}

pub struct MoveBetweenEnvelopesUseCase {
    envelopes: Arc<dyn EnvelopeRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    publisher: Arc<dyn EventPublisher>,
}

impl MoveBetweenEnvelopesUseCase {
    pub fn new(
        envelopes: Arc<dyn EnvelopeRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            envelopes,
            unit_of_work,
            publisher,
        }
    }

    pub async fn execute(&self, command: MoveBetweenEnvelopes, now: DateTime<Utc>) -> AppResult<()> {
        let source = self
            .envelopes
            .get(command.source_envelope_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "envelope",
                id: command.source_envelope_id,
            })?;
        let target = self
            .envelopes
            .get(command.target_envelope_id)
            .await?
            .ok_or(ApplicationError::NotFound {
                entity: "envelope",
                id: command.target_envelope_id,
            })?;

        let (mut source, mut target) = transfer_between_envelopes(
            &source,
            &target,
            command.budget_id,
            command.amount_minor,
            now,
        )?;

        let batch = WriteBatch {
            envelopes: vec![source.clone(), target.clone()],
            ..WriteBatch::default()
        };
        self.unit_of_work.commit(batch).await?;

        let mut events = source.drain_events();
        events.extend(target.drain_events());
        publish_best_effort(self.publisher.as_ref(), events).await;

        Ok(())
    }
}
