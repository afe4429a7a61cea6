//! Criteria actor for serialized command handling.
//!
//! The actor owns a [`CriteriaAggregate`] and provides a message-based
//! interface for executing mutations and reading snapshots. Because the
//! actor processes one message at a time, interleaved async callers are
//! serialized instead of relying on accidental single-threadedness.

use crate::aggregate::{ChangeSubscriber, CompletionToggle, CriteriaAggregate};
use crate::domain::criterion::Criterion;
use crate::domain::document::CriteriaDocument;
use crate::domain::errors::CriteriaError;
use crate::domain::types::{CriterionId, IdentityRef, WorkItemId};
use crate::state_machine::ProcessEvent;
use crate::store::DocumentStore;
use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

/// Messages that can be sent to the criteria actor.
pub enum CriteriaMessage {
    /// Reload (or read memoized) documents for a scope.
    Load {
        scope: Option<WorkItemId>,
        force: bool,
        reply: oneshot::Sender<Result<Vec<CriteriaDocument>, CriteriaError>>,
    },
    /// Add or update one criterion on its owner's document.
    CreateOrUpdate {
        owner: WorkItemId,
        criterion: Box<Criterion>,
        reply: oneshot::Sender<Result<CriteriaDocument, CriteriaError>>,
    },
    /// Remove a criterion from whichever document owns it.
    DeleteCriteria {
        id: CriterionId,
        reply: oneshot::Sender<Result<Option<CriteriaDocument>, CriteriaError>>,
    },
    /// Apply a completion toggle through the state machine.
    ToggleCompletion {
        id: CriterionId,
        toggle: CompletionToggle,
        reply: oneshot::Sender<Result<CriteriaDocument, CriteriaError>>,
    },
    /// Apply an approver action through the state machine.
    Process {
        id: CriterionId,
        event: ProcessEvent,
        actor: IdentityRef,
        reply: oneshot::Sender<Result<CriteriaDocument, CriteriaError>>,
    },
    /// Read the current cached snapshot.
    GetDocuments(oneshot::Sender<Vec<CriteriaDocument>>),
}

/// Arguments for spawning a criteria actor.
pub struct CriteriaActorArgs {
    /// Backing document store.
    pub store: Arc<dyn DocumentStore>,
    /// Scope loaded at startup (one work item, or all documents).
    pub scope: Option<WorkItemId>,
    /// Watch channel sender for snapshot broadcasting.
    pub snapshot_tx: watch::Sender<Vec<CriteriaDocument>>,
}

/// State maintained by the criteria actor.
pub struct CriteriaActorState {
    aggregate: CriteriaAggregate,
    snapshot_tx: watch::Sender<Vec<CriteriaDocument>>,
}

/// The criteria actor.
pub struct CriteriaActor;

/// Subscriber that forwards aggregate snapshots into the watch channel.
fn forwarding_subscriber(tx: watch::Sender<Vec<CriteriaDocument>>) -> ChangeSubscriber {
    Box::new(move |documents| {
        let _ = tx.send(documents.to_vec());
    })
}

#[async_trait]
impl Actor for CriteriaActor {
    type Msg = CriteriaMessage;
    type State = CriteriaActorState;
    type Arguments = CriteriaActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let mut aggregate = CriteriaAggregate::new(args.store);
        aggregate
            .load(
                forwarding_subscriber(args.snapshot_tx.clone()),
                args.scope,
                false,
            )
            .await
            .map_err(ActorProcessingErr::from)?;

        Ok(CriteriaActorState {
            aggregate,
            snapshot_tx: args.snapshot_tx,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CriteriaMessage::Load {
                scope,
                force,
                reply,
            } => {
                let result = state
                    .aggregate
                    .load(
                        forwarding_subscriber(state.snapshot_tx.clone()),
                        scope,
                        force,
                    )
                    .await;
                if reply.send(result).is_err() {
                    tracing::debug!("load reply channel closed");
                }
            }
            CriteriaMessage::CreateOrUpdate {
                owner,
                criterion,
                reply,
            } => {
                let result = state.aggregate.create_or_update(&owner, *criterion).await;
                if reply.send(result).is_err() {
                    tracing::debug!("create_or_update reply channel closed");
                }
            }
            CriteriaMessage::DeleteCriteria { id, reply } => {
                let result = state.aggregate.delete_criteria(&id).await;
                if reply.send(result).is_err() {
                    tracing::debug!("delete reply channel closed");
                }
            }
            CriteriaMessage::ToggleCompletion { id, toggle, reply } => {
                let result = state.aggregate.toggle_completion(&id, toggle).await;
                if reply.send(result).is_err() {
                    tracing::debug!("toggle reply channel closed");
                }
            }
            CriteriaMessage::Process {
                id,
                event,
                actor,
                reply,
            } => {
                let result = state.aggregate.process_criterion(&id, event, &actor).await;
                if reply.send(result).is_err() {
                    tracing::debug!("process reply channel closed");
                }
            }
            CriteriaMessage::GetDocuments(reply) => {
                if reply.send(state.aggregate.documents().to_vec()).is_err() {
                    tracing::debug!("snapshot reply channel closed");
                }
            }
        }

        Ok(())
    }
}

/// Spawns a criteria actor over the given store and returns its handle plus
/// a watch receiver fed by every change notification.
pub async fn spawn_criteria_actor(
    store: Arc<dyn DocumentStore>,
    scope: Option<WorkItemId>,
) -> anyhow::Result<(ActorRef<CriteriaMessage>, watch::Receiver<Vec<CriteriaDocument>>)> {
    let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());
    let args = CriteriaActorArgs {
        store,
        scope,
        snapshot_tx,
    };

    let (actor_ref, _join_handle) = CriteriaActor::spawn(None, CriteriaActor, args).await?;
    Ok((actor_ref, snapshot_rx))
}

#[cfg(test)]
#[path = "tests/actor_tests.rs"]
mod tests;
