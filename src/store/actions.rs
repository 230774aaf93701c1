//! Async actions over the shared store.
//!
//! Each action locks the store only to read its inputs and to apply the
//! result; the lock is never held across the model call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::ai::{self, ChatMessage, ChatRole, LanguageModel};
use crate::mindmap::model::NodeId;

use super::CanvasStore;
use super::error::AppError;

pub type SharedStore = Arc<Mutex<CanvasStore>>;

pub fn shared(store: CanvasStore) -> SharedStore {
    Arc::new(Mutex::new(store))
}

// A panic in another holder must not wedge the UI
pub fn lock(store: &SharedStore) -> MutexGuard<'_, CanvasStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    Added(Vec<NodeId>),
    // Skipped because the same node was already generating
    Coalesced,
}

/// Turn a user prompt into levels plus the first row of keyword nodes.
/// Replaces the current map on success.
pub async fn generate_initial<M: LanguageModel>(store: &SharedStore, model: &M, topic: &str) -> Result<Vec<NodeId>, AppError> {
    let topic = topic.trim();
    if topic.is_empty() {
        let err = AppError::validation("Please enter a topic first");
        lock(store).set_error(err.clone());
        return Err(err);
    }
    {
        let mut s = lock(store);
        s.clear_error();
        s.begin_loading();
    }
    log::info!("generating plan for '{}'", topic);
    let result = ai::request_plan(model, topic).await;

    let mut s = lock(store);
    s.end_loading();
    match result {
        Ok(plan) => Ok(s.apply_plan(topic, plan)),
        Err(e) => {
            let err = AppError::from_ai(&e, None);
            s.set_error(err.clone());
            Err(err)
        }
    }
}

/// Ask the model for the next level under `node_id` and append the children.
pub async fn generate_children<M: LanguageModel>(
    store: &SharedStore,
    model: &M,
    node_id: NodeId,
) -> Result<GenerationOutcome, AppError> {
    let ctx = {
        let mut s = lock(store);
        match s.begin_children(node_id) {
            Ok(Some(ctx)) => ctx,
            Ok(None) => return Ok(GenerationOutcome::Coalesced),
            Err(err) => {
                s.set_error(err.clone());
                return Err(err);
            }
        }
    };
    log::info!("generating level {} under '{}'", ctx.target_level, ctx.node_content);
    let result = ai::request_children(model, &ctx).await;

    let mut s = lock(store);
    s.end_children(node_id);
    match result {
        Ok(children) => Ok(GenerationOutcome::Added(s.append_children(node_id, children))),
        Err(e) => {
            let err = AppError::from_ai(&e, Some(node_id));
            s.set_error(err.clone());
            Err(err)
        }
    }
}

/// Regenerate the children of `node_id`. The old subtree is replaced only
/// when the model answers successfully.
pub async fn renew_node<M: LanguageModel>(
    store: &SharedStore,
    model: &M,
    node_id: NodeId,
) -> Result<GenerationOutcome, AppError> {
    let ctx = {
        let mut s = lock(store);
        match s.begin_children(node_id) {
            // The current children stay in the prompt as keywords to avoid
            Ok(Some(ctx)) => ctx,
            Ok(None) => return Ok(GenerationOutcome::Coalesced),
            Err(err) => {
                s.set_error(err.clone());
                return Err(err);
            }
        }
    };
    log::info!("renewing children of '{}'", ctx.node_content);
    let result = ai::request_children(model, &ctx).await;

    let mut s = lock(store);
    s.end_children(node_id);
    match result {
        Ok(children) => {
            let removed = s.map.remove_children(node_id);
            for id in &removed {
                s.selection.remove_node(*id);
                s.generating.remove(id);
            }
            log::debug!("renew removed {} node(s)", removed.len());
            Ok(GenerationOutcome::Added(s.append_children(node_id, children)))
        }
        Err(e) => {
            let err = AppError::from_ai(&e, Some(node_id));
            s.set_error(err.clone());
            Err(err)
        }
    }
}

/// Send one chat message and append the model's reply to the chat log.
pub async fn send_chat<M: LanguageModel>(store: &SharedStore, model: &M, text: &str) -> Result<String, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::validation("Message is empty"));
    }
    let history = {
        let mut s = lock(store);
        s.push_chat(ChatMessage::new(ChatRole::User, text));
        s.begin_loading();
        s.chat.clone()
    };
    let result = ai::request_chat(model, &history).await;

    let mut s = lock(store);
    s.end_loading();
    match result {
        Ok(reply) => {
            s.push_chat(ChatMessage::new(ChatRole::Model, reply.clone()));
            Ok(reply)
        }
        Err(e) => {
            let err = AppError::from_ai(&e, None);
            s.set_error(err.clone());
            Err(err)
        }
    }
}

/// Turn the selected chain into a short written plan.
pub async fn generate_report<M: LanguageModel>(store: &SharedStore, model: &M) -> Result<String, AppError> {
    let (topic, chain) = {
        let mut s = lock(store);
        let chain: Vec<(String, String)> = s
            .selected_chain()
            .iter()
            .map(|n| {
                let label = s
                    .levels
                    .get(n.level)
                    .map(|l| l.label.clone())
                    .unwrap_or_else(|| format!("Level {}", n.level));
                (label, n.content.clone())
            })
            .collect();
        if chain.is_empty() {
            let err = AppError::validation("Select at least one level-1 node to build a report");
            s.set_error(err.clone());
            return Err(err);
        }
        s.begin_loading();
        (s.topic.clone(), chain)
    };
    let result = ai::request_report(model, &topic, &chain).await;

    let mut s = lock(store);
    s.end_loading();
    match result {
        Ok(report) => {
            s.set_report(report.clone());
            Ok(report)
        }
        Err(e) => {
            let err = AppError::from_ai(&e, None);
            s.set_error(err.clone());
            Err(err)
        }
    }
}
