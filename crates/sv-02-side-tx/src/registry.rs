//! Handler tables keyed by message type URL.

use crate::error::{HandlerError, HandlerKind, RegistryError, RegistryResult};
use crate::handler::{MsgHandler, PostMsgHandler, SideMsgHandler};
use shared_types::{Msg, Tx};
use std::collections::HashMap;
use std::sync::Arc;
use sv_01_state_store::Context;
use tracing::{debug, info};

/// Side-tx registry.
///
/// Built once during application assembly, then shared read-only behind an
/// `Arc`. Lookups are by exact type URL.
#[derive(Default)]
pub struct SideTxRegistry {
    side_handlers: HashMap<String, Arc<dyn SideMsgHandler>>,
    post_handlers: HashMap<String, Arc<dyn PostMsgHandler>>,
    msg_handlers: HashMap<String, Arc<dyn MsgHandler>>,
}

impl SideTxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_side_handler(
        &mut self,
        msg_type: &str,
        handler: Arc<dyn SideMsgHandler>,
    ) -> RegistryResult<()> {
        insert_unique(&mut self.side_handlers, HandlerKind::Side, msg_type, handler)
    }

    pub fn register_post_handler(
        &mut self,
        msg_type: &str,
        handler: Arc<dyn PostMsgHandler>,
    ) -> RegistryResult<()> {
        insert_unique(&mut self.post_handlers, HandlerKind::Post, msg_type, handler)
    }

    pub fn register_msg_handler(
        &mut self,
        msg_type: &str,
        handler: Arc<dyn MsgHandler>,
    ) -> RegistryResult<()> {
        insert_unique(&mut self.msg_handlers, HandlerKind::Msg, msg_type, handler)
    }

    pub fn get_side_handler(&self, msg: &Msg) -> Option<&dyn SideMsgHandler> {
        self.side_handlers.get(&msg.type_url).map(|h| h.as_ref())
    }

    pub fn get_post_handler(&self, msg: &Msg) -> Option<&dyn PostMsgHandler> {
        self.post_handlers.get(&msg.type_url).map(|h| h.as_ref())
    }

    pub fn has_route(&self, msg: &Msg) -> bool {
        self.msg_handlers.contains_key(&msg.type_url)
    }

    /// Number of messages in `tx` with a registered side handler.
    pub fn count_side_handlers(&self, tx: &Tx) -> usize {
        tx.msgs
            .iter()
            .filter(|m| self.side_handlers.contains_key(&m.type_url))
            .count()
    }

    pub fn check_single_side_msg(&self, tx: &Tx) -> RegistryResult<()> {
        match self.count_side_handlers(tx) {
            0 | 1 => Ok(()),
            count => Err(RegistryError::MultipleSideMsgs { count }),
        }
    }

    /// The side message of `tx` together with its handler, if any.
    pub fn side_msg<'t>(&self, tx: &'t Tx) -> Option<(&'t Msg, &dyn SideMsgHandler)> {
        tx.msgs
            .iter()
            .find_map(|m| self.get_side_handler(m).map(|h| (m, h)))
    }

    /// The side message of `tx` together with its post handler, if any.
    pub fn post_msg<'t>(&self, tx: &'t Tx) -> Option<(&'t Msg, &dyn PostMsgHandler)> {
        tx.msgs
            .iter()
            .filter(|m| self.side_handlers.contains_key(&m.type_url))
            .find_map(|m| self.get_post_handler(m).map(|h| (m, h)))
    }

    /// Execute one message through its deterministic route.
    pub fn route(&self, ctx: &mut Context<'_>, msg: &Msg, tx: &Tx) -> Result<(), HandlerError> {
        let handler = self
            .msg_handlers
            .get(&msg.type_url)
            .ok_or_else(|| HandlerError::unknown_request(&msg.type_url))?;
        handler.handle(ctx, msg, &tx.signer)
    }

    /// Execute every message of `tx` in order, stopping at the first error.
    pub fn route_tx(&self, ctx: &mut Context<'_>, tx: &Tx) -> Result<(), HandlerError> {
        if tx.msgs.is_empty() {
            return Err(HandlerError::new("sdk", 18, "transaction carries no messages"));
        }
        for msg in &tx.msgs {
            self.route(ctx, msg, tx)?;
        }
        Ok(())
    }
}

fn insert_unique<H: ?Sized>(
    table: &mut HashMap<String, Arc<H>>,
    kind: HandlerKind,
    msg_type: &str,
    handler: Arc<H>,
) -> RegistryResult<()> {
    if table.contains_key(msg_type) {
        return Err(RegistryError::HandlerAlreadyExists {
            kind,
            msg_type: msg_type.to_string(),
        });
    }
    table.insert(msg_type.to_string(), handler);
    info!("[sv-02] registered {} handler for {}", kind, msg_type);
    debug!(kind = %kind, entries = table.len(), "[sv-02] handler table updated");
    Ok(())
}
