//! Genesis state of the milestone module.

use crate::domain::{Params, Span};
use crate::error::MilestoneResult;
use crate::keeper;
use serde::{Deserialize, Serialize};
use sv_01_state_store::KvStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisState {
    pub params: Params,
    /// Initial producer spans, in id order.
    pub spans: Vec<Span>,
}

pub fn init_genesis(store: &mut dyn KvStore, state: &GenesisState) -> MilestoneResult<()> {
    keeper::set_params(store, &state.params)?;
    for span in &state.spans {
        keeper::add_span(store, span)?;
    }
    Ok(())
}
