// 6.0.2: error taxonomy for engine operations. every error is synchronous and
// surfaced to the caller immediately; the engine never retries, and a failure
// mid-advance leaves the account at the last successfully processed tick.

use crate::order::{OrderError, OrderStatus};
use crate::tick::TickError;
use crate::types::{OrderId, Symbol};

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Symbol {0} is not registered")]
    UnknownSymbol(Symbol),

    #[error("Order {0} not found")]
    UnknownOrder(OrderId),

    #[error("Order {id} cannot go from {from:?} to {to:?}")]
    InvalidStateTransition {
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("No tick has been applied for symbol {0}")]
    MissingPrice(Symbol),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// the per-module errors flatten into the engine taxonomy so callers match on
// one enum.

impl From<TickError> for EngineError {
    fn from(err: TickError) -> Self {
        match err {
            TickError::UnknownSymbol(symbol) => EngineError::UnknownSymbol(symbol),
            TickError::MissingPrice(symbol) => EngineError::MissingPrice(symbol),
        }
    }
}

impl From<OrderError> for EngineError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::UnknownOrder(id) => EngineError::UnknownOrder(id),
            OrderError::InvalidStateTransition { id, from, to } => {
                EngineError::InvalidStateTransition { id, from, to }
            }
        }
    }
}
