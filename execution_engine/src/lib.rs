pub use crate::{
    error::EngineError,
    execution_engine::{ExecutionEngine, MockExecutionEngine, NullExecutionEngine},
    types::{
        assemble_payload, BuiltPayload, DepositEvent, ForkchoiceState, NewPayloadRequest,
        PayloadAttributes,
    },
};

mod error;
mod execution_engine;
mod types;
