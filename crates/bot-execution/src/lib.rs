//! Order execution: single-order handlers and the TWAP runner.

mod handler;
mod twap;

pub use handler::{OrderHandler, DEFAULT_LIMIT_OFFSET};
pub use twap::{
    inter_slice_delay, split_quantity, ChildOrder, FailurePolicy, MAX_SLICES, RunState, SliceFailure,
    SliceRecord, TwapPlan, TwapReport, TwapRequest, TwapRunner,
};
