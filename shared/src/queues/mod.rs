mod ts_breakpoint_queue;
mod ts_queue;

pub use ts_breakpoint_queue::TsBreakpointQueue;
pub use ts_queue::TsQueue;
