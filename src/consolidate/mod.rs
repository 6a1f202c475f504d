pub mod engine;
pub mod op_log;
