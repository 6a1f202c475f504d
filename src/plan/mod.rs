pub mod plan_model;
pub mod planner;
pub mod response;
pub mod retry;
