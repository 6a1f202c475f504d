pub mod fusion;
pub mod ui_json;
