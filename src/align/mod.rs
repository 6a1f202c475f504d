pub mod anchors;
pub mod validator;
