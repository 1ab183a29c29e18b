pub mod fixtures;
pub mod handlers;
pub mod status;
