pub mod handlers;
pub mod lifecycle;
pub mod listing;
pub mod status;
