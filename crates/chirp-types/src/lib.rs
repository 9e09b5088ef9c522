pub mod api;
pub mod limits;
pub mod models;
