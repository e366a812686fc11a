//! HTTP control surface for the console. The browser UI is an
//! external collaborator; it only sees these routes.

pub mod api;
pub mod arm_channel;
pub mod models;
