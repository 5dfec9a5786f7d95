//! State management module.
//!
//! Contains the Matrix (shared server state) and related entities.

mod matrix;
mod uid;

pub use matrix::{
    Channel, Delivery, Matrix, MatrixConfig, NickChange, SEND_QUEUE_EXCEEDED, ServerInfo, Session,
    Teardown, WhoEntry, spawn_disconnect_worker,
};
pub use uid::{Uid, UidGenerator};
