//! Permission domain module.

mod model;

pub use model::{
    PermissionCheck, PermissionDecision, PermissionRequest, PermissionResponse, Permissions,
};
