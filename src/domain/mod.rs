// Domain layer: request/response models and the port to the completion API.

pub mod model;
pub mod ports;
