// Adapters layer: concrete implementations for external systems (upstream API, inbound HTTP).

pub mod completion;
pub mod http;
