pub mod error;
pub mod host_check;
pub mod metrics;
pub mod router;
pub mod routes;
pub mod serve;

#[cfg(test)]
mod tests;

pub use router::build_router;
pub use routes::SentinelState;
pub use serve::serve;
