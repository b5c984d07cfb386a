pub mod client;
pub mod rate_limit;
pub mod request;
pub mod response;

pub use client::Harness;
pub use rate_limit::RateLimit;
pub use request::Request;
pub use response::{parse_as_object, Response};
