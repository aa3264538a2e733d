#![forbid(unsafe_code)]

pub mod credentials;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;

pub use credentials::CredentialProvider;
pub use error::ApiError;
pub use gateway::QuizGateway;
pub use http::HttpGateway;
pub use memory::InMemoryGateway;
