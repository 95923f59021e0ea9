pub mod builder;
pub mod provider;
pub mod request;
