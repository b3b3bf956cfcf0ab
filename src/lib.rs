pub mod error;
pub mod http;
pub mod index;
pub mod presence;
pub mod request;
pub mod requirements;
pub mod resolve;
pub mod sync;
pub mod version;
