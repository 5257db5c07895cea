pub mod headers;
pub mod response;
