/// Request middleware and extractors
///
/// - `auth`: Session verification layer for protected routes
/// - `body`: JSON body extractor with JSON error responses
/// - `resolve`: Loads and authorizes the project / task named in the path

pub mod auth;
pub mod body;
pub mod resolve;
