//! Lifecycle state definitions for hosts and URL records

mod host_status;
mod url_status;

pub use host_status::HostStatus;
pub use url_status::UrlStatus;
