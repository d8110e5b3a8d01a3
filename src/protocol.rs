//! Line-based control protocol: request parsing, the command table and
//! per-client sessions.
//!
//! Every reply ends with `OK` or `ERROR <message>` on its own line. Listings
//! are written as `Key: Value` blocks separated by blank lines.

mod command;
mod session;

pub use command::{Command, parse};
pub use session::{Reply, Session};

/// Protocol version announced in the greeting.
pub const VERSION: &str = "0.0";

pub fn greeting(name: &str) -> String {
    format!("{name} {VERSION} service\nOK\n")
}
