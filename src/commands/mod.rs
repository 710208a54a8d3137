//! Command implementations behind the `jwtrevoke` binary.

mod delete;
mod list;
mod revoke;

pub use delete::delete;
pub use list::list;
pub use revoke::revoke;
