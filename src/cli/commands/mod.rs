//! Command implementations, one module per subcommand.

pub mod audit_cmd;
pub mod check;
pub mod check_key;
pub mod delete;
pub mod get;
pub mod keygen;
pub mod list;
pub mod migrate_cmd;
pub mod set;
pub mod verify;
