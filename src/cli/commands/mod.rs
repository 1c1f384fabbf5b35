//! One module per subcommand.

pub mod add;
pub mod copy;
pub mod get;
pub mod init;
pub mod inject;
pub mod list;
pub mod lock;
pub mod reset;
pub mod search;
pub mod status;
pub mod unlock;
pub mod update;
