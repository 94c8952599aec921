mod addon;
mod config;
mod db;
mod install;
mod remote;

pub use addon::{cmd_addon_add, cmd_addon_list, cmd_addon_remove};
pub use config::{cmd_config_get, cmd_config_list, cmd_config_set};
pub use db::{cmd_db_prune, cmd_db_status};
pub use install::{cmd_install_add, cmd_install_list, cmd_install_remove};
pub use remote::{cmd_remote_add, cmd_remote_list, cmd_remote_remove};
