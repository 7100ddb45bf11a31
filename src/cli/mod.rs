pub mod config_cmd;
pub mod output;
pub mod preview_cmd;
