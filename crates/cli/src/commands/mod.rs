pub mod config_cmd;
pub mod discover;
pub mod doctor;
pub mod list;
