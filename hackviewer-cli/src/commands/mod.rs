pub mod build_cmd;
pub mod init_cmd;
pub mod inspect_cmd;
