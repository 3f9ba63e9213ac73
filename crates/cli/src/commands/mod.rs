pub mod ai;
pub mod audit;
pub mod build;
pub mod home;
pub mod init;
pub mod package;
pub mod placeholders;
pub mod preview;
pub mod project;
pub mod rename;
pub mod suggest;
pub mod validate;
