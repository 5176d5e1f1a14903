pub mod init;
pub mod presets;
pub mod preview;
pub mod root;
