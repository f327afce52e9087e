mod admin;
mod auth;
mod files;
mod push;

pub use admin::{admin_purge, health};
pub use auth::{logout, refresh_token, signin, signup};
pub use files::{delete_file, download_file, get_file, list_files, replace_file, upload_file};
pub use push::push_channel;
