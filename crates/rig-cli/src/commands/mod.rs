pub mod catalog;
pub mod dispatch;
pub mod equipment;
pub mod erase;
pub mod init;
pub mod list;
pub mod review;
pub mod shared;
pub mod show;
pub mod submit;
pub mod watch;
