pub mod convert;
pub mod init;
pub mod text;

pub use convert::{convert, ConvertArgs};
pub use init::{init, InitArgs};
pub use text::{text, TextArgs};
