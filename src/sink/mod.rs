//! Getting the finished card onto disk and, optionally, onto a server.

pub(crate) mod compress;
pub(crate) mod png;
pub(crate) mod transfer;

pub use compress::Compressor;
pub use png::{ensure_parent_dir, write_png};
pub use transfer::{SftpTransfer, deliver, is_sftp_on_path};
