mod reader;
mod value;

pub use reader::{RespReader, MAX_BULK_LEN};
pub use value::{multi_bulk, RespValue};
