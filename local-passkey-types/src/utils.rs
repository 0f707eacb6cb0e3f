pub mod big_endian;
pub(crate) mod bytes;
pub mod crypto;
pub mod encoding;
pub mod rand;
