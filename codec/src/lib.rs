pub use ::tokio_util::codec as tokio_codec;

pub mod bits;
mod frame;

pub use self::frame::*;
