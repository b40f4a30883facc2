pub mod loader;
pub mod ringbuf;
