pub mod backoff;
pub mod pcm;
pub mod ring_buffer;
pub mod transfer_queue;
