use async_trait::async_trait;
use std::io;

mod pipe;
mod process;

pub use pipe::*;
pub use process::*;

/// Trait for types that exchange line-oriented messages with a remote peer.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Io: Send {
    /// Receive a message.
    async fn recv(&mut self) -> io::Result<String>;

    /// Send a message.
    async fn send(&mut self, msg: &str) -> io::Result<()>;

    /// Flush the internal buffers.
    async fn flush(&mut self) -> io::Result<()>;

    /// Forcibly terminate the remote peer.
    async fn kill(&mut self) -> io::Result<()>;
}
