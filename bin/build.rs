use crate::engine::EngineConfig;
use crate::io::Process;
use std::io;

#[cfg(test)]
use crate::io::MockIo;

/// Trait for types that build other types.
#[cfg_attr(test, mockall::automock(type Output = MockIo; type Error = io::Error;))]
pub trait Build {
    /// The type to be built.
    type Output;

    /// The reason why [`Build::Output`] could not be built.
    type Error;

    /// Build an instance of [`Build::Output`].
    fn build(&self) -> Result<Self::Output, Self::Error>;
}

impl Build for EngineConfig {
    type Output = Process;
    type Error = io::Error;

    fn build(&self) -> Result<Self::Output, Self::Error> {
        Process::spawn(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn engine_process_can_be_configured_at_runtime(c: EngineConfig) {
        assert!(c.build().is_ok());
    }
}
