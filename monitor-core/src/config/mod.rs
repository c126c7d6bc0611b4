use std::fmt::Debug;

use config::Source;

/// Layered configuration: later sources override earlier ones, and the
/// crate's embedded defaults sit underneath everything added here.
pub trait ConfigBuilder: Sized {
    type C: Debug + Clone;

    fn add_source<T>(self, source: T) -> anyhow::Result<Self>
        where
            T: Source + Send + Sync + 'static;

    fn build(self) -> anyhow::Result<Self::C>;
}
