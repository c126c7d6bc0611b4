pub mod actor;
pub mod config;
pub mod ext;
pub mod util;

pub use actor::{Actor, Message};

#[cfg(test)]
mod core_test {
    use tracing::Level;

    use crate::ext::init_logger;

    #[ctor::ctor]
    fn init() {
        init_logger(Level::DEBUG)
    }
}
