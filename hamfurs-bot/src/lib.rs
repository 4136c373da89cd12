pub mod app;
pub mod config;
pub mod logging;
pub mod module;
pub mod poller;
pub mod reply;
pub mod store;
pub mod telegram;

#[cfg(test)]
pub(crate) mod testing;
