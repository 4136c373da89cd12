pub mod alias;
pub mod callbook;
pub mod glossary;
pub mod greeter;
pub mod handler;
pub mod media;
pub mod rf_exposure;
pub mod scheduled;
