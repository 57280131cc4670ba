pub mod catalog;
pub mod extractor;
pub mod http;
pub mod prober;
pub mod speed;
pub mod updater;
