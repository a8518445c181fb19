// Library for tests to access modules

pub mod aggregate;
pub mod config;
pub mod derive;
pub mod emit;
pub mod host;
pub mod models;
pub mod report;
pub mod version;
pub mod vhosts;
pub mod worker;
