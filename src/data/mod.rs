pub mod config;
pub mod page;
pub mod persistence;
pub mod settings;

pub use config::AutofillConfig;
pub use page::PageFixture;
pub use persistence::Persistable;
pub use settings::Settings;
