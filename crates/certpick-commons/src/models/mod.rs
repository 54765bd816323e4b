pub mod settings_model;
pub mod store_location;

pub use settings_model::{
    CertificateSourceSettings,
    HostRunOptions,
    HostSettings,
};
pub use store_location::StoreLocation;
