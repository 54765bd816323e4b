pub mod directory;
#[cfg(target_os = "windows")]
pub mod windows;

pub use directory::DirectoryStores;
#[cfg(target_os = "windows")]
pub use windows::SystemStores;

#[cfg(target_os = "windows")]
pub type PlatformStores = windows::SystemStores;

#[cfg(not(target_os = "windows"))]
pub type PlatformStores = directory::DirectoryStores;

/// The store provider native to the current platform.
pub fn platform_stores() -> PlatformStores {
    #[cfg(target_os = "windows")]
    {
        windows::SystemStores::new()
    }

    #[cfg(not(target_os = "windows"))]
    {
        directory::DirectoryStores::from_env()
    }
}
