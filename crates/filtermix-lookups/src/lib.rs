pub mod assets;
pub mod store;

pub use assets::AssetLookups;
pub use store::LookupStore;
