pub mod token_file;
pub mod traits;

// Re-export
pub use token_file::{data_dir, FileTokenStore};
pub use traits::TokenStore;
