pub mod allegro;
pub mod google_books;
pub mod traits;

pub use allegro::{AllegroProvider, TOKEN_CACHE_KEY};
pub use google_books::GoogleBooksProvider;
pub use traits::{Amount, ProviderError, SourceProvider};
