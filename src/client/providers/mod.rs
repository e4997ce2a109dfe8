pub mod nyaa;
pub mod touchgal;
pub mod traits;

pub use nyaa::NyaaProvider;
pub use touchgal::TouchGalProvider;
pub use traits::{SourceError, SourceErrorKind, SourceProvider};
