pub mod document;
pub mod feed;
pub mod raw_entry;
pub mod record;

pub use document::OutputDocument;
pub use feed::FeedKind;
pub use raw_entry::{ArtistRef, BasicInformation, RawEntry};
pub use record::NormalizedRecord;
