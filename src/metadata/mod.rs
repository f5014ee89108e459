mod reference;
mod title;

pub use reference::{ContentKind, ContentReference};
pub use title::{ResolvedTitle, SpotifyTitleResolver, TitleResolver};
