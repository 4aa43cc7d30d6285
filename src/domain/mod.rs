//! Domain layer: CMS content model, locales and field traversal.

pub mod asset;
pub mod content_type;
pub mod entry;
pub mod error;
pub mod fields;
pub mod locale;
pub mod records;

pub use asset::{Asset, normalize_asset_url};
pub use content_type::ContentType;
pub use entry::Entry;
pub use locale::{Locale, normalize_locale};
