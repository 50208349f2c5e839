//! Control-wide constants derived from the VersaTiles frontend conventions.
//! Keeping them in a single place makes it easier to tweak magic numbers.

/// Style selected when nothing else asks for one.
pub const DEFAULT_STYLE_KEY: &str = "colorful";

/// Tile server used when the host does not configure an origin.
pub const DEFAULT_ORIGIN: &str = "https://tiles.versatiles.org";

/// Trailing-edge delay for URL fragment writes.
pub const HASH_THROTTLE_MS: u64 = 300;

/// Options key injected into every live tree so builders can resolve
/// relative resource URLs.
pub const BASE_URL_KEY: &str = "baseUrl";

/// Tile source a vector style needs.
pub const VECTOR_SOURCE: &str = "osm";

/// Tile source the satellite style needs.
pub const SATELLITE_SOURCE: &str = "satellite";

/// Upper bound on decimal digits written for fragment coordinates.
pub const MAX_COORD_DIGITS: usize = 10;

/// File name offered for the style document download.
pub const DOWNLOAD_FILE_NAME: &str = "style.json";

/// Package the exported code snippet imports builders from.
pub const STYLE_PACKAGE: &str = "@versatiles/style";
