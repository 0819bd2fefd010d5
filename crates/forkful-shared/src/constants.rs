/// Service name reported by the info endpoint
pub const APP_NAME: &str = "Forkful";

/// Credential tokens are valid for seven days from issuance
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum menu item name length
pub const MIN_MENU_ITEM_NAME_LEN: usize = 3;

/// Maximum length of an order's special instructions
pub const MAX_SPECIAL_INSTRUCTIONS_LEN: usize = 500;

/// Upper bound for a menu item or add-on price, in cents (100,000.00)
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

/// Upper bound for the quantity of a single order line
pub const MAX_LINE_QUANTITY: u32 = 1_000;

/// Bucket used when grouping menu items that carry no category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Maximum menu image size in bytes (5 MiB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8890;
