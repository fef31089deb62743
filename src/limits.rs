use std::time::Duration;

use crate::model::Slot;

/// 48 half-hour slots per day, starting at 00:00.
pub const SLOTS_PER_DAY: Slot = 48;

/// Upload ceiling enforced before any network call.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// The only accepted video content types (MP4 and QuickTime).
pub const ALLOWED_CONTENT_TYPES: [&str; 2] = ["video/mp4", "video/quicktime"];

/// Extensions the media listing considers playable.
pub const MEDIA_EXTENSIONS: [&str; 2] = [".mp4", ".mov"];

/// The single fixed display timezone. No per-tenant configurability.
pub const DISPLAY_TZ: &str = "Europe/Stockholm";

/// TV displays re-resolve the active entry on this cadence; there is no
/// push channel, the poll IS the refresh mechanism.
pub const PLAYOUT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Calendar rendering palette size for `media::color_index`.
pub const PALETTE_SIZE: u32 = 7;
