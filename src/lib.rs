#![forbid(unsafe_code)]

pub mod allocator;
pub mod assemble;
pub mod encode_ffmpeg;
pub mod error;
pub mod scan;
pub mod session;
pub mod thumbs;

pub use allocator::{recompute_total, rescale_to_total};
pub use assemble::{
    AssembleReport, FRAME_INTERVAL_MS, FramePlan, FrameSpec, OUTPUT_FPS, PlanEntry, assemble,
    frame_plan, repeat_count,
};
pub use error::{StopmoError, StopmoResult};
pub use scan::scan_images;
pub use session::{
    Command, DEFAULT_DURATION_MS, Effect, Item, MIN_ITEM_DURATION_MS, MIN_TOTAL_DURATION_MS,
    Session,
};
pub use thumbs::{THUMB_MAX_DIM, ThumbnailCache};
