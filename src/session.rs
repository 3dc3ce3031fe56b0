use std::path::PathBuf;

use crate::{
    allocator::{recompute_total, rescale_to_total},
    assemble::FrameSpec,
    error::{StopmoError, StopmoResult},
};

/// Duration every item starts with when a directory is first scanned.
pub const DEFAULT_DURATION_MS: u64 = 200;
/// Smallest per-item duration a user may set.
pub const MIN_ITEM_DURATION_MS: u64 = 1;
/// Smallest total duration a rescale may target.
pub const MIN_TOTAL_DURATION_MS: u64 = 100;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub path: PathBuf,
    pub included: bool,
    pub duration_ms: u64,
}

/// Explicit, passed-around session state: one entry per scanned image plus
/// the derived total. Owned by the presentation layer; nothing here is
/// global.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub items: Vec<Item>,
    pub total_duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleInclude(usize),
    SetDuration(usize, u64),
    SetTotal(u64),
    Generate,
}

/// What the caller must do after a command has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Assemble the carried frames into the output video. The list is a
    /// snapshot of the selection at the time the command was applied.
    Generate(Vec<FrameSpec>),
}

impl Session {
    /// Build a session over `paths` in their given (discovery) order, every
    /// item included at the default duration.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let items: Vec<Item> = paths
            .into_iter()
            .map(|path| Item {
                path,
                included: true,
                duration_ms: DEFAULT_DURATION_MS,
            })
            .collect();
        let total_duration_ms = recompute_total(&items);
        Self {
            items,
            total_duration_ms,
        }
    }

    /// Included items in discovery order.
    pub fn selection(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|it| it.included)
    }

    pub fn selected_frames(&self) -> Vec<FrameSpec> {
        self.selection()
            .map(|it| FrameSpec {
                path: it.path.clone(),
                duration_ms: it.duration_ms,
            })
            .collect()
    }

    /// Apply one user command. State commands mutate the session and keep
    /// the total consistent; `Generate` leaves state untouched and hands the
    /// selection snapshot back as an effect.
    pub fn apply(&mut self, cmd: Command) -> StopmoResult<Effect> {
        match cmd {
            Command::ToggleInclude(index) => {
                let item = self.item_mut(index)?;
                item.included = !item.included;
                self.total_duration_ms = recompute_total(&self.items);
                Ok(Effect::None)
            }
            Command::SetDuration(index, duration_ms) => {
                if duration_ms < MIN_ITEM_DURATION_MS {
                    return Err(StopmoError::validation(format!(
                        "item duration must be >= {MIN_ITEM_DURATION_MS} ms, got {duration_ms}"
                    )));
                }
                let item = self.item_mut(index)?;
                item.duration_ms = duration_ms;
                self.total_duration_ms = recompute_total(&self.items);
                Ok(Effect::None)
            }
            Command::SetTotal(target_total_ms) => {
                rescale_to_total(&mut self.items, target_total_ms)?;
                // The session total holds the requested target; the item sum
                // may drift below it by truncation.
                self.total_duration_ms = target_total_ms;
                Ok(Effect::None)
            }
            Command::Generate => Ok(Effect::Generate(self.selected_frames())),
        }
    }

    fn item_mut(&mut self, index: usize) -> StopmoResult<&mut Item> {
        let len = self.items.len();
        self.items.get_mut(index).ok_or_else(|| {
            StopmoError::validation(format!("item index {index} out of range (have {len} items)"))
        })
    }
}
