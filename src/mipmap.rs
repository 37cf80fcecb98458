use winit::event::ElementState;
use winit::keyboard::KeyCode;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MipLevelSelection {
    /// Let the GPU pick a level per pixel across the whole chain.
    Automatic,
    Pinned(u32),
}

impl MipLevelSelection {
    /// Integer form of the selection, where -1 stands for automatic.
    pub fn index(&self) -> i32 {
        match self {
            MipLevelSelection::Automatic => -1,
            MipLevelSelection::Pinned(level) => *level as i32,
        }
    }
}

impl std::fmt::Display for MipLevelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Which mipmap level the viewer shows, stepped with the arrow keys.
///
/// The selection saturates at both ends: stepping finer at the last level or
/// coarser at automatic leaves it unchanged.
#[derive(Clone, Debug)]
pub struct ViewState {
    selection: MipLevelSelection,
    level_count: u32,
}

impl ViewState {
    pub fn new(level_count: u32) -> Self {
        Self {
            selection: MipLevelSelection::Automatic,
            level_count: level_count.max(1),
        }
    }

    pub fn selection(&self) -> MipLevelSelection {
        self.selection
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    pub fn handle_keyboard_input(&mut self, key_code: KeyCode, state: ElementState) {
        if state != ElementState::Pressed {
            return;
        }

        match key_code {
            KeyCode::ArrowRight => self.step_finer(),
            KeyCode::ArrowLeft => self.step_coarser(),
            _ => {}
        }
    }

    pub fn step_finer(&mut self) {
        let last_level = self.level_count - 1;

        self.selection = match self.selection {
            MipLevelSelection::Automatic => MipLevelSelection::Pinned(0),
            MipLevelSelection::Pinned(level) => MipLevelSelection::Pinned((level + 1).min(last_level)),
        };
    }

    pub fn step_coarser(&mut self) {
        self.selection = match self.selection {
            MipLevelSelection::Automatic | MipLevelSelection::Pinned(0) => {
                MipLevelSelection::Automatic
            }
            MipLevelSelection::Pinned(level) => MipLevelSelection::Pinned(level - 1),
        };
    }

    pub fn sampling_bounds(&self) -> SamplingBounds {
        SamplingBounds::for_selection(self.selection, self.level_count)
    }
}

/// Base and max mip level the texture is sampled with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SamplingBounds {
    pub base_level: u32,
    pub max_level: u32,
}

impl SamplingBounds {
    /// Automatic selection keeps `max_level` at the level count rather than the
    /// last index; the value is clamped when a view is created.
    pub fn for_selection(selection: MipLevelSelection, level_count: u32) -> Self {
        match selection {
            MipLevelSelection::Automatic => Self {
                base_level: 0,
                max_level: level_count,
            },
            MipLevelSelection::Pinned(level) => Self {
                base_level: level,
                max_level: level,
            },
        }
    }

    /// `(base_mip_level, mip_level_count)` of a texture view restricted to these bounds.
    pub fn view_range(&self, level_count: u32) -> (u32, u32) {
        let last_level = level_count.max(1) - 1;
        let base_level = self.base_level.min(last_level);
        let max_level = self.max_level.clamp(base_level, last_level);

        (base_level, max_level - base_level + 1)
    }
}
