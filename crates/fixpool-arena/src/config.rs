//! Arena configuration parameters.

/// Configuration shared by every arena strategy.
///
/// Capacity and element type are part of the arena's type; this struct
/// only carries behaviour that can vary between instances of the same
/// type. Fixed at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Name attached to every log event the arena emits.
    pub label: &'static str,

    /// Byte written over every slot of a freshly reserved run.
    ///
    /// Default: `None`. Makes reads of never-constructed slots visible
    /// while debugging.
    pub alloc_pattern: Option<u8>,

    /// Byte written over every slot released by a deallocate call.
    ///
    /// Default: `None`. Makes use-after-free visible while debugging.
    pub dealloc_pattern: Option<u8>,

    /// Whether the heap arena checks that a released pointer addresses one
    /// of its own slots before re-inserting it.
    ///
    /// Default: `true`. When disabled, the arena trusts the caller and a
    /// foreign pointer enters the free heap unchecked.
    pub verify_foreign_pointers: bool,
}

impl ArenaConfig {
    /// Default label for arenas created without one.
    pub const DEFAULT_LABEL: &'static str = "arena";

    /// Byte pattern for freshly reserved slots in [`ArenaConfig::debug`].
    pub const DEBUG_ALLOC_PATTERN: u8 = 0xBB;

    /// Byte pattern for released slots in [`ArenaConfig::debug`].
    pub const DEBUG_DEALLOC_PATTERN: u8 = 0xDD;

    /// Create a config with the given label and default behaviour.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            alloc_pattern: None,
            dealloc_pattern: None,
            verify_foreign_pointers: true,
        }
    }

    /// Fill patterns on, pointer verification on.
    pub fn debug() -> Self {
        Self {
            alloc_pattern: Some(Self::DEBUG_ALLOC_PATTERN),
            dealloc_pattern: Some(Self::DEBUG_DEALLOC_PATTERN),
            ..Self::default()
        }
    }

    /// No fill patterns, no pointer verification: the caller is trusted.
    pub fn production() -> Self {
        Self {
            verify_foreign_pointers: false,
            ..Self::default()
        }
    }

    /// Replace the label, keeping everything else.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LABEL)
    }
}
