//! Tone mapping operator selection
//!
//! Maps the HDR lighting result to a displayable range. The actual curves
//! live in the fragment shaders; this enum carries the selection from the
//! debug panel into the global uniform buffer.

/// Tone mapping operator applied at the end of the fragment stage
///
/// The discriminants are the switch values used by `pbr.wgsl` and
/// `skybox.wgsl`; they must stay in sync with the shader code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMapping {
    None,
    Linear,
    Reinhard,
    Cineon,
    #[default]
    Filmic,
}

impl ToneMapping {
    /// Every operator, in panel display order
    pub const ALL: [ToneMapping; 5] = [
        ToneMapping::None,
        ToneMapping::Linear,
        ToneMapping::Reinhard,
        ToneMapping::Cineon,
        ToneMapping::Filmic,
    ];

    /// Switch value consumed by the shaders
    pub fn shader_index(self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::Linear => 1,
            ToneMapping::Reinhard => 2,
            ToneMapping::Cineon => 3,
            ToneMapping::Filmic => 4,
        }
    }

    /// Display name used by the debug panel
    pub fn label(self) -> &'static str {
        match self {
            ToneMapping::None => "None",
            ToneMapping::Linear => "Linear",
            ToneMapping::Reinhard => "Reinhard",
            ToneMapping::Cineon => "Cineon",
            ToneMapping::Filmic => "Filmic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_indices_are_stable_and_unique() {
        // The WGSL switch depends on these exact values.
        let indices: Vec<u32> = ToneMapping::ALL.iter().map(|t| t.shader_index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn panel_order_starts_with_none_and_ends_with_filmic() {
        assert_eq!(ToneMapping::ALL[0], ToneMapping::None);
        assert_eq!(ToneMapping::ALL[4], ToneMapping::Filmic);
        assert_eq!(ToneMapping::default(), ToneMapping::Filmic);
    }
}
