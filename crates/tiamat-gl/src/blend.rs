//! Composite modes and their device blend factors.
//!
//! All factors assume premultiplied-alpha sources (Porter-Duff operators).

/// Device blend factor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    DstAlpha,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

/// How new pixels combine with the framebuffer contents.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    Clear,
    Copy,
    Destination,
    DestinationOver,
    SourceIn,
    DestinationIn,
    SourceOut,
    DestinationOut,
    SourceAtop,
    DestinationAtop,
    Xor,
    /// Additive (`src + dst`).
    Lighter,
}

impl CompositeMode {
    /// Returns the `(source, destination)` factor pair for this mode.
    pub const fn factors(self) -> (BlendFactor, BlendFactor) {
        use BlendFactor::*;

        match self {
            Self::Clear => (Zero, Zero),
            Self::Copy => (One, Zero),
            Self::Destination => (Zero, One),
            Self::SourceOver => (One, OneMinusSrcAlpha),
            Self::DestinationOver => (OneMinusDstAlpha, One),
            Self::SourceIn => (DstAlpha, Zero),
            Self::DestinationIn => (Zero, SrcAlpha),
            Self::SourceOut => (OneMinusDstAlpha, Zero),
            Self::DestinationOut => (Zero, OneMinusSrcAlpha),
            Self::SourceAtop => (DstAlpha, OneMinusSrcAlpha),
            Self::DestinationAtop => (OneMinusDstAlpha, SrcAlpha),
            Self::Xor => (OneMinusDstAlpha, OneMinusSrcAlpha),
            Self::Lighter => (One, One),
        }
    }
}
