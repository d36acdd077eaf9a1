//! Opaque device handles.
//!
//! Each resource kind gets its own value type so a texture id can never be
//! passed where a framebuffer is expected. Handles are plain numbers issued
//! by the device; they carry no ownership and are not freed on drop.

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, invalid = $invalid:expr) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "no handle".
            pub const INVALID: Self = Self($invalid);

            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn is_invalid(self) -> bool {
                self.0 == $invalid
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

handle!(
    /// 2D RGBA texture.
    Texture,
    invalid = 0
);

handle!(
    /// Framebuffer object.
    ///
    /// The invalid sentinel is all-ones: zero is the default framebuffer the
    /// windowing layer hands out, and it is a legitimate bind target.
    Framebuffer,
    invalid = u32::MAX
);

handle!(Shader, invalid = 0);

handle!(Program, invalid = 0);

handle!(
    /// Vertex or index buffer.
    Buffer,
    invalid = 0
);

/// Shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

/// Buffer target class.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    /// Per-vertex attribute data (`f32` components).
    Vertex,
    /// Triangle indices (`u16`).
    Index,
}

/// Component type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DataType {
    Short,
    Float,
}
