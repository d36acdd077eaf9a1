use crate::blend::CompositeMode;
use crate::handle::{Framebuffer, Texture};

/// Drawable rectangle configured on the device, in pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Mirror of the device's global bindings.
///
/// Every `set_*`/`bind_*` method records the requested value and returns
/// whether it differs from what the device already has. Callers issue the
/// device call only on `true`. `None`/`INVALID` entries mean "unknown" and
/// never match a request.
#[derive(Debug)]
pub(crate) struct StateCache {
    texture: Texture,
    framebuffer: Framebuffer,
    viewport: Option<Viewport>,
    composite_mode: Option<CompositeMode>,
    /// Framebuffer owned by the windowing layer.
    screen: Framebuffer,
}

impl StateCache {
    pub fn new() -> Self {
        Self {
            texture: Texture::INVALID,
            framebuffer: Framebuffer::INVALID,
            viewport: None,
            composite_mode: None,
            screen: Framebuffer::INVALID,
        }
    }

    /// Forgets every binding. The screen framebuffer is kept until re-queried.
    pub fn reset(&mut self) {
        self.texture = Texture::INVALID;
        self.framebuffer = Framebuffer::INVALID;
        self.viewport = None;
        self.composite_mode = None;
    }

    pub fn bind_texture(&mut self, texture: Texture) -> bool {
        replace_if_changed(&mut self.texture, texture)
    }

    pub fn bind_framebuffer(&mut self, framebuffer: Framebuffer) -> bool {
        replace_if_changed(&mut self.framebuffer, framebuffer)
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        replace_if_changed(&mut self.viewport, Some(viewport))
    }

    pub fn set_composite_mode(&mut self, mode: CompositeMode) -> bool {
        replace_if_changed(&mut self.composite_mode, Some(mode))
    }

    /// Called before `texture` is deleted on the device.
    pub fn forget_texture(&mut self, texture: Texture) {
        if self.texture == texture {
            self.texture = Texture::INVALID;
        }
    }

    /// Called before `framebuffer` is deleted on the device.
    ///
    /// The viewport belonged to the deleted target, so it is forgotten too.
    pub fn forget_framebuffer(&mut self, framebuffer: Framebuffer) {
        if self.framebuffer == framebuffer {
            self.framebuffer = Framebuffer::INVALID;
            self.viewport = None;
        }
    }

    pub fn texture(&self) -> Texture {
        self.texture
    }

    pub fn framebuffer(&self) -> Framebuffer {
        self.framebuffer
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn composite_mode(&self) -> Option<CompositeMode> {
        self.composite_mode
    }

    pub fn screen(&self) -> Framebuffer {
        self.screen
    }

    pub fn set_screen(&mut self, framebuffer: Framebuffer) {
        self.screen = framebuffer;
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── short-circuit ─────────────────────────────────────────────────────

    #[test]
    fn repeated_bind_reports_no_change() {
        let mut cache = StateCache::new();
        let t = Texture::from_raw(3);
        assert!(cache.bind_texture(t));
        assert!(!cache.bind_texture(t));
        assert!(cache.bind_texture(Texture::from_raw(4)));
    }

    #[test]
    fn fresh_cache_matches_nothing() {
        let mut cache = StateCache::new();
        assert!(cache.bind_framebuffer(Framebuffer::from_raw(0)));
        assert!(cache.set_viewport(Viewport::new(0, 0)));
        assert!(cache.set_composite_mode(CompositeMode::SourceOver));
    }

    // ── invalidation ──────────────────────────────────────────────────────

    #[test]
    fn forgetting_bound_texture_resets_it() {
        let mut cache = StateCache::new();
        let t = Texture::from_raw(9);
        cache.bind_texture(t);
        cache.forget_texture(t);
        assert_eq!(cache.texture(), Texture::INVALID);
        assert!(cache.bind_texture(t));
    }

    #[test]
    fn forgetting_other_texture_keeps_binding() {
        let mut cache = StateCache::new();
        cache.bind_texture(Texture::from_raw(1));
        cache.forget_texture(Texture::from_raw(2));
        assert_eq!(cache.texture(), Texture::from_raw(1));
    }

    #[test]
    fn forgetting_bound_framebuffer_drops_viewport() {
        let mut cache = StateCache::new();
        let f = Framebuffer::from_raw(5);
        cache.bind_framebuffer(f);
        cache.set_viewport(Viewport::new(64, 64));
        cache.forget_framebuffer(f);
        assert_eq!(cache.framebuffer(), Framebuffer::INVALID);
        assert_eq!(cache.viewport(), None);
        assert!(cache.set_viewport(Viewport::new(64, 64)));
    }

    #[test]
    fn reset_keeps_screen() {
        let mut cache = StateCache::new();
        cache.set_screen(Framebuffer::from_raw(0));
        cache.set_composite_mode(CompositeMode::Copy);
        cache.reset();
        assert_eq!(cache.screen(), Framebuffer::from_raw(0));
        assert_eq!(cache.composite_mode(), None);
    }
}
