use crate::blend::CompositeMode;
use crate::cache::{LocationCache, StateCache, Viewport};
use crate::device::{Device, NO_ERROR};
use crate::error::{Error, Result};
use crate::handle::{Framebuffer, Texture};

/// Device plus the state mirrored from it.
///
/// Only ever touched from inside a dispatched task, behind the context's
/// mutex. Methods here call each other freely; none of them dispatches.
pub(crate) struct Connection {
    pub(super) device: Box<dyn Device>,
    initialized: bool,
    pub(super) state: StateCache,
    pub(super) locations: LocationCache,
}

impl Connection {
    pub fn new(device: Box<dyn Device>) -> Self {
        Self {
            device,
            initialized: false,
            state: StateCache::new(),
            locations: LocationCache::new(),
        }
    }

    /// Re-synchronizes the mirror with the device.
    ///
    /// Runs after the device thread (re)created its GL context. The device
    /// library itself is initialized on the first successful call only.
    pub fn reset(&mut self) -> Result<()> {
        if !self.initialized {
            self.device.init().map_err(Error::Init)?;
            self.initialized = true;
            log::debug!("device initialized");
        }

        self.locations = LocationCache::new();
        self.state.reset();

        self.device.enable_blend();
        self.set_composite_mode(CompositeMode::SourceOver);

        let screen = Framebuffer::from_raw(self.device.framebuffer_binding());
        self.state.set_screen(screen);

        log::debug!("context reset, screen framebuffer is {}", screen.raw());
        Ok(())
    }

    pub fn set_composite_mode(&mut self, mode: CompositeMode) {
        if !self.state.set_composite_mode(mode) {
            log::trace!("composite mode {mode:?} already active");
            return;
        }
        let (src, dst) = mode.factors();
        self.device.blend_func(src, dst);
    }

    pub fn bind_texture(&mut self, texture: Texture) {
        if self.state.bind_texture(texture) {
            self.device.bind_texture(texture.raw());
        }
    }

    pub fn bind_framebuffer(&mut self, framebuffer: Framebuffer) {
        if self.state.bind_framebuffer(framebuffer) {
            self.device.bind_framebuffer(framebuffer.raw());
        }
    }

    /// Binds `framebuffer` and makes the viewport match its size.
    pub fn set_viewport(&mut self, framebuffer: Framebuffer, width: i32, height: i32) {
        self.bind_framebuffer(framebuffer);
        if self.state.set_viewport(Viewport::new(width, height)) {
            self.device.viewport(width, height);
        }
    }

    pub fn bind_screen_framebuffer(&mut self) {
        let screen = self.state.screen();
        self.bind_framebuffer(screen);
    }

    /// Flushes pending work, then reads back `width`x`height` RGBA pixels.
    pub fn read_pixels(&mut self, framebuffer: Framebuffer, width: i32, height: i32) -> Result<Vec<u8>> {
        let len = super::resources::rgba_len(width, height)
            .ok_or(Error::PixelData { needed: None, len: 0 })?;

        self.device.flush();
        self.bind_framebuffer(framebuffer);

        let mut pixels = vec![0; len];
        self.device.read_pixels(width, height, &mut pixels);

        match self.device.last_error() {
            NO_ERROR => Ok(pixels),
            code => Err(Error::ReadPixels(code)),
        }
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state.viewport()
    }

    pub fn screen(&self) -> Framebuffer {
        self.state.screen()
    }

    pub fn bound_texture(&self) -> Texture {
        self.state.texture()
    }

    pub fn bound_framebuffer(&self) -> Framebuffer {
        self.state.framebuffer()
    }

    pub fn composite_mode(&self) -> Option<CompositeMode> {
        self.state.composite_mode()
    }
}
