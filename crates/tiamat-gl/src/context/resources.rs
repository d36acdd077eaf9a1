//! Texture, framebuffer and buffer lifecycles.
//!
//! Every creation follows allocate → validate → configure. A failure after
//! allocation deletes what was allocated, so no half-built handle escapes.
//! Deletes of dead or never-created handles are silent no-ops.

use super::connection::Connection;
use crate::device::{FRAMEBUFFER_COMPLETE, NO_ERROR};
use crate::error::{Error, Result};
use crate::handle::{Buffer, BufferKind, Framebuffer, Texture};

/// Row alignment of uploaded pixel rows; RGBA rows are always 4-aligned.
const UNPACK_ALIGNMENT: i32 = 4;

/// Byte length of a `width`x`height` RGBA8 region, `None` for negative or
/// overflowing sizes.
pub(super) fn rgba_len(width: i32, height: i32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width.checked_mul(height)?.checked_mul(4)
}

impl Connection {
    // ── textures ──────────────────────────────────────────────────────────

    pub fn create_texture(&mut self, width: i32, height: i32) -> Result<Texture> {
        let texture = Texture::from_raw(self.device.gen_texture());
        if texture.is_invalid() {
            return Err(Error::creation("texture", "device returned no texture name"));
        }

        self.device.set_unpack_alignment(UNPACK_ALIGNMENT);
        self.bind_texture(texture);
        self.device.set_nearest_clamped_sampling();
        self.device.tex_storage(width, height);

        log::debug!("created texture {} ({width}x{height})", texture.raw());
        Ok(texture)
    }

    pub fn delete_texture(&mut self, texture: Texture) {
        if texture.is_invalid() || !self.device.is_texture(texture.raw()) {
            return;
        }

        self.state.forget_texture(texture);
        self.device.delete_texture(texture.raw());
        log::debug!("deleted texture {}", texture.raw());
    }

    pub fn is_texture(&mut self, texture: Texture) -> bool {
        !texture.is_invalid() && self.device.is_texture(texture.raw())
    }

    /// Writes RGBA `pixels` into a region of the bound texture.
    ///
    /// `pixels` must hold at least `4 * width * height` bytes; the device
    /// reads that many regardless of the slice length.
    pub fn write_sub_region(
        &mut self,
        pixels: &[u8],
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let needed = rgba_len(width, height);
        if needed.is_none_or(|needed| pixels.len() < needed) {
            return Err(Error::PixelData { needed, len: pixels.len() });
        }

        self.device.tex_sub_image(pixels, x, y, width, height);
        Ok(())
    }

    // ── framebuffers ──────────────────────────────────────────────────────

    pub fn create_framebuffer(&mut self, texture: Texture) -> Result<Framebuffer> {
        let raw = self.device.gen_framebuffer();
        if raw == 0 {
            return Err(Error::creation("framebuffer", "device returned no framebuffer name"));
        }

        let framebuffer = Framebuffer::from_raw(raw);
        self.bind_framebuffer(framebuffer);
        self.device.attach_color_texture(texture.raw());

        let status = self.device.check_framebuffer_status();
        if status == FRAMEBUFFER_COMPLETE {
            log::debug!("created framebuffer {raw} for texture {}", texture.raw());
            return Ok(framebuffer);
        }

        // Status code first, then the pending device error, then a fixed message.
        let reason = if status != 0 {
            format!("incomplete, status {status:#06x}")
        } else {
            match self.device.last_error() {
                NO_ERROR => "unknown error".to_owned(),
                code => format!("error {code:#06x}"),
            }
        };

        self.state.forget_framebuffer(framebuffer);
        self.device.delete_framebuffer(raw);
        Err(Error::creation("framebuffer", reason))
    }

    pub fn delete_framebuffer(&mut self, framebuffer: Framebuffer) {
        if framebuffer.is_invalid() || !self.device.is_framebuffer(framebuffer.raw()) {
            return;
        }
        if framebuffer == self.state.screen() {
            log::warn!("refusing to delete the screen framebuffer {}", framebuffer.raw());
            return;
        }

        self.state.forget_framebuffer(framebuffer);
        self.device.delete_framebuffer(framebuffer.raw());
        log::debug!("deleted framebuffer {}", framebuffer.raw());
    }

    // ── buffers ───────────────────────────────────────────────────────────

    pub fn create_buffer(&mut self, kind: BufferKind, size: usize) -> Result<Buffer> {
        let size = i32::try_from(size)
            .map_err(|_| Error::creation("buffer", format!("{size} bytes exceed the device limit")))?;

        let buffer = Buffer::from_raw(self.device.gen_buffer());
        if buffer.is_invalid() {
            return Err(Error::creation("buffer", "device returned no buffer name"));
        }

        self.device.bind_buffer(kind, buffer.raw());
        self.device.buffer_storage(kind, size);

        log::debug!("created {kind:?} buffer {} ({size} bytes)", buffer.raw());
        Ok(buffer)
    }

    pub fn bind_buffer(&mut self, kind: BufferKind, buffer: Buffer) {
        self.device.bind_buffer(kind, buffer.raw());
    }

    /// Replaces the contents of the bound `kind` buffer from offset zero.
    pub fn overwrite_buffer(&mut self, kind: BufferKind, bytes: &[u8]) {
        self.device.buffer_sub_data(kind, 0, bytes);
    }

    /// Unconditional; the device ignores names it does not know.
    pub fn delete_buffer(&mut self, buffer: Buffer) {
        self.device.delete_buffer(buffer.raw());
    }

    pub fn draw_indexed(&mut self, count: i32, byte_offset: i32) {
        self.device.draw_triangles(count, byte_offset);
    }
}
