//! In-memory device that records every call.
//!
//! Emulates just enough of GL to exercise the context: per-kind name
//! allocation with reuse of freed ids, liveness queries, framebuffer
//! completeness, shader compile/link results and name resolution from
//! `uniform`/`attribute` declarations in the shader source.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Device, FRAMEBUFFER_COMPLETE, LOCATION_NOT_FOUND, NO_ERROR};
use crate::blend::BlendFactor;
use crate::handle::{BufferKind, DataType, ShaderKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Init,
    EnableBlend,
    BlendFunc(BlendFactor, BlendFactor),
    Viewport(i32, i32),
    Flush,
    BindTexture(u32),
    DeleteTexture(u32),
    TexStorage(i32, i32),
    TexSubImage { len: usize, x: i32, y: i32, width: i32, height: i32 },
    BindFramebuffer(u32),
    DeleteFramebuffer(u32),
    AttachColorTexture(u32),
    ReadPixels(i32, i32),
    CompileShader(u32),
    ShaderInfoLog(u32),
    DeleteShader(u32),
    LinkProgram(u32),
    UseProgram(u32),
    DeleteProgram(u32),
    UniformLocation(u32, String),
    AttribLocation(u32, String),
    Uniform(i32, Vec<f32>),
    VertexAttribPointer { index: u32, size: i32, data_type: DataType, stride: i32, offset: i32 },
    EnableAttrib(u32),
    DisableAttrib(u32),
    BindBuffer(BufferKind, u32),
    BufferStorage(BufferKind, i32),
    BufferSubData(BufferKind, Vec<u8>),
    DeleteBuffer(u32),
    DrawTriangles(i32, i32),
}

/// Name allocator handing out the lowest free id first, starting at 1.
#[derive(Default)]
struct Names {
    next: u32,
    free: BTreeSet<u32>,
    live: HashSet<u32>,
}

impl Names {
    fn alloc(&mut self) -> u32 {
        let id = match self.free.pop_first() {
            Some(id) => id,
            None => {
                self.next += 1;
                self.next
            }
        };
        self.live.insert(id);
        id
    }

    fn release(&mut self, id: u32) -> bool {
        let removed = self.live.remove(&id);
        if removed {
            self.free.insert(id);
        }
        removed
    }

    fn is_live(&self, id: u32) -> bool {
        self.live.contains(&id)
    }
}

#[derive(Default)]
struct ShaderObject {
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<u32>,
    uniforms: Vec<String>,
    attribs: Vec<String>,
}

/// Observable state of the fake. Tests tweak the public knobs directly.
pub(crate) struct FakeGl {
    pub calls: Vec<Call>,
    pub init_count: usize,
    pub fail_init: bool,
    pub fail_texture_alloc: bool,
    pub fail_framebuffer_alloc: bool,
    /// Status returned by the next completeness checks.
    pub framebuffer_status: u32,
    /// Error code reported (once) by `last_error`.
    pub pending_error: u32,
    pub fail_link: bool,
    pub max_texture_size: i32,
    pub bound_framebuffer: u32,
    pub pixel_fill: u8,

    textures: Names,
    framebuffers: Names,
    buffers: Names,
    shader_names: Names,
    program_names: Names,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
}

impl Default for FakeGl {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            init_count: 0,
            fail_init: false,
            fail_texture_alloc: false,
            fail_framebuffer_alloc: false,
            framebuffer_status: FRAMEBUFFER_COMPLETE,
            pending_error: NO_ERROR,
            fail_link: false,
            max_texture_size: 4096,
            bound_framebuffer: 0,
            pixel_fill: 0x7f,
            textures: Names::default(),
            framebuffers: Names::default(),
            buffers: Names::default(),
            shader_names: Names::default(),
            program_names: Names::default(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
        }
    }
}

impl FakeGl {
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }

    pub fn is_framebuffer_live(&self, id: u32) -> bool {
        self.framebuffers.is_live(id)
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }
}

/// Device half handed to the context; clones share one [`FakeGl`].
#[derive(Clone, Default)]
pub(crate) struct FakeDevice {
    shared: Arc<Mutex<FakeGl>>,
}

impl FakeDevice {
    pub fn gl(&self) -> MutexGuard<'_, FakeGl> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: Call) {
        self.gl().calls.push(call);
    }
}

fn declared_names(source: &str, keyword: &str) -> Vec<String> {
    source
        .split(';')
        .filter_map(|decl| {
            let mut words = decl.split_whitespace();
            if words.next()? != keyword {
                return None;
            }
            words.last().map(str::to_owned)
        })
        .collect()
}

impl Device for FakeDevice {
    fn init(&mut self) -> anyhow::Result<()> {
        let mut gl = self.gl();
        gl.calls.push(Call::Init);
        anyhow::ensure!(!gl.fail_init, "no GL symbols available");
        gl.init_count += 1;
        Ok(())
    }

    fn enable_blend(&mut self) {
        self.record(Call::EnableBlend);
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(Call::BlendFunc(src, dst));
    }

    fn viewport(&mut self, width: i32, height: i32) {
        self.record(Call::Viewport(width, height));
    }

    fn framebuffer_binding(&mut self) -> u32 {
        self.gl().bound_framebuffer
    }

    fn max_texture_size(&mut self) -> i32 {
        self.gl().max_texture_size
    }

    fn last_error(&mut self) -> u32 {
        std::mem::replace(&mut self.gl().pending_error, NO_ERROR)
    }

    fn flush(&mut self) {
        self.record(Call::Flush);
    }

    fn gen_texture(&mut self) -> u32 {
        let mut gl = self.gl();
        if gl.fail_texture_alloc { 0 } else { gl.textures.alloc() }
    }

    fn is_texture(&mut self, texture: u32) -> bool {
        self.gl().textures.is_live(texture)
    }

    fn bind_texture(&mut self, texture: u32) {
        self.record(Call::BindTexture(texture));
    }

    fn delete_texture(&mut self, texture: u32) {
        let mut gl = self.gl();
        gl.textures.release(texture);
        gl.calls.push(Call::DeleteTexture(texture));
    }

    fn set_unpack_alignment(&mut self, _alignment: i32) {}

    fn set_nearest_clamped_sampling(&mut self) {}

    fn tex_storage(&mut self, width: i32, height: i32) {
        self.record(Call::TexStorage(width, height));
    }

    fn tex_sub_image(&mut self, pixels: &[u8], x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::TexSubImage { len: pixels.len(), x, y, width, height });
    }

    fn gen_framebuffer(&mut self) -> u32 {
        let mut gl = self.gl();
        if gl.fail_framebuffer_alloc { 0 } else { gl.framebuffers.alloc() }
    }

    fn is_framebuffer(&mut self, framebuffer: u32) -> bool {
        self.gl().framebuffers.is_live(framebuffer)
    }

    fn bind_framebuffer(&mut self, framebuffer: u32) {
        let mut gl = self.gl();
        gl.bound_framebuffer = framebuffer;
        gl.calls.push(Call::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&mut self, framebuffer: u32) {
        let mut gl = self.gl();
        gl.framebuffers.release(framebuffer);
        gl.calls.push(Call::DeleteFramebuffer(framebuffer));
    }

    fn attach_color_texture(&mut self, texture: u32) {
        self.record(Call::AttachColorTexture(texture));
    }

    fn check_framebuffer_status(&mut self) -> u32 {
        self.gl().framebuffer_status
    }

    fn read_pixels(&mut self, width: i32, height: i32, out: &mut [u8]) {
        let mut gl = self.gl();
        out.fill(gl.pixel_fill);
        gl.calls.push(Call::ReadPixels(width, height));
    }

    fn create_shader(&mut self, _kind: ShaderKind) -> u32 {
        let mut gl = self.gl();
        let id = gl.shader_names.alloc();
        gl.shaders.insert(id, ShaderObject::default());
        id
    }

    fn shader_source(&mut self, shader: u32, source: &str) {
        if let Some(s) = self.gl().shaders.get_mut(&shader) {
            s.source = source.to_owned();
        }
    }

    fn compile_shader(&mut self, shader: u32) {
        let mut gl = self.gl();
        if let Some(s) = gl.shaders.get_mut(&shader) {
            s.compiled = !s.source.contains("#error");
        }
        gl.calls.push(Call::CompileShader(shader));
    }

    fn shader_compile_status(&mut self, shader: u32) -> bool {
        self.gl().shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&mut self, shader: u32) -> Option<String> {
        let mut gl = self.gl();
        gl.calls.push(Call::ShaderInfoLog(shader));
        let source = &gl.shaders.get(&shader)?.source;
        let line = source.lines().find(|l| l.contains("#error"))?;
        Some(format!("ERROR: 0:1: '{}'", line.trim()))
    }

    fn delete_shader(&mut self, shader: u32) {
        let mut gl = self.gl();
        if gl.shader_names.release(shader) {
            gl.shaders.remove(&shader);
        }
        gl.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> u32 {
        let mut gl = self.gl();
        let id = gl.program_names.alloc();
        gl.programs.insert(id, ProgramObject::default());
        id
    }

    fn attach_shader(&mut self, program: u32, shader: u32) {
        if let Some(p) = self.gl().programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn link_program(&mut self, program: u32) {
        let mut gl = self.gl();
        gl.calls.push(Call::LinkProgram(program));

        let Some(attached) = gl.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };
        let sources: Vec<String> = attached
            .iter()
            .filter_map(|s| gl.shaders.get(s).map(|s| s.source.clone()))
            .collect();
        if let Some(p) = gl.programs.get_mut(&program) {
            for src in &sources {
                p.uniforms.extend(declared_names(src, "uniform"));
                p.attribs.extend(declared_names(src, "attribute"));
            }
        }
    }

    fn program_link_status(&mut self, program: u32) -> bool {
        let gl = self.gl();
        !gl.fail_link && gl.programs.contains_key(&program)
    }

    fn program_info_log(&mut self, program: u32) -> Option<String> {
        let gl = self.gl();
        (gl.fail_link && gl.programs.contains_key(&program))
            .then(|| format!("error: program {program} failed to link"))
    }

    fn is_program(&mut self, program: u32) -> bool {
        self.gl().program_names.is_live(program)
    }

    fn use_program(&mut self, program: u32) {
        self.record(Call::UseProgram(program));
    }

    fn delete_program(&mut self, program: u32) {
        let mut gl = self.gl();
        if gl.program_names.release(program) {
            gl.programs.remove(&program);
        }
        gl.calls.push(Call::DeleteProgram(program));
    }

    fn uniform_location(&mut self, program: u32, name: &str) -> i32 {
        let mut gl = self.gl();
        gl.calls.push(Call::UniformLocation(program, name.to_owned()));
        gl.programs
            .get(&program)
            .and_then(|p| p.uniforms.iter().position(|u| u == name))
            .map_or(LOCATION_NOT_FOUND, |i| i as i32)
    }

    fn attrib_location(&mut self, program: u32, name: &str) -> i32 {
        let mut gl = self.gl();
        gl.calls.push(Call::AttribLocation(program, name.to_owned()));
        gl.programs
            .get(&program)
            .and_then(|p| p.attribs.iter().position(|a| a == name))
            .map_or(LOCATION_NOT_FOUND, |i| i as i32)
    }

    fn uniform_i32(&mut self, location: i32, value: i32) {
        self.record(Call::Uniform(location, vec![value as f32]));
    }

    fn uniform_f32(&mut self, location: i32, value: f32) {
        self.record(Call::Uniform(location, vec![value]));
    }

    fn uniform_vec2(&mut self, location: i32, value: &[f32; 2]) {
        self.record(Call::Uniform(location, value.to_vec()));
    }

    fn uniform_vec4(&mut self, location: i32, value: &[f32; 4]) {
        self.record(Call::Uniform(location, value.to_vec()));
    }

    fn uniform_mat4(&mut self, location: i32, value: &[f32; 16]) {
        self.record(Call::Uniform(location, value.to_vec()));
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        offset: i32,
    ) {
        self.record(Call::VertexAttribPointer { index, size, data_type, stride, offset });
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record(Call::EnableAttrib(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record(Call::DisableAttrib(index));
    }

    fn gen_buffer(&mut self) -> u32 {
        self.gl().buffers.alloc()
    }

    fn bind_buffer(&mut self, kind: BufferKind, buffer: u32) {
        self.record(Call::BindBuffer(kind, buffer));
    }

    fn buffer_storage(&mut self, kind: BufferKind, size: i32) {
        self.record(Call::BufferStorage(kind, size));
    }

    fn buffer_sub_data(&mut self, kind: BufferKind, offset: i32, data: &[u8]) {
        assert_eq!(offset, 0, "buffers are always overwritten from the start");
        self.record(Call::BufferSubData(kind, data.to_vec()));
    }

    fn delete_buffer(&mut self, buffer: u32) {
        let mut gl = self.gl();
        gl.buffers.release(buffer);
        gl.calls.push(Call::DeleteBuffer(buffer));
    }

    fn draw_triangles(&mut self, count: i32, byte_offset: i32) {
        self.record(Call::DrawTriangles(count, byte_offset));
    }
}
