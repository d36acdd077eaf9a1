use super::connection::Connection;
use crate::cache::{AttribLocation, UniformLocation};
use crate::error::{Error, Result};
use crate::handle::{DataType, Program, Shader, ShaderKind};

/// Value uploaded to a named uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix.
    Mat4([f32; 16]),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        Self::Vec2(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        Self::Vec4(value)
    }
}

impl From<[f32; 16]> for UniformValue {
    fn from(value: [f32; 16]) -> Self {
        Self::Mat4(value)
    }
}

impl Connection {
    // ── shaders ───────────────────────────────────────────────────────────

    pub fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<Shader> {
        let shader = Shader::from_raw(self.device.create_shader(kind));
        if shader.is_invalid() {
            return Err(Error::creation("shader", format!("device returned no {kind:?} shader name")));
        }

        self.device.shader_source(shader.raw(), source);
        self.device.compile_shader(shader.raw());

        if !self.device.shader_compile_status(shader.raw()) {
            let log = self
                .device
                .shader_info_log(shader.raw())
                .unwrap_or_else(|| format!("{kind:?} shader did not compile"));
            self.device.delete_shader(shader.raw());
            return Err(Error::Compile(log));
        }

        log::debug!("compiled {kind:?} shader {}", shader.raw());
        Ok(shader)
    }

    /// Unconditional; a shader attached to a linked program may go at any time.
    pub fn delete_shader(&mut self, shader: Shader) {
        self.device.delete_shader(shader.raw());
    }

    // ── programs ──────────────────────────────────────────────────────────

    pub fn link_program(&mut self, shaders: &[Shader]) -> Result<Program> {
        let program = Program::from_raw(self.device.create_program());
        if program.is_invalid() {
            return Err(Error::creation("program", "device returned no program name"));
        }

        for shader in shaders {
            self.device.attach_shader(program.raw(), shader.raw());
        }
        self.device.link_program(program.raw());

        if !self.device.program_link_status(program.raw()) {
            let log = self
                .device
                .program_info_log(program.raw())
                .unwrap_or_else(|| "link status is false".to_owned());
            self.device.delete_program(program.raw());
            return Err(Error::Link(log));
        }

        log::debug!("linked program {} from {} shaders", program.raw(), shaders.len());
        Ok(program)
    }

    pub fn use_program(&mut self, program: Program) {
        self.device.use_program(program.raw());
    }

    pub fn delete_program(&mut self, program: Program) {
        if program.is_invalid() || !self.device.is_program(program.raw()) {
            return;
        }

        // The id may be handed out again right after the delete.
        self.locations.forget_program(program);
        self.device.delete_program(program.raw());
        log::debug!("deleted program {}", program.raw());
    }

    // ── locations ─────────────────────────────────────────────────────────

    /// Panics if `program` has no active uniform called `name`.
    pub fn uniform_location(&mut self, program: Program, name: &str) -> UniformLocation {
        let device = &mut self.device;
        self.locations
            .uniform(program, name, |name| device.uniform_location(program.raw(), name))
    }

    /// Panics if `program` has no active attribute called `name`.
    pub fn attrib_location(&mut self, program: Program, name: &str) -> AttribLocation {
        let device = &mut self.device;
        self.locations
            .attrib(program, name, |name| device.attrib_location(program.raw(), name))
    }

    pub fn set_uniform(&mut self, program: Program, name: &str, value: UniformValue) {
        let location = self.uniform_location(program, name).raw();
        match value {
            UniformValue::Int(v) => self.device.uniform_i32(location, v),
            UniformValue::Float(v) => self.device.uniform_f32(location, v),
            UniformValue::Vec2(v) => self.device.uniform_vec2(location, &v),
            UniformValue::Vec4(v) => self.device.uniform_vec4(location, &v),
            UniformValue::Mat4(v) => self.device.uniform_mat4(location, &v),
        }
    }

    // ── attributes ────────────────────────────────────────────────────────

    pub fn vertex_attrib_pointer(
        &mut self,
        program: Program,
        name: &str,
        size: i32,
        data_type: DataType,
        stride: i32,
        offset: i32,
    ) {
        let index = self.attrib_location(program, name).index();
        self.device.vertex_attrib_pointer(index, size, data_type, stride, offset);
    }

    pub fn enable_vertex_attrib_array(&mut self, program: Program, name: &str) {
        let index = self.attrib_location(program, name).index();
        self.device.enable_vertex_attrib_array(index);
    }

    pub fn disable_vertex_attrib_array(&mut self, program: Program, name: &str) {
        let index = self.attrib_location(program, name).index();
        self.device.disable_vertex_attrib_array(index);
    }
}
