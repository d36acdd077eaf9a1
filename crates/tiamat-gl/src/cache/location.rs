use std::collections::HashMap;

use crate::device::LOCATION_NOT_FOUND;
use crate::handle::Program;

/// Resolved uniform slot of a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(i32);

impl UniformLocation {
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

/// Resolved vertex attribute index of a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttribLocation(u32);

impl AttribLocation {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Per-program name → location memo.
///
/// A name is resolved through the device the first time it is asked for and
/// served from memory afterwards. Entries of a program must be dropped before
/// the program is deleted, since the device may hand the same id out again.
///
/// A name the program does not define is a broken shader/engine contract and
/// panics rather than returning an error.
#[derive(Debug, Default)]
pub(crate) struct LocationCache {
    uniforms: HashMap<Program, HashMap<String, UniformLocation>>,
    attribs: HashMap<Program, HashMap<String, AttribLocation>>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform(
        &mut self,
        program: Program,
        name: &str,
        resolve: impl FnOnce(&str) -> i32,
    ) -> UniformLocation {
        let names = self.uniforms.entry(program).or_default();
        if let Some(&location) = names.get(name) {
            return location;
        }

        let raw = resolve(name);
        if raw == LOCATION_NOT_FOUND {
            panic!("gl: invalid uniform location: {name}");
        }

        let location = UniformLocation(raw);
        names.insert(name.to_owned(), location);
        location
    }

    pub fn attrib(
        &mut self,
        program: Program,
        name: &str,
        resolve: impl FnOnce(&str) -> i32,
    ) -> AttribLocation {
        let names = self.attribs.entry(program).or_default();
        if let Some(&location) = names.get(name) {
            return location;
        }

        let raw = resolve(name);
        let Ok(index) = u32::try_from(raw) else {
            panic!("gl: invalid attrib location: {name}");
        };

        let location = AttribLocation(index);
        names.insert(name.to_owned(), location);
        location
    }

    pub fn forget_program(&mut self, program: Program) {
        self.uniforms.remove(&program);
        self.attribs.remove(&program);
    }

    #[cfg(test)]
    pub fn contains_program(&self, program: Program) -> bool {
        self.uniforms.contains_key(&program) || self.attribs.contains_key(&program)
    }
}
