//! The part of materials and shader programs the buffer manager reads.

use crate::context::UniformLocation;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A compiled shader program.
pub trait ShaderProgram {
    /// Device location of the uniform named `name`, if the program uses it.
    fn uniform_location(&self, name: &str) -> Option<UniformLocation>;
}

/// A [`ShaderProgram`] answering from a fixed uniform table.
///
/// Useful when the program reflection has been done elsewhere.
#[derive(Clone, Debug, Default)]
pub struct UniformTable {
    uniforms: HashMap<String, UniformLocation>,
}

impl UniformTable {
    /// An empty table.
    pub fn new() -> UniformTable {
        UniformTable::default()
    }

    /// Registers a uniform.
    pub fn with_uniform(mut self, name: &str, location: UniformLocation) -> Self {
        let _ = self.uniforms.insert(name.to_string(), location);
        self
    }
}

impl ShaderProgram for UniformTable {
    fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied()
    }
}

/// Rendering state attached to an object.
#[derive(Clone)]
pub struct Material {
    /// Objects whose material is not visible are skipped entirely by updates.
    pub visible: bool,
    /// The program built for this material, `None` until it is compiled.
    pub program: Option<Rc<dyn ShaderProgram>>,
}

impl Material {
    /// A visible material without program.
    pub fn new() -> Material {
        Material {
            visible: true,
            program: None,
        }
    }

    /// A visible material with an already built program.
    pub fn with_program(program: Rc<dyn ShaderProgram>) -> Material {
        Material {
            visible: true,
            program: Some(program),
        }
    }

    /// Wraps this material for sharing between objects.
    pub fn shared(self) -> Rc<RefCell<Material>> {
        Rc::new(RefCell::new(self))
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::new()
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("visible", &self.visible)
            .field("program", &self.program.is_some())
            .finish()
    }
}
