use glam::Mat4;

/// A value that can be uploaded to a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Int(i32),
    /// Column-major.
    Mat4([f32; 16]),
}

impl UniformValue {
    /// The scalar value, if this is a float uniform.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(value: [f32; 2]) -> Self {
        UniformValue::Vec2(value)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(value: [f32; 3]) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value.to_cols_array())
    }
}

/// A filter-specific uniform, uploaded by name on every draw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShaderParameter {
    pub name: String,
    pub value: UniformValue,
}

impl ShaderParameter {
    pub fn new(name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        ShaderParameter {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered storage for the named uniforms of a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformStorage {
    parameters: Vec<ShaderParameter>,
}

impl UniformStorage {
    pub fn new(parameters: Vec<ShaderParameter>) -> Self {
        UniformStorage { parameters }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Set a uniform, returning the previous value if it was already present.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> Option<UniformValue> {
        let value = value.into();
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(param) => Some(std::mem::replace(&mut param.value, value)),
            None => {
                self.parameters.push(ShaderParameter::new(name, value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderParameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}
