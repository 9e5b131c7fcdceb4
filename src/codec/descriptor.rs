//! Introspection descriptors: parameters, properties, procedures,
//! interfaces and enums.

use serde::{Deserialize, Serialize};

use super::value::GlueType;
use crate::error::{GlueError, Result};

/// Type-specific payload of a parameter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    None,
    Bool {
        #[serde(default)]
        default: bool,
    },
    Int {
        default: i32,
        min: i32,
        max: i32,
        #[serde(default = "default_int_step")]
        step: i32,
    },
    Float {
        default: f64,
        min: f64,
        max: f64,
        #[serde(default = "default_float_step")]
        step: f64,
    },
    Str {
        #[serde(default)]
        default: Option<String>,
    },
    Enum {
        enum_name: String,
        #[serde(default)]
        default_index: u32,
    },
    Proxy {
        iface_name: String,
    },
}

fn default_int_step() -> i32 {
    1
}

fn default_float_step() -> f64 {
    1.0
}

/// Raise `max` to `min` if needed, then pull `default` into `[min, max]`.
///
/// Comparisons are written out so that a NaN bound never panics.
fn normalize_range<T: PartialOrd + Copy>(default: T, min: T, max: T) -> (T, T, T) {
    let max = if max < min { min } else { max };
    let default = if default < min {
        min
    } else if default > max {
        max
    } else {
        default
    };
    (default, min, max)
}

impl ParamKind {
    /// Wire type of this payload.
    pub fn glue_type(&self) -> GlueType {
        match self {
            ParamKind::None => GlueType::None,
            ParamKind::Bool { .. } => GlueType::Bool,
            ParamKind::Int { .. } => GlueType::IntRange,
            ParamKind::Float { .. } => GlueType::FloatRange,
            ParamKind::Str { .. } => GlueType::Str,
            ParamKind::Enum { .. } => GlueType::Enum,
            ParamKind::Proxy { .. } => GlueType::Proxy,
        }
    }

    fn normalized(self) -> Self {
        match self {
            ParamKind::Int {
                default,
                min,
                max,
                step,
            } => {
                let (default, min, max) = normalize_range(default, min, max);
                ParamKind::Int {
                    default,
                    min,
                    max,
                    step,
                }
            }
            ParamKind::Float {
                default,
                min,
                max,
                step,
            } => {
                let (default, min, max) = normalize_range(default, min, max);
                ParamKind::Float {
                    default,
                    min,
                    max,
                    step,
                }
            }
            other => other,
        }
    }
}

/// A typed parameter (or return value) of a procedure or property.
///
/// Range payloads are normalized on every construction path, including
/// deserialization, so `min <= default <= max` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParamDescriptor")]
pub struct ParamDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(flatten)]
    kind: ParamKind,
}

#[derive(Deserialize)]
struct RawParamDescriptor {
    #[serde(default)]
    name: Option<String>,
    #[serde(flatten)]
    kind: ParamKind,
}

impl From<RawParamDescriptor> for ParamDescriptor {
    fn from(raw: RawParamDescriptor) -> Self {
        ParamDescriptor::new(raw.name, raw.kind)
    }
}

impl ParamDescriptor {
    pub fn new(name: Option<String>, kind: ParamKind) -> Self {
        Self {
            name,
            kind: kind.normalized(),
        }
    }

    /// A named input parameter.
    pub fn named(name: impl Into<String>, kind: ParamKind) -> Self {
        Self::new(Some(name.into()), kind)
    }

    /// An unnamed return value.
    pub fn returns(kind: ParamKind) -> Self {
        Self::new(None, kind)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn glue_type(&self) -> GlueType {
        self.kind.glue_type()
    }
}

/// A property of an object, described by its parameter plus presentation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDescriptor {
    pub param: ParamDescriptor,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub pretty_name: Option<String>,
    #[serde(default)]
    pub blurb: Option<String>,
    #[serde(default)]
    pub flags: u32,
}

impl PropDescriptor {
    pub fn new(param: ParamDescriptor) -> Self {
        Self {
            param,
            group: None,
            pretty_name: None,
            blurb: None,
            flags: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcDescriptor {
    pub name: String,
    pub return_param: ParamDescriptor,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
}

impl ProcDescriptor {
    /// Every input parameter must carry a name.
    pub fn validate(&self) -> Result<()> {
        if let Some(pos) = self.params.iter().position(|p| p.name().is_none()) {
            return Err(GlueError::Descriptor(format!(
                "proc `{}` parameter {} has no name",
                self.name, pos
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfaceDescriptor {
    pub type_name: String,
    /// The interface itself first, then its ancestors up to the root
    pub ancestor_ifaces: Vec<String>,
    #[serde(default)]
    pub property_names: Vec<String>,
    #[serde(default)]
    pub signal_names: Vec<String>,
}

impl IfaceDescriptor {
    pub fn validate(&self) -> Result<()> {
        if self.ancestor_ifaces.is_empty() {
            return Err(GlueError::Descriptor(format!(
                "iface `{}` has no ancestors",
                self.type_name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub enum_name: String,
    pub values: Vec<String>,
    pub blurbs: Vec<String>,
}

impl EnumDescriptor {
    pub fn validate(&self) -> Result<()> {
        if self.values.is_empty() {
            return Err(GlueError::Descriptor(format!(
                "enum `{}` has no values",
                self.enum_name
            )));
        }
        if self.values.len() != self.blurbs.len() {
            return Err(GlueError::Descriptor(format!(
                "enum `{}` has {} values but {} blurbs",
                self.enum_name,
                self.values.len(),
                self.blurbs.len()
            )));
        }
        Ok(())
    }
}
