//! Text codec for glue values and introspection descriptors.
//!
//! - `lexer`: tokens of the s-expression-like grammar
//! - `parser`: sticky-failure grammar driver
//! - `value` / `descriptor`: the data model
//! - `encode` / `decode`: canonical text form in both directions

pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod lexer;
pub mod parser;
pub mod value;

pub use decode::{
    decode_value, parse_enum, parse_iface, parse_param, parse_proc, parse_prop, parse_string_list,
    parse_value,
};
pub use descriptor::{
    EnumDescriptor, IfaceDescriptor, ParamDescriptor, ParamKind, ProcDescriptor, PropDescriptor,
};
pub use encode::{Encode, TextWriter};
pub use lexer::{Lexer, Position, Token};
pub use parser::{Expected, MAX_NESTING_DEPTH, ParseFailure, Parser};
pub use value::{GlueType, Record, Value};
