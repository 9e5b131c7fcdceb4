//! Canonical text encoder.
//!
//! Tokens are separated by single spaces, with no space after `(` or before
//! `)`. The output is deterministic and reads back through the decoder.

use std::fmt::Write as _;

use super::descriptor::{
    EnumDescriptor, IfaceDescriptor, ParamDescriptor, ParamKind, ProcDescriptor, PropDescriptor,
};
use super::value::{GlueType, Value};

/// Token-level writer that handles separators.
#[derive(Debug, Default)]
pub struct TextWriter {
    buf: String,
    need_space: bool,
}

impl TextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn separate(&mut self) {
        if self.need_space {
            self.buf.push(' ');
        }
        self.need_space = true;
    }

    pub fn open(&mut self) -> &mut Self {
        self.separate();
        self.buf.push('(');
        self.need_space = false;
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.buf.push(')');
        self.need_space = true;
        self
    }

    pub fn uint(&mut self, v: u64) -> &mut Self {
        self.separate();
        let _ = write!(self.buf, "{}", v);
        self
    }

    /// Signed integers go out as an optional `-` glued to the magnitude.
    pub fn int(&mut self, v: i64) -> &mut Self {
        self.separate();
        if v < 0 {
            self.buf.push('-');
        }
        let _ = write!(self.buf, "{}", v.unsigned_abs());
        self
    }

    pub fn float(&mut self, v: f64) -> &mut Self {
        self.separate();
        if v.is_nan() {
            self.buf.push_str("nan");
        } else if v.is_infinite() {
            self.buf.push_str(if v < 0.0 { "-inf" } else { "inf" });
        } else {
            let _ = write!(self.buf, "{:?}", v);
        }
        self
    }

    pub fn bool(&mut self, v: bool) -> &mut Self {
        self.uint(u64::from(v))
    }

    /// A quoted string, or `NULL` for `None`.
    pub fn string(&mut self, s: Option<&str>) -> &mut Self {
        self.separate();
        match s {
            None => self.buf.push_str("NULL"),
            Some(s) => escape_into(&mut self.buf, s),
        }
        self
    }

    pub fn str(&mut self, s: &str) -> &mut Self {
        self.string(Some(s))
    }

    /// Parenthesized list of quoted strings.
    pub fn string_list<S: AsRef<str>>(&mut self, items: &[S]) -> &mut Self {
        self.open();
        for item in items {
            self.str(item.as_ref());
        }
        self.close()
    }

    /// Append an already encoded fragment as one token.
    pub fn raw(&mut self, fragment: &str) -> &mut Self {
        if !fragment.is_empty() {
            self.separate();
            self.buf.push_str(fragment);
        }
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

fn escape_into(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '\\' => buf.push_str("\\\\"),
            '"' => buf.push_str("\\\""),
            '\t' => buf.push_str("\\t"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\u{8}' => buf.push_str("\\b"),
            '\u{c}' => buf.push_str("\\f"),
            c if c.is_ascii_control() => {
                let _ = write!(buf, "\\{:03o}", c as u32);
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

/// Types with a canonical glue text form.
pub trait Encode {
    fn encode_into(&self, w: &mut TextWriter);

    fn encode(&self) -> String {
        let mut w = TextWriter::new();
        self.encode_into(&mut w);
        w.finish()
    }
}

fn type_id(w: &mut TextWriter, ty: GlueType) {
    w.uint(u64::from(ty.id()));
}

impl Encode for Value {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open();
        type_id(w, self.glue_type());
        match self {
            Value::None => {}
            Value::Bool(b) => {
                w.bool(*b);
            }
            Value::Int(i) => {
                w.int(i64::from(*i));
            }
            Value::Float(f) => {
                w.float(*f);
            }
            Value::Str(s) => {
                w.string(s.as_deref());
            }
            Value::Enum { type_name, index } => {
                w.str(type_name).uint(u64::from(*index));
            }
            Value::Proxy(p) => {
                w.uint(*p);
            }
            Value::Seq(items) => {
                for item in items {
                    item.encode_into(w);
                }
            }
            Value::Rec(rec) => {
                for (name, value) in rec.iter() {
                    w.str(name);
                    value.encode_into(w);
                }
            }
        }
        w.close();
    }
}

impl Encode for ParamDescriptor {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open();
        type_id(w, self.glue_type());
        w.string(self.name());
        match self.kind() {
            ParamKind::None => {}
            ParamKind::Bool { default } => {
                w.bool(*default);
            }
            ParamKind::Int {
                default,
                min,
                max,
                step,
            } => {
                for v in [default, min, max, step] {
                    w.int(i64::from(*v));
                }
            }
            ParamKind::Float {
                default,
                min,
                max,
                step,
            } => {
                for v in [default, min, max, step] {
                    w.float(*v);
                }
            }
            ParamKind::Str { default } => {
                w.string(default.as_deref());
            }
            ParamKind::Enum {
                enum_name,
                default_index,
            } => {
                w.str(enum_name).uint(u64::from(*default_index));
            }
            ParamKind::Proxy { iface_name } => {
                w.str(iface_name);
            }
        }
        w.close();
    }
}

impl Encode for PropDescriptor {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open();
        self.param.encode_into(w);
        w.string(self.group.as_deref())
            .string(self.pretty_name.as_deref())
            .string(self.blurb.as_deref())
            .uint(u64::from(self.flags));
        w.close();
    }
}

impl Encode for ProcDescriptor {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open();
        w.str(&self.name);
        self.return_param.encode_into(w);
        w.uint(self.params.len() as u64);
        for param in &self.params {
            param.encode_into(w);
        }
        w.close();
    }
}

impl Encode for IfaceDescriptor {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open()
            .str(&self.type_name)
            .string_list(&self.ancestor_ifaces)
            .string_list(&self.property_names)
            .string_list(&self.signal_names)
            .close();
    }
}

impl Encode for EnumDescriptor {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open()
            .str(&self.enum_name)
            .string_list(&self.values)
            .string_list(&self.blurbs)
            .close();
    }
}
