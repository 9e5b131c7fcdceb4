//! Grammar rules for values, descriptors and string lists.
//!
//! Every rule returns an owned result even when the parse aborts midway; the
//! caller decides what to do with a partial tree by checking the parser's
//! failure once at the end.

use super::descriptor::{
    EnumDescriptor, IfaceDescriptor, ParamDescriptor, ParamKind, ProcDescriptor, PropDescriptor,
};
use super::parser::Parser;
use super::value::{GlueType, Record, Value};
use crate::error::{GlueError, Result};

/// `( <type-id> <payload> )`
///
/// Nesting deeper than [`MAX_NESTING_DEPTH`](super::parser::MAX_NESTING_DEPTH)
/// fails the parse and yields a `None` placeholder.
pub fn parse_value(p: &mut Parser<'_>) -> Value {
    if !p.enter() {
        return Value::None;
    }
    let value = parse_value_body(p);
    p.leave();
    value
}

fn parse_value_body(p: &mut Parser<'_>) -> Value {
    if !p.expect_open() {
        return Value::None;
    }
    let id = p.expect_uint();
    if p.failed() {
        return Value::None;
    }
    let Some(ty) = GlueType::from_id(id) else {
        p.fail("known glue type id");
        return Value::None;
    };

    let value = match ty {
        GlueType::None => Value::None,
        GlueType::Bool => Value::Bool(p.expect_uint() != 0),
        GlueType::IntRange => Value::Int(p.expect_i32()),
        GlueType::FloatRange => Value::Float(p.expect_f64()),
        GlueType::Str => Value::Str(p.expect_optional_string()),
        GlueType::Enum => {
            // NULL type names are read as empty
            let type_name = p.expect_optional_string().unwrap_or_default();
            let index = p.expect_u32();
            Value::Enum { type_name, index }
        }
        GlueType::Proxy => Value::Proxy(p.expect_uint()),
        GlueType::Seq => {
            let mut items = Vec::new();
            while !p.at_close() {
                items.push(parse_value(p));
            }
            Value::Seq(items)
        }
        GlueType::Rec => {
            let mut rec = Record::new();
            while !p.at_close() {
                let name = p.expect_string();
                let field = parse_value(p);
                rec.set(name, field);
            }
            Value::Rec(rec)
        }
    };
    p.expect_close();
    value
}

/// `( <type-id> <name> <fields> )`
///
/// The name may be `NULL` only when `need_name` is false, as for return values.
pub fn parse_param(p: &mut Parser<'_>, need_name: bool) -> ParamDescriptor {
    let placeholder = || ParamDescriptor::returns(ParamKind::None);
    if !p.expect_open() {
        return placeholder();
    }
    let id = p.expect_uint();
    if p.failed() {
        return placeholder();
    }
    let ty = match GlueType::from_id(id) {
        Some(GlueType::Seq | GlueType::Rec) => {
            p.fail(format!("parameter type, can't handle glue type {}", id));
            return placeholder();
        }
        Some(ty) => ty,
        None => {
            p.fail("known glue type id");
            return placeholder();
        }
    };
    let name = if need_name {
        Some(p.expect_string())
    } else {
        p.expect_optional_string()
    };

    let kind = match ty {
        GlueType::Bool => ParamKind::Bool {
            default: p.expect_uint() != 0,
        },
        GlueType::IntRange => ParamKind::Int {
            default: p.expect_i32(),
            min: p.expect_i32(),
            max: p.expect_i32(),
            step: p.expect_i32(),
        },
        GlueType::FloatRange => ParamKind::Float {
            default: p.expect_f64(),
            min: p.expect_f64(),
            max: p.expect_f64(),
            step: p.expect_f64(),
        },
        GlueType::Str => ParamKind::Str {
            default: p.expect_optional_string(),
        },
        GlueType::Enum => ParamKind::Enum {
            enum_name: p.expect_string(),
            default_index: p.expect_u32(),
        },
        GlueType::Proxy => ParamKind::Proxy {
            iface_name: p.expect_string(),
        },
        GlueType::None | GlueType::Seq | GlueType::Rec => ParamKind::None,
    };
    p.expect_close();
    ParamDescriptor::new(name, kind)
}

/// `( <string>* )`
pub fn parse_string_list(p: &mut Parser<'_>) -> Vec<String> {
    let mut items = Vec::new();
    if !p.expect_open() {
        return items;
    }
    while !p.at_close() {
        items.push(p.expect_string());
    }
    p.expect_close();
    items
}

/// `( "name" (<values>) (<blurbs>) )`
///
/// Returns `None` only if nothing of the descriptor could be read.
pub fn parse_enum(p: &mut Parser<'_>) -> Option<EnumDescriptor> {
    if !p.expect_open() {
        return None;
    }
    let enum_name = p.expect_string();
    if p.failed() {
        return None;
    }
    let values = parse_string_list(p);
    let blurbs = parse_string_list(p);
    p.expect_close();

    let desc = EnumDescriptor {
        enum_name,
        values,
        blurbs,
    };
    if !p.failed() {
        if let Err(e) = desc.validate() {
            log::warn!("{}", e);
        }
    }
    Some(desc)
}

/// `( "type" (<ancestors>) (<props>) (<signals>) )`
pub fn parse_iface(p: &mut Parser<'_>) -> Option<IfaceDescriptor> {
    if !p.expect_open() {
        return None;
    }
    let type_name = p.expect_string();
    if p.failed() {
        return None;
    }
    let ancestor_ifaces = parse_string_list(p);
    let property_names = parse_string_list(p);
    let signal_names = parse_string_list(p);
    p.expect_close();

    let desc = IfaceDescriptor {
        type_name,
        ancestor_ifaces,
        property_names,
        signal_names,
    };
    if !p.failed() {
        if let Err(e) = desc.validate() {
            log::warn!("{}", e);
        }
    }
    Some(desc)
}

/// `( <param> <group> <pretty_name> <blurb> <flags> )`
pub fn parse_prop(p: &mut Parser<'_>) -> Option<PropDescriptor> {
    if !p.expect_open() {
        return None;
    }
    let param = parse_param(p, true);
    if p.failed() {
        return None;
    }
    let group = p.expect_optional_string();
    let pretty_name = p.expect_optional_string();
    let blurb = p.expect_optional_string();
    let flags = p.expect_u32();
    p.expect_close();
    Some(PropDescriptor {
        param,
        group,
        pretty_name,
        blurb,
        flags,
    })
}

/// `( "name" <return-param> <n-params> <param>* )`
pub fn parse_proc(p: &mut Parser<'_>) -> Option<ProcDescriptor> {
    if !p.expect_open() {
        return None;
    }
    let name = p.expect_string();
    if p.failed() {
        return None;
    }
    let return_param = parse_param(p, false);
    let count = p.expect_uint();
    let mut params = Vec::new();
    for _ in 0..count {
        if p.failed() {
            break;
        }
        params.push(parse_param(p, true));
    }
    p.expect_close();
    Some(ProcDescriptor {
        name,
        return_param,
        params,
    })
}

/// Decode a complete value text; trailing tokens are an error.
pub fn decode_value(text: &str) -> Result<Value> {
    let mut p = Parser::new(text);
    let value = parse_value(&mut p);
    p.expect_end();
    match p.into_failure() {
        Some(failure) => Err(GlueError::Parse(failure.to_string())),
        None => Ok(value),
    }
}
