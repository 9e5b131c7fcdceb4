//! The closed command catalogue and the `EventSignal` push form.

use crate::codec::{
    parse_value, Encode, Expected, GlueType, ParseFailure, Parser, Position, TextWriter, Token,
    Value,
};

/// Numeric command ids. Id 2 is reserved and never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    EventSignal = 1,
    DescribeEnum = 3,
    DescribeIface = 4,
    DescribeProp = 5,
    DescribeProc = 6,
    ListProcNames = 7,
    ListMethodNames = 8,
    BaseIface = 9,
    IfaceChildren = 10,
    ProxyIface = 11,
    Exec = 12,
    SignalConnection = 13,
    ClientMsg = 14,
}

impl CommandId {
    pub const fn id(self) -> u64 {
        self as u64
    }

    pub fn from_id(id: u64) -> Option<Self> {
        let cmd = match id {
            1 => CommandId::EventSignal,
            3 => CommandId::DescribeEnum,
            4 => CommandId::DescribeIface,
            5 => CommandId::DescribeProp,
            6 => CommandId::DescribeProc,
            7 => CommandId::ListProcNames,
            8 => CommandId::ListMethodNames,
            9 => CommandId::BaseIface,
            10 => CommandId::IfaceChildren,
            11 => CommandId::ProxyIface,
            12 => CommandId::Exec,
            13 => CommandId::SignalConnection,
            14 => CommandId::ClientMsg,
            _ => return None,
        };
        Some(cmd)
    }
}

/// A request the caller can send and the responder can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    DescribeEnum { name: String },
    DescribeIface { iface: String },
    DescribeProp { proxy: u64, prop_name: String },
    DescribeProc { proc_name: String },
    ListProcNames,
    ListMethodNames { iface_name: String },
    BaseIface,
    IfaceChildren { iface_name: String },
    ProxyIface { proxy: u64 },
    /// `args` should be a `Seq`; anything else is answered with `None`
    Exec { proc_name: String, args: Value },
    SignalConnection { proxy: u64, enable: bool, signal: String },
    ClientMsg { message: Option<String>, value: Value },
}

impl Command {
    pub fn id(&self) -> CommandId {
        match self {
            Command::DescribeEnum { .. } => CommandId::DescribeEnum,
            Command::DescribeIface { .. } => CommandId::DescribeIface,
            Command::DescribeProp { .. } => CommandId::DescribeProp,
            Command::DescribeProc { .. } => CommandId::DescribeProc,
            Command::ListProcNames => CommandId::ListProcNames,
            Command::ListMethodNames { .. } => CommandId::ListMethodNames,
            Command::BaseIface => CommandId::BaseIface,
            Command::IfaceChildren { .. } => CommandId::IfaceChildren,
            Command::ProxyIface { .. } => CommandId::ProxyIface,
            Command::Exec { .. } => CommandId::Exec,
            Command::SignalConnection { .. } => CommandId::SignalConnection,
            Command::ClientMsg { .. } => CommandId::ClientMsg,
        }
    }

    /// Parse `( <command-id> <payload> )`. `None` means the failure is
    /// recorded in `p`.
    pub fn parse(p: &mut Parser<'_>) -> Option<Command> {
        if !p.expect_open() {
            return None;
        }
        let id = p.expect_uint();
        if p.failed() {
            return None;
        }
        let cmd = match CommandId::from_id(id) {
            None | Some(CommandId::EventSignal) => {
                p.fail("request command id");
                return None;
            }
            Some(CommandId::DescribeEnum) => Command::DescribeEnum {
                name: p.expect_string(),
            },
            Some(CommandId::DescribeIface) => Command::DescribeIface {
                iface: p.expect_string(),
            },
            Some(CommandId::DescribeProp) => Command::DescribeProp {
                proxy: p.expect_uint(),
                prop_name: p.expect_string(),
            },
            Some(CommandId::DescribeProc) => Command::DescribeProc {
                proc_name: p.expect_string(),
            },
            Some(CommandId::ListProcNames) => Command::ListProcNames,
            Some(CommandId::ListMethodNames) => Command::ListMethodNames {
                iface_name: p.expect_string(),
            },
            Some(CommandId::BaseIface) => Command::BaseIface,
            Some(CommandId::IfaceChildren) => Command::IfaceChildren {
                iface_name: p.expect_string(),
            },
            Some(CommandId::ProxyIface) => Command::ProxyIface {
                proxy: p.expect_uint(),
            },
            Some(CommandId::Exec) => Command::Exec {
                proc_name: p.expect_string(),
                args: parse_value(p),
            },
            Some(CommandId::SignalConnection) => Command::SignalConnection {
                proxy: p.expect_uint(),
                enable: p.expect_uint() != 0,
                signal: p.expect_string(),
            },
            Some(CommandId::ClientMsg) => Command::ClientMsg {
                message: p.expect_optional_string(),
                value: parse_value(p),
            },
        };
        p.expect_close();
        Some(cmd)
    }

    /// Decode one complete request message, closing `)` and end of input included.
    pub fn decode(text: &str) -> Result<Command, ParseFailure> {
        let mut p = Parser::new(text);
        let cmd = Command::parse(&mut p);
        p.expect_end();
        match (cmd, p.into_failure()) {
            (_, Some(failure)) => Err(failure),
            (Some(cmd), None) => Ok(cmd),
            (None, None) => Err(ParseFailure {
                expected: Expected::Valid("command".into()),
                found: Token::Eof,
                position: Position::default(),
            }),
        }
    }
}

impl Encode for Command {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open().uint(self.id().id());
        match self {
            Command::DescribeEnum { name } => {
                w.str(name);
            }
            Command::DescribeIface { iface } => {
                w.str(iface);
            }
            Command::DescribeProp { proxy, prop_name } => {
                w.uint(*proxy).str(prop_name);
            }
            Command::DescribeProc { proc_name } => {
                w.str(proc_name);
            }
            Command::ListProcNames | Command::BaseIface => {}
            Command::ListMethodNames { iface_name } | Command::IfaceChildren { iface_name } => {
                w.str(iface_name);
            }
            Command::ProxyIface { proxy } => {
                w.uint(*proxy);
            }
            Command::Exec { proc_name, args } => {
                w.str(proc_name);
                args.encode_into(w);
            }
            Command::SignalConnection {
                proxy,
                enable,
                signal,
            } => {
                w.uint(*proxy).bool(*enable).str(signal);
            }
            Command::ClientMsg { message, value } => {
                w.string(message.as_deref());
                value.encode_into(w);
            }
        }
        w.close();
    }
}

/// A signal notification pushed from the responder to the caller.
///
/// `connected == false` marks the final event of a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    pub signal: String,
    pub proxy: u64,
    pub args: Vec<Value>,
    pub connected: bool,
}

impl SignalEvent {
    /// Decode a pushed message.
    ///
    /// Returns `None` if the text is not an `EventSignal` form at all, and
    /// `Some(Err(..))` if it is one but the payload is malformed.
    pub fn decode(text: &str) -> Option<Result<SignalEvent, ParseFailure>> {
        let mut p = Parser::new(text);
        if !p.expect_open() {
            return None;
        }
        let id = p.expect_uint();
        if p.failed() || CommandId::from_id(id) != Some(CommandId::EventSignal) {
            return None;
        }

        let signal = p.expect_string();
        let proxy = p.expect_uint();
        let args = match parse_value(&mut p) {
            Value::Seq(items) => items,
            _ => {
                p.fail("argument sequence");
                Vec::new()
            }
        };
        let connected = p.expect_uint() != 0;
        p.expect_close();
        p.expect_end();

        Some(match p.into_failure() {
            Some(failure) => Err(failure),
            None => Ok(SignalEvent {
                signal,
                proxy,
                args,
                connected,
            }),
        })
    }
}

impl Encode for SignalEvent {
    fn encode_into(&self, w: &mut TextWriter) {
        w.open()
            .uint(CommandId::EventSignal.id())
            .str(&self.signal)
            .uint(self.proxy);
        w.open().uint(u64::from(GlueType::Seq.id()));
        for arg in &self.args {
            arg.encode_into(w);
        }
        w.close();
        w.bool(self.connected).close();
    }
}
