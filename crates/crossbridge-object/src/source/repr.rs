//! `repr()` for source values, guarding against self-referencing containers.

use std::fmt::Write;

use num_bigint::BigInt;

use super::types::HintForm;
use super::value::{SourceKind, SourceValue};
use crate::ObjectId;

pub(crate) fn repr(value: &SourceValue) -> String {
    let mut out = String::new();
    let mut seen = Vec::new();
    write_repr(value, &mut out, &mut seen);
    out
}

pub(crate) fn float_repr(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn write_str_literal(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn write_bytes_literal(bytes: &[u8], out: &mut String) {
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push('\'');
}

fn write_seq(items: &[SourceValue], out: &mut String, seen: &mut Vec<ObjectId>) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_repr(item, out, seen);
    }
}

fn type_label(value: &SourceValue) -> String {
    match value.as_type() {
        Some(ty) => match ty.module() {
            Some(module) if module != "builtins" => format!("{}.{}", module, ty.qualname()),
            _ => ty.qualname().to_string(),
        },
        None => repr(value),
    }
}

fn write_repr(value: &SourceValue, out: &mut String, seen: &mut Vec<ObjectId>) {
    let id = value.id();
    let container = matches!(
        value.kind(),
        SourceKind::List(_) | SourceKind::Dict(_) | SourceKind::Set(_) | SourceKind::Tuple(_)
    );
    if container {
        if seen.contains(&id) {
            out.push_str(match value.kind() {
                SourceKind::Dict(_) => "{...}",
                _ => "[...]",
            });
            return;
        }
        seen.push(id);
    }

    match value.kind() {
        SourceKind::None => out.push_str("None"),
        SourceKind::NotImplemented => out.push_str("NotImplemented"),
        SourceKind::Bool(b) => out.push_str(if *b { "True" } else { "False" }),
        SourceKind::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        SourceKind::Float(f) => out.push_str(&float_repr(*f)),
        SourceKind::Decimal(d) => {
            let _ = write!(out, "Decimal('{}')", d);
        }
        SourceKind::Complex { real, imag } => {
            let sign = if *imag < 0.0 { '-' } else { '+' };
            let _ = write!(out, "({}{}{}j)", float_repr(*real), sign, float_repr(imag.abs()));
        }
        SourceKind::Str(s) => write_str_literal(s, out),
        SourceKind::Bytes(b) => write_bytes_literal(b, out),
        SourceKind::ByteArray(b) => {
            out.push_str("bytearray(");
            write_bytes_literal(&b.borrow(), out);
            out.push(')');
        }
        SourceKind::Tuple(items) => {
            out.push('(');
            write_seq(items, out, seen);
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        SourceKind::List(items) => {
            out.push('[');
            let items = items.borrow().clone();
            write_seq(&items, out, seen);
            out.push(']');
        }
        SourceKind::Set(items) => {
            let items: Vec<SourceValue> = items.borrow().iter().cloned().collect();
            if items.is_empty() {
                out.push_str("set()");
            } else {
                out.push('{');
                write_seq(&items, out, seen);
                out.push('}');
            }
        }
        SourceKind::FrozenSet(items) => {
            let items: Vec<SourceValue> = items.iter().cloned().collect();
            out.push_str("frozenset(");
            if !items.is_empty() {
                out.push('{');
                write_seq(&items, out, seen);
                out.push('}');
            }
            out.push(')');
        }
        SourceKind::Dict(entries) => {
            let entries: Vec<(SourceValue, SourceValue)> =
                entries.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_repr(k, out, seen);
                out.push_str(": ");
                write_repr(v, out, seen);
            }
            out.push('}');
        }
        SourceKind::Slice { start, stop, step } => {
            out.push_str("slice(");
            write_seq(&[start.clone(), stop.clone(), step.clone()], out, seen);
            out.push(')');
        }
        SourceKind::Range { start, stop, step } => {
            out.push_str("range(");
            let unit_step = step.as_int().map_or(false, |s| *s == BigInt::from(1));
            if unit_step {
                write_seq(&[start.clone(), stop.clone()], out, seen);
            } else {
                write_seq(&[start.clone(), stop.clone(), step.clone()], out, seen);
            }
            out.push(')');
        }
        SourceKind::Date(d) => {
            let _ = write!(out, "datetime.date({}, {}, {})", d.year, d.month, d.day);
        }
        SourceKind::Time(t) => {
            let _ = write!(out, "datetime.time({}, {}, {}, {})", t.hour, t.minute, t.second, t.microsecond);
        }
        SourceKind::DateTime(dt) => {
            let _ = write!(
                out,
                "datetime.datetime({}, {}, {}, {}, {}, {}, {})",
                dt.date.year, dt.date.month, dt.date.day, dt.time.hour, dt.time.minute, dt.time.second,
                dt.time.microsecond
            );
        }
        SourceKind::TimeDelta(td) => {
            let _ = write!(
                out,
                "datetime.timedelta(days={}, seconds={}, microseconds={})",
                td.days(),
                td.seconds(),
                td.microseconds()
            );
        }
        SourceKind::Type(_) => {
            let _ = write!(out, "<class '{}'>", type_label(value));
        }
        SourceKind::Hint(form) => match form {
            HintForm::Any => out.push_str("typing.Any"),
            HintForm::Generic { origin, args } => {
                out.push_str(&type_label(origin));
                out.push('[');
                let labels: Vec<String> = args.iter().map(type_label).collect();
                out.push_str(&labels.join(", "));
                out.push(']');
            }
            HintForm::Union(members) => {
                let labels: Vec<String> = members.iter().map(type_label).collect();
                let _ = write!(out, "typing.Union[{}]", labels.join(", "));
            }
            HintForm::ClassVar(inner) => {
                let _ = write!(out, "typing.ClassVar[{}]", type_label(inner));
            }
            HintForm::Annotated { inner, .. } => {
                let _ = write!(out, "typing.Annotated[{}, ...]", type_label(inner));
            }
            HintForm::ForwardRef(name) => {
                let _ = write!(out, "ForwardRef('{}')", name);
            }
        },
        SourceKind::Module(module) => {
            let _ = write!(out, "<module '{}'>", module.name());
        }
        SourceKind::Function(function) => {
            let _ = write!(out, "<function {} at {}>", function.qualname(), id);
        }
        SourceKind::Code(code) => {
            let _ = write!(out, "<code object {} at {}, file \"{}\">", code.name, id, code.filename);
        }
        SourceKind::Cell(cell) => match cell.borrow().as_ref() {
            Some(contents) => {
                let _ = write!(out, "<cell at {}: {} object>", id, contents.type_name());
            }
            None => {
                let _ = write!(out, "<cell at {}: empty>", id);
            }
        },
        SourceKind::Instance(instance) => {
            let _ = write!(out, "<{} object at {}>", type_label(instance.class()), id);
        }
        SourceKind::Exception(exception) => {
            out.push_str(&exception.type_name());
            out.push('(');
            write_seq(exception.args(), out, seen);
            out.push(')');
        }
        SourceKind::Iterator(_) => {
            let _ = write!(out, "<iterator at {}>", id);
        }
        SourceKind::Native(native) => {
            let _ = write!(out, "<built-in function {}>", native.name());
        }
        SourceKind::Foreign(target) => {
            let _ = write!(out, "<foreign {:?}>", target);
        }
    }

    if container {
        seen.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_referencing_list_prints_ellipsis() {
        let list = SourceValue::list(vec![SourceValue::int(1)]);
        list.as_list().unwrap().borrow_mut().push(list.clone());
        assert_eq!(repr(&list), "[1, [...]]");
    }

    #[test]
    fn scalars_follow_runtime_formatting() {
        assert_eq!(repr(&SourceValue::float(2.0)), "2.0");
        assert_eq!(repr(&SourceValue::str("it's")), "'it\\'s'");
        assert_eq!(repr(&SourceValue::tuple(vec![SourceValue::none()])), "(None,)");
        assert_eq!(repr(&SourceValue::bytes(vec![0u8, b'a'])), "b'\\x00a'");
    }
}
