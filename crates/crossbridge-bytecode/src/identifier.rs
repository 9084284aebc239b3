//! Sanitizing source names into valid target identifiers.

const RESERVED: &[&str] = &[
    "_", "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long", "native", "new",
    "null", "package", "private", "protected", "public", "return", "short", "static", "strictfp", "super",
    "switch", "synchronized", "this", "throw", "throws", "transient", "true", "try", "void", "volatile",
    "while",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Rewrites `name` into a legal field name: reserved words gain a trailing
/// `$`, illegal characters become `$`, and a leading digit gets a `$`
/// prefix.
pub fn sanitize(name: &str) -> String {
    if is_reserved(name) {
        return format!("{name}$");
    }
    let mut out = String::with_capacity(name.len() + 1);
    if name.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.push('$');
    }
    out.extend(name.chars().map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '$' }));
    out
}

pub fn sanitize_all(names: &[String]) -> Vec<String> {
    names.iter().map(|name| sanitize(name)).collect()
}
