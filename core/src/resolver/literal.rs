use log::debug;
use serde_json::Value;

/// Read a Python style literal such as `{'value': True, 'value_name': None}` as JSON.
/// Single quoted strings become JSON strings and `True`, `False`, `None` become `true`, `false`, `null`
pub(crate) fn parse_python_literal(text: &str) -> Option<Value> {
    let converted = python_literal_to_json(text);
    match serde_json::from_str(&converted) {
        Ok(result) => Some(result),
        Err(err) => {
            debug!("[resolver] Value is not a Python literal: {err:?}");
            None
        }
    }
}

fn python_literal_to_json(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut word = String::new();

    while let Some(current) = chars.next() {
        if current.is_ascii_alphanumeric() || current == '_' {
            word.push(current);
            continue;
        }
        flush_word(&mut word, &mut output);

        if current != '\'' && current != '"' {
            output.push(current);
            continue;
        }

        // Copy a quoted string, always emitting double quotes
        let quote = current;
        output.push('"');
        while let Some(inner) = chars.next() {
            match inner {
                '\\' => match chars.next() {
                    Some('\'') => output.push('\''),
                    Some(escaped) => {
                        output.push('\\');
                        output.push(escaped);
                    }
                    None => output.push_str("\\\\"),
                },
                '"' if quote == '\'' => output.push_str("\\\""),
                _ if inner == quote => break,
                _ => output.push(inner),
            }
        }
        output.push('"');
    }
    flush_word(&mut word, &mut output);
    output
}

fn flush_word(word: &mut String, output: &mut String) {
    match word.as_str() {
        "True" => output.push_str("true"),
        "False" => output.push_str("false"),
        "None" => output.push_str("null"),
        _ => output.push_str(word),
    }
    word.clear();
}
