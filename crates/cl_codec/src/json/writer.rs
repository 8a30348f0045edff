use core::fmt::{Display, Write};

use super::MAX_DEPTH;
use crate::error::RuntimeError;

#[derive(Clone, Copy)]
struct Frame {
    array: bool,
    empty: bool,
}

/// A compact JSON writer.
///
/// Separators are inserted automatically; no whitespace is written.
/// Containers nest at most [`MAX_DEPTH`] deep, as for the reader.
///
/// # Examples
///
/// ```
/// use cl_codec::json::JsonWriter;
///
/// let mut writer = JsonWriter::new();
/// writer.begin_array()?;
/// writer.begin_object()?;
/// writer.key("_t");
/// writer.write_string("IRoot");
/// writer.key("RootInt");
/// writer.write_number(42);
/// writer.key("RootString");
/// writer.write_null();
/// writer.end_object();
/// writer.end_array();
///
/// assert_eq!(writer.as_str(), r#"[{"_t":"IRoot","RootInt":42,"RootString":null}]"#);
/// # Ok::<(), cl_codec::RuntimeError>(())
/// ```
#[derive(Default)]
pub struct JsonWriter {
    out: String,
    stack: Vec<Frame>,
}

impl JsonWriter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn before_value(&mut self) {
        if let Some(frame) = self.stack.last_mut()
            && frame.array
        {
            if !frame.empty {
                self.out.push(',');
            }
            frame.empty = false;
        }
    }

    fn open(&mut self, bracket: char, array: bool) -> Result<(), RuntimeError> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(RuntimeError::new(format!(
                "Maximum nesting depth of {MAX_DEPTH} is exceeded"
            )));
        }
        self.before_value();
        self.out.push(bracket);
        self.stack.push(Frame { array, empty: true });
        Ok(())
    }

    #[inline]
    pub fn begin_array(&mut self) -> Result<(), RuntimeError> {
        self.open('[', true)
    }

    pub fn end_array(&mut self) {
        self.stack.pop();
        self.out.push(']');
    }

    #[inline]
    pub fn begin_object(&mut self) -> Result<(), RuntimeError> {
        self.open('{', false)
    }

    pub fn end_object(&mut self) {
        self.stack.pop();
        self.out.push('}');
    }

    /// Writes a property name; the value must follow.
    pub fn key(&mut self, name: &str) {
        if let Some(frame) = self.stack.last_mut() {
            if !frame.empty {
                self.out.push(',');
            }
            frame.empty = false;
        }
        escape_into(&mut self.out, name);
        self.out.push(':');
    }

    pub fn write_null(&mut self) {
        self.before_value();
        self.out.push_str("null");
    }

    pub fn write_bool(&mut self, value: bool) {
        self.before_value();
        self.out.push_str(if value { "true" } else { "false" });
    }

    /// Writes the `Display` form of a number as is.
    pub fn write_number(&mut self, value: impl Display) {
        self.before_value();
        // Writing into a `String` cannot fail.
        let _ = write!(self.out, "{value}");
    }

    pub fn write_string(&mut self, value: &str) {
        self.before_value();
        escape_into(&mut self.out, value);
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.out
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.out
    }
}

fn escape_into(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{JsonWriter, MAX_DEPTH};

    #[test]
    fn nested_containers() {
        let mut writer = JsonWriter::new();
        writer.begin_array().unwrap();
        writer.begin_array().unwrap();
        writer.end_array();
        writer.write_number(1.5);
        writer.begin_object().unwrap();
        writer.key("a");
        writer.begin_array().unwrap();
        writer.write_bool(true);
        writer.write_string("x");
        writer.end_array();
        writer.end_object();
        writer.end_array();

        assert_eq!(writer.into_string(), r#"[[],1.5,{"a":[true,"x"]}]"#);
    }

    #[test]
    fn depth_is_limited() {
        let mut writer = JsonWriter::new();
        for _ in 0..MAX_DEPTH {
            writer.begin_array().unwrap();
        }
        let err = writer.begin_object().unwrap_err();
        assert_eq!(err.message(), "Maximum nesting depth of 64 is exceeded");
    }

    #[test]
    fn escapes() {
        let mut writer = JsonWriter::new();
        writer.write_string("q\"b\\\n\u{0}é");
        assert_eq!(writer.as_str(), r#""q\"b\\\n\u0000é""#);
        serde_json::from_str::<String>(writer.as_str()).unwrap();
    }
}
