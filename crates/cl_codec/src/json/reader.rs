use core::str::FromStr;
use std::borrow::Cow;

use crate::error::RuntimeError;

/// Maximum nesting of arrays and objects.
pub const MAX_DEPTH: usize = 64;

/// A strict pull reader over a complete JSON document.
///
/// Beyond plain JSON it skips `//` and `/* */` comments and accepts a
/// trailing comma before `]` and `}`. Every error carries the byte position
/// it was detected at.
///
/// # Examples
///
/// ```
/// use cl_codec::json::JsonReader;
///
/// let mut reader = JsonReader::new(br#"[ {"_t": "IRoot", /* note */ "RootInt": 42,}, ]"#);
/// reader.begin_array().unwrap();
/// assert!(reader.next_item(0).unwrap());
/// reader.begin_object().unwrap();
/// assert_eq!(reader.next_property(0).unwrap().as_deref(), Some("_t"));
/// assert_eq!(reader.read_string().unwrap(), "IRoot");
/// assert_eq!(reader.next_property(1).unwrap().as_deref(), Some("RootInt"));
/// assert_eq!(reader.read_integer::<i32>("i32").unwrap(), 42);
/// assert_eq!(reader.next_property(2).unwrap(), None);
/// assert!(!reader.next_item(1).unwrap());
/// reader.finish().unwrap();
/// ```
pub struct JsonReader<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> JsonReader<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    /// Current byte offset into the input.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// An error at the current position.
    #[cold]
    pub fn error(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::at(message, self.pos)
    }

    // -------------------------------------------------------------------------
    // Trivia

    fn skip_trivia(&mut self) -> Result<(), RuntimeError> {
        loop {
            match self.input.get(self.pos) {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.pos += 1,
                Some(b'/') => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_comment(&mut self) -> Result<(), RuntimeError> {
        let start = self.pos;
        match self.input.get(start + 1) {
            Some(b'/') => {
                self.pos += 2;
                while let Some(&byte) = self.input.get(self.pos) {
                    self.pos += 1;
                    if byte == b'\n' {
                        break;
                    }
                }
                Ok(())
            }
            Some(b'*') => {
                self.pos += 2;
                loop {
                    match self.input.get(self.pos..self.pos + 2) {
                        Some([b'*', b'/']) => {
                            self.pos += 2;
                            return Ok(());
                        }
                        Some(_) => self.pos += 1,
                        None => return Err(RuntimeError::at("Comment is not terminated", start)),
                    }
                }
            }
            _ => Err(self.error("Unexpected character '/'")),
        }
    }

    /// The next significant byte, without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>, RuntimeError> {
        self.skip_trivia()?;
        Ok(self.input.get(self.pos).copied())
    }

    fn expect_byte(&mut self, byte: u8, message: &str) -> Result<(), RuntimeError> {
        if self.peek()? == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn literal(&mut self, text: &[u8]) -> bool {
        if self.input[self.pos..].starts_with(text) {
            self.pos += text.len();
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Containers

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("Maximum nesting depth of {MAX_DEPTH} is exceeded")));
        }
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, byte: u8) -> Result<bool, RuntimeError> {
        if self.peek()? == Some(byte) {
            self.pos += 1;
            self.depth -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn begin_array(&mut self) -> Result<(), RuntimeError> {
        self.expect_byte(b'[', "Start of array '[' is expected")?;
        self.enter()
    }

    pub fn begin_object(&mut self) -> Result<(), RuntimeError> {
        self.expect_byte(b'{', "Start of object '{' is expected")?;
        self.enter()
    }

    /// Moves to the next array item, `index` being the number of items read
    /// so far. Returns `false` once the array is closed.
    pub fn next_item(&mut self, index: usize) -> Result<bool, RuntimeError> {
        if self.close(b']')? {
            return Ok(false);
        }
        if index > 0 {
            self.expect_byte(b',', "Separator ',' or end of array ']' is expected")?;
            if self.close(b']')? {
                return Ok(false);
            }
        }
        if self.peek()?.is_none() {
            return Err(self.error("End of array ']' is expected"));
        }
        Ok(true)
    }

    /// Reads the next property name and its `:`, `index` being the number
    /// of properties read so far. Returns `None` once the object is closed.
    pub fn next_property(&mut self, index: usize) -> Result<Option<Cow<'a, str>>, RuntimeError> {
        if self.close(b'}')? {
            return Ok(None);
        }
        if index > 0 {
            self.expect_byte(b',', "Separator ',' or end of object '}' is expected")?;
            if self.close(b'}')? {
                return Ok(None);
            }
        }
        if self.peek()? != Some(b'"') {
            return Err(self.error("Property name is expected"));
        }
        let name = self.read_quoted()?;
        self.expect_byte(b':', "Separator ':' is expected")?;
        Ok(Some(name))
    }

    // -------------------------------------------------------------------------
    // Values

    /// Consumes a `null` literal if one comes next.
    pub fn try_read_null(&mut self) -> Result<bool, RuntimeError> {
        self.skip_trivia()?;
        Ok(self.literal(b"null"))
    }

    pub fn read_bool(&mut self) -> Result<bool, RuntimeError> {
        self.skip_trivia()?;
        if self.literal(b"true") {
            Ok(true)
        } else if self.literal(b"false") {
            Ok(false)
        } else {
            Err(self.error("Boolean value is expected"))
        }
    }

    /// Returns `true` if a string comes next.
    pub fn is_string_next(&mut self) -> Result<bool, RuntimeError> {
        Ok(self.peek()? == Some(b'"'))
    }

    /// Returns `true` if a number comes next.
    pub fn is_number_next(&mut self) -> Result<bool, RuntimeError> {
        Ok(matches!(self.peek()?, Some(b'-' | b'0'..=b'9')))
    }

    pub fn read_string(&mut self) -> Result<Cow<'a, str>, RuntimeError> {
        if !self.is_string_next()? {
            return Err(self.error("String value is expected"));
        }
        self.read_quoted()
    }

    fn read_quoted(&mut self) -> Result<Cow<'a, str>, RuntimeError> {
        let input = self.input;
        let start = self.pos;
        self.pos += 1;
        let content = self.pos;

        loop {
            match input.get(self.pos) {
                None => return Err(RuntimeError::at("String is not terminated", start)),
                Some(b'"') => {
                    let text = core::str::from_utf8(&input[content..self.pos])
                        .map_err(|_| RuntimeError::at("String is not valid UTF-8", start))?;
                    self.pos += 1;
                    return Ok(Cow::Borrowed(text));
                }
                Some(b'\\') => break,
                Some(&byte) if byte < 0x20 => return Err(self.error("Control character in string")),
                Some(_) => self.pos += 1,
            }
        }

        let mut buffer = input[content..self.pos].to_vec();
        loop {
            match input.get(self.pos) {
                None => return Err(RuntimeError::at("String is not terminated", start)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = match input.get(self.pos) {
                        Some(b'"') => '"',
                        Some(b'\\') => '\\',
                        Some(b'/') => '/',
                        Some(b'b') => '\u{08}',
                        Some(b'f') => '\u{0C}',
                        Some(b'n') => '\n',
                        Some(b'r') => '\r',
                        Some(b't') => '\t',
                        Some(b'u') => {
                            self.pos += 1;
                            let c = self.read_unicode_escape()?;
                            let mut tmp = [0_u8; 4];
                            buffer.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                            continue;
                        }
                        _ => return Err(self.error("Invalid escape sequence")),
                    };
                    self.pos += 1;
                    let mut tmp = [0_u8; 4];
                    buffer.extend_from_slice(escaped.encode_utf8(&mut tmp).as_bytes());
                }
                Some(&byte) if byte < 0x20 => return Err(self.error("Control character in string")),
                Some(&byte) => {
                    buffer.push(byte);
                    self.pos += 1;
                }
            }
        }

        String::from_utf8(buffer)
            .map(Cow::Owned)
            .map_err(|_| RuntimeError::at("String is not valid UTF-8", start))
    }

    fn read_hex4(&mut self) -> Result<u32, RuntimeError> {
        let digits = self
            .input
            .get(self.pos..self.pos + 4)
            .and_then(|d| core::str::from_utf8(d).ok())
            .filter(|d| d.bytes().all(|b| b.is_ascii_hexdigit()))
            .and_then(|d| u32::from_str_radix(d, 16).ok());
        match digits {
            Some(value) => {
                self.pos += 4;
                Ok(value)
            }
            None => Err(self.error("Invalid unicode escape sequence")),
        }
    }

    fn read_unicode_escape(&mut self) -> Result<char, RuntimeError> {
        let high = self.read_hex4()?;
        let code = match high {
            0xD800..=0xDBFF => {
                if !self.literal(b"\\u") {
                    return Err(self.error("Low surrogate is expected"));
                }
                let low = self.read_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error("Low surrogate is expected"));
                }
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.error("Unexpected low surrogate")),
            _ => high,
        };
        char::from_u32(code).ok_or_else(|| self.error("Invalid unicode escape sequence"))
    }

    /// Reads the text of a number token, validated against the JSON grammar.
    pub fn read_number(&mut self) -> Result<&'a str, RuntimeError> {
        self.skip_trivia()?;
        let input = self.input;
        let start = self.pos;
        let mut pos = start;

        let digits = |pos: &mut usize| {
            let from = *pos;
            while matches!(input.get(*pos), Some(b'0'..=b'9')) {
                *pos += 1;
            }
            *pos > from
        };

        if input.get(pos) == Some(&b'-') {
            pos += 1;
        }
        match input.get(pos) {
            Some(b'0') => pos += 1,
            Some(b'1'..=b'9') => {
                digits(&mut pos);
            }
            _ => return Err(RuntimeError::at("Number value is expected", start)),
        }
        if input.get(pos) == Some(&b'.') {
            pos += 1;
            if !digits(&mut pos) {
                return Err(RuntimeError::at("Invalid number", pos));
            }
        }
        if matches!(input.get(pos), Some(b'e' | b'E')) {
            pos += 1;
            if matches!(input.get(pos), Some(b'+' | b'-')) {
                pos += 1;
            }
            if !digits(&mut pos) {
                return Err(RuntimeError::at("Invalid number", pos));
            }
        }

        self.pos = pos;
        core::str::from_utf8(&input[start..pos]).map_err(|_| RuntimeError::at("Invalid number", start))
    }

    /// Reads a number token and parses it as `T`.
    pub fn read_integer<T: FromStr>(&mut self, type_name: &str) -> Result<T, RuntimeError> {
        self.skip_trivia()?;
        let start = self.pos;
        let text = self.read_number()?;
        text.parse::<T>()
            .map_err(|_| RuntimeError::at(format!("Unable to parse '{text}' as {type_name}"), start))
    }

    /// Fails unless only trivia is left.
    pub fn finish(&mut self) -> Result<(), RuntimeError> {
        self.skip_trivia()?;
        if self.pos < self.input.len() {
            Err(self.error("Not all bytes are consumed, trailing data found"))
        } else {
            Ok(())
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{JsonReader, MAX_DEPTH};

    #[test]
    fn strings_and_escapes() {
        let mut reader = JsonReader::new(br#" "a\"b\\c\u0041\u00e9\ud83d\ude00" "#);
        assert_eq!(reader.read_string().unwrap(), "a\"b\\cA\u{e9}\u{1F600}");
        reader.finish().unwrap();

        assert!(JsonReader::new(b"\"abc").read_string().is_err());
        assert!(JsonReader::new(b"\"\\x\"").read_string().is_err());
        assert!(JsonReader::new(b"\"\\ud83d\"").read_string().is_err());
        assert!(JsonReader::new(b"\"a\nb\"").read_string().is_err());
    }

    #[test]
    fn numbers_follow_the_grammar() {
        for ok in ["0", "-0", "42", "-4.25", "1e5", "1.5E-3"] {
            assert_eq!(JsonReader::new(ok.as_bytes()).read_number().unwrap(), ok);
        }
        for bad in ["01", "-", ".5", "1.", "1e", "+1", "Y"] {
            let mut reader = JsonReader::new(bad.as_bytes());
            assert!(reader.read_number().and_then(|_| reader.finish()).is_err(), "{bad}");
        }
        assert!(JsonReader::new(b"300").read_integer::<u8>("u8").is_err());
        assert_eq!(JsonReader::new(b"-8").read_integer::<i8>("i8").unwrap(), -8);
    }

    #[test]
    fn comments_and_trailing_commas() {
        let mut reader = JsonReader::new(b"// head\n[1, /* two */ 2,]");
        reader.begin_array().unwrap();
        let mut items = Vec::new();
        while reader.next_item(items.len()).unwrap() {
            items.push(reader.read_integer::<i32>("i32").unwrap());
        }
        assert_eq!(items, [1, 2]);
        reader.finish().unwrap();

        let mut reader = JsonReader::new(b"[1 2]");
        reader.begin_array().unwrap();
        assert!(reader.next_item(0).unwrap());
        reader.read_integer::<i32>("i32").unwrap();
        assert!(reader.next_item(1).is_err());

        assert!(JsonReader::new(b"/* open").peek().is_err());
    }

    #[test]
    fn depth_is_limited() {
        let deep = "[".repeat(MAX_DEPTH + 1);
        let mut reader = JsonReader::new(deep.as_bytes());
        for _ in 0..MAX_DEPTH {
            reader.begin_array().unwrap();
        }
        let error = reader.begin_array().unwrap_err();
        assert_eq!(error.position(), Some(MAX_DEPTH + 1));
    }

    #[test]
    fn trailing_data() {
        let mut reader = JsonReader::new(b"null Y");
        assert!(reader.try_read_null().unwrap());
        let error = reader.finish().unwrap_err();
        assert_eq!(error.position(), Some(5));
    }
}
