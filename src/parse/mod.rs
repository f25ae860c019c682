//! Reader for the engine's INI dialect.
//!
//! A data file is a sequence of blocks.  Each block starts with a keyword line (`Object Foo`) and
//! runs until a matching `End`; inside, each line is a field name followed by its value tokens.
//! Blocks nest: module declarations, armor sets and the like carry their own `End`.
pub mod util;

use std::str::Lines;

use self::util::{ini_bool, ini_int, ini_percent, ini_real, ini_rgb, line_tokens};
use ::errors::{ErrorKind, Result, SourceLocation, nom_to_result};
use ::util::eq_ignore_case;


/// What kind of data pass is running.  Override files (map.ini and friends) are only allowed to
/// patch existing definitions through AddModule/RemoveModule/ReplaceModule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadType {
    Normal,
    CreateOverrides,
}

impl Default for LoadType {
    fn default() -> Self {
        LoadType::Normal
    }
}

pub type FieldParser<T> = fn(&mut IniReader, &mut T) -> Result<()>;

/// Field name (compared case-insensitively) and the function that consumes the rest of its line
pub type FieldTable<T> = [(&'static str, FieldParser<T>)];

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RgbColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

pub struct IniReader<'a> {
    filename: String,
    lines: Lines<'a>,
    line_number: usize,
    tokens: Vec<&'a str>,
    cursor: usize,
    load_type: LoadType,
    block: Option<String>,
}

impl<'a> IniReader<'a> {
    pub fn new<S: Into<String>>(text: &'a str, filename: S, load_type: LoadType) -> Self {
        IniReader {
            filename: filename.into(),
            lines: text.lines(),
            line_number: 0,
            tokens: Vec::new(),
            cursor: 0,
            load_type,
            block: None,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn load_type(&self) -> LoadType {
        self.load_type
    }

    /// Remember which top-level definition is being read, for diagnostics
    pub fn set_block(&mut self, block: Option<String>) {
        self.block = block;
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            filename: self.filename.clone(),
            line: self.line_number,
            block: self.block.clone(),
        }
    }

    /// Advance to the next line that has any tokens on it.  Returns false at the end of the file.
    pub fn read_line(&mut self) -> bool {
        self.cursor = 0;
        self.tokens.clear();
        while let Some(line) = self.lines.next() {
            self.line_number += 1;
            self.tokens = line_tokens(line);
            if !self.tokens.is_empty() {
                return true;
            }
        }
        false
    }

    pub fn next_token_or_none(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    pub fn peek_token(&self) -> Option<&'a str> {
        self.tokens.get(self.cursor).cloned()
    }

    pub fn next_token(&mut self) -> Result<&'a str> {
        self.expect_token("a value")
    }

    /// Like `next_token`, but the error names what was expected
    pub fn expect_token(&mut self, whence: &'static str) -> Result<&'a str> {
        match self.next_token_or_none() {
            Some(token) => Ok(token),
            None => bail!(ErrorKind::MissingToken(whence)),
        }
    }

    /// Everything left on the current line
    pub fn rest_of_line(&mut self) -> Vec<&'a str> {
        let rest = self.tokens[self.cursor..].to_vec();
        self.cursor = self.tokens.len();
        rest
    }

    // Typed scanners for a single token

    pub fn scan_int(token: &str) -> Result<i32> {
        nom_to_result("integer", token, ini_int(token))
    }

    pub fn scan_unsigned(token: &str) -> Result<u32> {
        let value = IniReader::scan_int(token)?;
        if value < 0 {
            bail!(ErrorKind::InvalidValue("unsigned integer", token.to_owned()));
        }
        Ok(value as u32)
    }

    pub fn scan_real(token: &str) -> Result<f32> {
        nom_to_result("real number", token, ini_real(token))
    }

    pub fn scan_percent(token: &str) -> Result<f32> {
        nom_to_result("percentage", token, ini_percent(token))
    }

    pub fn scan_bool(token: &str) -> Result<bool> {
        nom_to_result("boolean", token, ini_bool(token))
    }

    /// Position of `token` in a list of names, ignoring case
    pub fn scan_index_of(token: &str, names: &[&str]) -> Result<usize> {
        match names.iter().position(|name| eq_ignore_case(name, token)) {
            Some(index) => Ok(index),
            None => bail!(ErrorKind::UnknownName("name", token.to_owned())),
        }
    }

    // Typed parsers that consume the next token(s)

    pub fn parse_int(&mut self) -> Result<i32> {
        IniReader::scan_int(self.expect_token("an integer")?)
    }

    pub fn parse_unsigned(&mut self) -> Result<u32> {
        IniReader::scan_unsigned(self.expect_token("an unsigned integer")?)
    }

    pub fn parse_real(&mut self) -> Result<f32> {
        IniReader::scan_real(self.expect_token("a real number")?)
    }

    pub fn parse_percent(&mut self) -> Result<f32> {
        IniReader::scan_percent(self.expect_token("a percentage")?)
    }

    pub fn parse_bool(&mut self) -> Result<bool> {
        IniReader::scan_bool(self.expect_token("Yes or No")?)
    }

    pub fn parse_string(&mut self) -> Result<String> {
        Ok(self.expect_token("a name")?.to_owned())
    }

    /// All remaining tokens, as owned strings
    pub fn parse_string_list(&mut self) -> Vec<String> {
        self.rest_of_line().into_iter().map(str::to_owned).collect()
    }

    pub fn parse_index_of(&mut self, names: &[&str]) -> Result<usize> {
        IniReader::scan_index_of(self.expect_token("a name")?, names)
    }

    /// `R:255 G:128 B:0`
    pub fn parse_rgb_color(&mut self) -> Result<RgbColor> {
        let joined = self.rest_of_line().join(" ");
        let (red, green, blue) = nom_to_result("color", &joined, ini_rgb(&joined))?;
        Ok(RgbColor{ red, green, blue })
    }

    /// Read field lines until `End`, handing each field name to `handler` with the reader
    /// positioned on its first value token.
    pub fn parse_block_with<F>(&mut self, whence: &'static str, mut handler: F) -> Result<()>
    where
        F: FnMut(&mut IniReader<'a>, &'a str) -> Result<()>,
    {
        loop {
            if !self.read_line() {
                bail!(ErrorKind::UnexpectedEof(whence));
            }
            let field = match self.next_token_or_none() {
                Some(field) => field,
                None => continue,
            };
            if eq_ignore_case(field, "End") {
                return Ok(());
            }
            handler(self, field)?;
        }
    }

    /// Read a block whose fields are all described by a field table.
    pub fn parse_block<T>(&mut self, target: &mut T, fields: &FieldTable<T>, whence: &'static str) -> Result<()> {
        self.parse_block_with(whence, |ini, field| {
            match fields.iter().find(|&&(name, _)| eq_ignore_case(name, field)) {
                Some(&(_, parser)) => parser(ini, target),
                None => bail!(ErrorKind::UnknownField(field.to_owned())),
            }
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        cost: u32,
        speed: f32,
        names: Vec<String>,
    }

    fn parse_cost(ini: &mut IniReader, sample: &mut Sample) -> Result<()> {
        sample.cost = ini.parse_unsigned()?;
        Ok(())
    }

    fn parse_speed(ini: &mut IniReader, sample: &mut Sample) -> Result<()> {
        sample.speed = ini.parse_real()?;
        Ok(())
    }

    fn parse_names(ini: &mut IniReader, sample: &mut Sample) -> Result<()> {
        sample.names.extend(ini.parse_string_list());
        Ok(())
    }

    const SAMPLE_FIELDS: &'static FieldTable<Sample> = &[
        ("Cost", parse_cost),
        ("Speed", parse_speed),
        ("Names", parse_names),
    ];

    #[test]
    fn reads_a_block() {
        let text = "Sample\n  cost = 300 ; comment\n\n  Speed = 1.5\n  Names = A B\n  Names = C\nEnd\n";
        let mut ini = IniReader::new(text, "sample.ini", LoadType::Normal);
        assert!(ini.read_line());
        assert_eq!(ini.next_token().unwrap(), "Sample");

        let mut sample = Sample::default();
        ini.parse_block(&mut sample, SAMPLE_FIELDS, "sample").unwrap();
        assert_eq!(sample.cost, 300);
        assert_eq!(sample.speed, 1.5);
        assert_eq!(sample.names, vec!["A", "B", "C"]);
        assert_eq!(ini.line_number(), 7);
        assert!(!ini.read_line());
    }

    #[test]
    fn unknown_field() {
        let mut ini = IniReader::new("  Colour = red\nEnd\n", "sample.ini", LoadType::Normal);
        let err = ini.parse_block(&mut Sample::default(), SAMPLE_FIELDS, "sample").unwrap_err();
        match *err.kind() {
            ErrorKind::UnknownField(ref name) => assert_eq!(name, "Colour"),
            ref other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(ini.location().line, 1);
    }

    #[test]
    fn missing_end() {
        let mut ini = IniReader::new("  Cost = 5\n", "sample.ini", LoadType::Normal);
        let err = ini.parse_block(&mut Sample::default(), SAMPLE_FIELDS, "sample").unwrap_err();
        match *err.kind() {
            ErrorKind::UnexpectedEof("sample") => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn malformed_value() {
        let mut ini = IniReader::new("  Cost = -5\nEnd\n", "sample.ini", LoadType::Normal);
        let err = ini.parse_block(&mut Sample::default(), SAMPLE_FIELDS, "sample").unwrap_err();
        match *err.kind() {
            ErrorKind::InvalidValue(_, ref token) => assert_eq!(token, "-5"),
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn colors_and_names() {
        let mut ini = IniReader::new("DisplayColor = R:12 G:34 B:56\nSorting = Vehicle\n", "x.ini", LoadType::Normal);
        assert!(ini.read_line());
        ini.next_token().unwrap();
        assert_eq!(ini.parse_rgb_color().unwrap(), RgbColor{ red: 12, green: 34, blue: 56 });
        assert!(ini.read_line());
        ini.next_token().unwrap();
        assert_eq!(ini.parse_index_of(&["NONE", "STRUCTURE", "VEHICLE"]).unwrap(), 2);
        assert!(ini.next_token_or_none().is_none());
    }
}
