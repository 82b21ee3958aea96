//! Coordinates of the places of an instance, stored one record per line as
//! `{'lat': 45.4642, 'lng': 9.19}`.
//!
//! Records are read with a small tokenizer, keys may use single or double quotes and come
//! in any order.

use std::path::Path;

use anyhow::{Context, anyhow, bail};

use crate::problem::node::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    OpenBrace,
    CloseBrace,
    Colon,
    Comma,
    Key(&'a str),
    Number(f64),
}

struct Tokenizer<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Tokenizer { text, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.position..]
    }

    fn single(&mut self, token: Token<'a>) -> Result<Token<'a>, anyhow::Error> {
        self.position += 1;
        Ok(token)
    }

    fn quoted(&mut self, quote: char) -> Result<Token<'a>, anyhow::Error> {
        let start = self.position + quote.len_utf8();
        let length = self.text[start..]
            .find(quote)
            .ok_or_else(|| anyhow!("unterminated key at column {}", self.position + 1))?;

        self.position = start + length + quote.len_utf8();
        Ok(Token::Key(&self.text[start..start + length]))
    }

    fn number(&mut self) -> Result<Token<'a>, anyhow::Error> {
        let length = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
            .unwrap_or(self.rest().len());
        let literal = &self.rest()[..length];

        let value: f64 = literal
            .parse()
            .map_err(|_| anyhow!("invalid number {literal:?} at column {}", self.position + 1))?;
        self.position += length;

        Ok(Token::Number(value))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let skipped = self.rest().len() - self.rest().trim_start().len();
        self.position += skipped;

        let c = self.rest().chars().next()?;

        Some(match c {
            '{' => self.single(Token::OpenBrace),
            '}' => self.single(Token::CloseBrace),
            ':' => self.single(Token::Colon),
            ',' => self.single(Token::Comma),
            '\'' | '"' => self.quoted(c),
            c if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.number(),
            c => Err(anyhow!("unexpected {c:?} at column {}", self.position + 1)),
        })
    }
}

fn expect<'a>(tokens: &mut Tokenizer<'a>, what: &str) -> Result<Token<'a>, anyhow::Error> {
    tokens
        .next()
        .ok_or_else(|| anyhow!("expected {what}, found the end of the record"))?
}

/// Parses a single `{'lat': .., 'lng': ..}` record.
pub fn parse_record(record: &str) -> Result<Coordinates, anyhow::Error> {
    let mut tokens = Tokenizer::new(record);
    let mut lat = None;
    let mut lng = None;

    if expect(&mut tokens, "'{'")? != Token::OpenBrace {
        bail!("a record starts with '{{'");
    }

    loop {
        let key = match expect(&mut tokens, "a key")? {
            Token::Key(key) => key,
            token => bail!("expected a key, found {token:?}"),
        };
        if expect(&mut tokens, "':'")? != Token::Colon {
            bail!("expected ':' after {key:?}");
        }
        let value = match expect(&mut tokens, "a number")? {
            Token::Number(value) if value.is_finite() => value,
            token => bail!("expected a finite number for {key:?}, found {token:?}"),
        };

        let slot = match key {
            "lat" => &mut lat,
            "lng" => &mut lng,
            key => bail!("unknown key {key:?}"),
        };
        if slot.replace(value).is_some() {
            bail!("duplicate key {key:?}");
        }

        match expect(&mut tokens, "',' or '}'")? {
            Token::Comma => continue,
            Token::CloseBrace => break,
            token => bail!("expected ',' or '}}', found {token:?}"),
        }
    }

    if let Some(token) = tokens.next() {
        bail!("unexpected {:?} after the record", token?);
    }

    let lat = lat.ok_or_else(|| anyhow!("missing 'lat'"))?;
    let lng = lng.ok_or_else(|| anyhow!("missing 'lng'"))?;
    if !(-90.0..=90.0).contains(&lat) {
        bail!("latitude {lat} out of range");
    }
    if !(-180.0..=180.0).contains(&lng) {
        bail!("longitude {lng} out of range");
    }

    Ok(Coordinates::new(lat, lng))
}

/// Parses every non-blank line of `text` as a record.
pub fn parse(text: &str) -> Result<Vec<Coordinates>, anyhow::Error> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_record(line.trim()).with_context(|| format!("line {}", index + 1))
        })
        .collect()
}

pub fn parse_file<P: AsRef<Path>>(file: P) -> Result<Vec<Coordinates>, anyhow::Error> {
    let path = file.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    parse(&content).with_context(|| format!("invalid place geometry {}", path.display()))
}
