//! Stage 1 of the regex pipeline: text → lex tree.
//!
//! Parentheses (and the `[...]` bracket expression, treated as a
//! parenthesis whose close must be `]`) create nested groups; everything
//! else is a flat atom within its enclosing group.

use crate::automaton::CharClass;
use crate::error::NextractError;

#[derive(Debug, Clone)]
pub enum ClosureSpec {
    Star,
    Plus,
    Question,
    /// `{l, h}`, `h == -1` denotes unbounded.
    Range(u32, i64),
}

#[derive(Debug, Clone)]
pub enum LexAtom {
    Group(Vec<LexAtom>),
    Alt,
    Closure(ClosureSpec),
    Char(char),
    Set(CharClass),
    LineBegin,
    LineEnd,
}

fn class_digit(negate: bool) -> CharClass {
    CharClass::new(vec![('0', '9')], negate)
}

fn class_space(negate: bool) -> CharClass {
    CharClass::new(vec![(' ', ' '), ('\t', '\t'), ('\n', '\n'), ('\r', '\r'), ('\x0b', '\x0c')], negate)
}

fn class_word(negate: bool) -> CharClass {
    CharClass::new(vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')], negate)
}

fn class_any() -> CharClass {
    CharClass::new(vec![('\n', '\n')], true)
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    _src: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Lexer<'a> {
        Lexer { chars: src.chars().collect(), pos: 0, _src: src }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn parse_group(&mut self, in_group: bool) -> Result<Vec<LexAtom>, NextractError> {
        let mut atoms = Vec::new();
        loop {
            match self.peek() {
                None => {
                    if in_group {
                        return Err(NextractError::RegexSyntaxParens);
                    }
                    return Ok(atoms);
                }
                Some(')') => {
                    if in_group {
                        self.bump();
                        return Ok(atoms);
                    }
                    return Err(NextractError::RegexSyntaxParens);
                }
                Some('(') => {
                    self.bump();
                    let children = self.parse_group(true)?;
                    atoms.push(LexAtom::Group(children));
                }
                Some('[') => {
                    self.bump();
                    atoms.push(self.parse_bracket()?);
                }
                Some('|') => {
                    self.bump();
                    atoms.push(LexAtom::Alt);
                }
                Some('^') => {
                    self.bump();
                    atoms.push(LexAtom::LineBegin);
                }
                Some('$') => {
                    self.bump();
                    atoms.push(LexAtom::LineEnd);
                }
                Some('.') => {
                    self.bump();
                    atoms.push(LexAtom::Set(class_any()));
                }
                Some('*') => {
                    self.bump();
                    atoms.push(LexAtom::Closure(ClosureSpec::Star));
                }
                Some('+') => {
                    self.bump();
                    atoms.push(LexAtom::Closure(ClosureSpec::Plus));
                }
                Some('?') => {
                    self.bump();
                    atoms.push(LexAtom::Closure(ClosureSpec::Question));
                }
                Some('{') => {
                    self.bump();
                    atoms.push(self.parse_quantifier()?);
                }
                Some('\\') => {
                    self.bump();
                    atoms.push(self.parse_escape()?);
                }
                Some(c) => {
                    self.bump();
                    atoms.push(LexAtom::Char(c));
                }
            }
        }
    }

    fn parse_escape(&mut self) -> Result<LexAtom, NextractError> {
        match self.bump() {
            Some('s') => Ok(LexAtom::Set(class_space(false))),
            Some('S') => Ok(LexAtom::Set(class_space(true))),
            Some('w') => Ok(LexAtom::Set(class_word(false))),
            Some('W') => Ok(LexAtom::Set(class_word(true))),
            Some('d') => Ok(LexAtom::Set(class_digit(false))),
            Some('D') => Ok(LexAtom::Set(class_digit(true))),
            Some('b') => Ok(LexAtom::Char('\u{0}')), // word boundary reserved; not matched literally in practice
            Some(c) => Ok(LexAtom::Char(c)),
            None => Err(NextractError::RegexSyntaxParens),
        }
    }

    fn parse_quantifier(&mut self) -> Result<LexAtom, NextractError> {
        let mut low_digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                low_digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if low_digits.is_empty() {
            return Err(NextractError::RegexSyntaxQuantifier);
        }
        let low: u32 = low_digits.parse().map_err(|_| NextractError::RegexSyntaxQuantifier)?;
        let high: i64 = match self.peek() {
            Some(',') => {
                self.bump();
                let mut high_digits = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        high_digits.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                if high_digits.is_empty() {
                    -1
                } else {
                    high_digits.parse().map_err(|_| NextractError::RegexSyntaxQuantifier)?
                }
            }
            _ => low as i64,
        };
        if self.bump() != Some('}') {
            return Err(NextractError::RegexSyntaxQuantifier);
        }
        if high != -1 && (high as u32) < low {
            return Err(NextractError::RegexSyntaxQuantifier);
        }
        Ok(LexAtom::Closure(ClosureSpec::Range(low, high)))
    }

    fn same_script(lo: char, hi: char) -> bool {
        (lo.is_ascii_lowercase() && hi.is_ascii_lowercase())
            || (lo.is_ascii_uppercase() && hi.is_ascii_uppercase())
            || (lo.is_ascii_digit() && hi.is_ascii_digit())
    }

    fn parse_bracket(&mut self) -> Result<LexAtom, NextractError> {
        let negated = if self.peek() == Some('^') {
            self.bump();
            true
        } else {
            false
        };
        let mut ranges: Vec<(char, char)> = Vec::new();
        loop {
            match self.peek() {
                None => return Err(NextractError::RegexSyntaxParens),
                Some(']') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.parse_escape()? {
                        LexAtom::Set(class) if !class.negated() => ranges.extend(class.into_ranges()),
                        LexAtom::Set(_) => return Err(NextractError::RegexSyntaxCharset),
                        LexAtom::Char(c) => ranges.push((c, c)),
                        _ => return Err(NextractError::RegexSyntaxCharset),
                    }
                }
                Some(c) => {
                    self.bump();
                    if self.peek() == Some('-') && self.chars.get(self.pos + 1).copied() != Some(']') && self.chars.get(self.pos + 1).is_some() {
                        self.bump();
                        let hi = self.bump().ok_or(NextractError::RegexSyntaxRange)?;
                        if hi < c {
                            return Err(NextractError::RegexSyntaxRange);
                        }
                        if !Lexer::same_script(c, hi) {
                            return Err(NextractError::RegexSyntaxCharset);
                        }
                        ranges.push((c, hi));
                    } else {
                        ranges.push((c, c));
                    }
                }
            }
        }
        if ranges.is_empty() {
            return Err(NextractError::RegexSyntaxCharset);
        }
        Ok(LexAtom::Set(CharClass::new(ranges, negated)))
    }
}

pub fn lex(expr: &str) -> Result<Vec<LexAtom>, NextractError> {
    let mut lexer = Lexer::new(expr);
    lexer.parse_group(false)
}
