//! Stages 2-3 of the regex pipeline: lex tree → operator tree, with the
//! structural rewrites folded in directly (singleton-concat collapse,
//! postfix closure attachment, alternation sibling grouping).

use crate::automaton::CharClass;
use crate::error::NextractError;
use crate::regex::lexer::{ClosureSpec, LexAtom};

#[derive(Debug, Clone, Copy)]
pub enum Quantifier {
    Star,
    Plus,
    Question,
}

#[derive(Debug, Clone)]
pub enum OpTree {
    Concat(Vec<OpTree>),
    Alternation(Vec<OpTree>),
    Closure(Box<OpTree>, Quantifier),
    Literal(char),
    Set(CharClass),
    LineBegin,
    LineEnd,
}

fn concat_of(mut factors: Vec<OpTree>) -> OpTree {
    if factors.len() == 1 {
        factors.pop().unwrap()
    } else {
        OpTree::Concat(factors)
    }
}

/// Expands `{l, h}` into `l` mandatory copies plus either `h - l` optional
/// copies, or (when `h == -1`) one trailing `*` closure.
fn expand_range(operand: &OpTree, low: u32, high: i64) -> OpTree {
    let mut factors = Vec::new();
    for _ in 0..low {
        factors.push(operand.clone());
    }
    if high == -1 {
        factors.push(OpTree::Closure(Box::new(operand.clone()), Quantifier::Star));
    } else {
        for _ in 0..(high as u32).saturating_sub(low) {
            factors.push(OpTree::Closure(Box::new(operand.clone()), Quantifier::Question));
        }
    }
    concat_of(factors)
}

/// Builds the operator tree for one group's children (the atoms between a
/// matching pair of parentheses, or the whole expression at the top level).
fn build_group(atoms: &[LexAtom]) -> Result<OpTree, NextractError> {
    let segments: Vec<&[LexAtom]> = split_on_alt(atoms);
    if segments.len() > 1 {
        let mut children = Vec::with_capacity(segments.len());
        for seg in segments {
            children.push(build_concat(seg)?);
        }
        return Ok(OpTree::Alternation(children));
    }
    build_concat(atoms)
}

fn split_on_alt(atoms: &[LexAtom]) -> Vec<&[LexAtom]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, atom) in atoms.iter().enumerate() {
        if matches!(atom, LexAtom::Alt) {
            segments.push(&atoms[start..i]);
            start = i + 1;
        }
    }
    segments.push(&atoms[start..]);
    segments
}

fn build_concat(atoms: &[LexAtom]) -> Result<OpTree, NextractError> {
    let mut factors: Vec<OpTree> = Vec::new();
    for atom in atoms {
        match atom {
            LexAtom::Alt => unreachable!("alt markers are split out before build_concat"),
            LexAtom::Group(children) => factors.push(build_group(children)?),
            LexAtom::Char(c) => factors.push(OpTree::Literal(*c)),
            LexAtom::Set(class) => factors.push(OpTree::Set(class.clone())),
            LexAtom::LineBegin => factors.push(OpTree::LineBegin),
            LexAtom::LineEnd => factors.push(OpTree::LineEnd),
            LexAtom::Closure(spec) => {
                let operand = factors.pop().ok_or(NextractError::RegexSyntaxQuantifier)?;
                let node = match spec {
                    ClosureSpec::Star => OpTree::Closure(Box::new(operand), Quantifier::Star),
                    ClosureSpec::Plus => OpTree::Closure(Box::new(operand), Quantifier::Plus),
                    ClosureSpec::Question => OpTree::Closure(Box::new(operand), Quantifier::Question),
                    ClosureSpec::Range(low, high) => expand_range(&operand, *low, *high),
                };
                factors.push(node);
            }
        }
    }
    Ok(concat_of(factors))
}

pub fn parse(atoms: &[LexAtom]) -> Result<OpTree, NextractError> {
    build_group(atoms)
}
