//! DIMACS CNF parser and writer for the indsup independent support minimizer.
//!
//! Two extensions of plain DIMACS CNF are understood:
//!
//! * Sampling set lines `c ind 1 2 3 0` (or `c p show 1 2 3 0`) listing the variables to project
//!   on. Multiple such lines are concatenated.
//! * XOR lines `x 1 -2 3 0`, stating that the XOR of the literals is true.
use std::{borrow::Borrow, io};

use indsup_formula::{Formula, Lit, Var, XorClause};

use anyhow::Error;
use thiserror::Error;

/// Possible errors while parsing a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {}: Unexpected character in DIMACS CNF input: '{}'", line, unexpected)]
    UnexpectedInput { line: usize, unexpected: char },
    #[error("line {}: Variable index is too large: {}{}...", line, index, final_digit)]
    LiteralTooLarge {
        line: usize,
        index: usize,
        final_digit: usize,
    },
    #[error("line {}: Invalid header syntax: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: Invalid sampling set line: {}", line, text)]
    InvalidSamplingSet { line: usize, text: String },
    #[error("line {}: Unterminated clause", line)]
    UnterminatedClause { line: usize },
    #[error(
        "Formula has {} variables while the header specifies {} variables",
        var_count,
        header_var_count
    )]
    VarCount {
        var_count: usize,
        header_var_count: usize,
    },
    #[error(
        "Formula has {} clauses while the header specifies {} clauses",
        clause_count,
        header_clause_count
    )]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
    #[error("Parser invoked after a previous error")]
    PreviousError,
}

/// Variable and clause count present in a DIMACS CNF header.
///
/// The clause count includes XOR lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// What the bytes of the current line are collected as.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum LineMode {
    /// Clause or XOR literals, parsed byte by byte.
    Literals,
    /// A comment, kept in `line_buffer` as it might hold a sampling set.
    Comment,
    /// The `p cnf` header, kept in `line_buffer`.
    Header,
}

/// Chunked parser for DIMACS CNF files with sampling set and XOR extensions.
pub struct DimacsParser {
    formula: Formula,
    partial_lits: Vec<Lit>,
    partial_is_xor: bool,
    header: Option<DimacsHeader>,

    line_number: usize,
    constraint_count: usize,
    partial_lit: usize,
    negate_next_lit: bool,

    mode: LineMode,
    in_lit: bool,
    start_of_line: bool,
    error: bool,

    line_buffer: Vec<u8>,
}

impl Default for DimacsParser {
    fn default() -> DimacsParser {
        DimacsParser::new()
    }
}

impl DimacsParser {
    pub fn new() -> DimacsParser {
        DimacsParser {
            formula: Formula::new(),
            partial_lits: vec![],
            partial_is_xor: false,
            header: None,

            line_number: 1,
            constraint_count: 0,
            partial_lit: 0,
            negate_next_lit: false,

            mode: LineMode::Literals,
            in_lit: false,
            start_of_line: true,
            error: false,

            line_buffer: vec![],
        }
    }

    /// Parse a complete input and check the header if present.
    pub fn parse(input: impl io::Read) -> Result<Formula, Error> {
        use io::BufRead;

        let mut buffer = io::BufReader::new(input);
        let mut parser = Self::new();

        loop {
            let data = buffer.fill_buf()?;
            if data.is_empty() {
                break;
            }
            parser.parse_chunk(data)?;
            let len = data.len();
            buffer.consume(len);
        }
        parser.eof()?;
        parser.check_header()?;

        Ok(parser.into_formula())
    }

    /// Parse a chunk of input.
    ///
    /// After the last chunk call [`eof`](DimacsParser::eof). Once an error was returned, the parser
    /// refuses further input.
    pub fn parse_chunk(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        if self.error {
            return Err(ParserError::PreviousError);
        }
        for &byte in chunk.iter() {
            if byte == b'\n' {
                self.line_number += 1;
            }

            if self.mode != LineMode::Literals {
                if byte == b'\n' || byte == b'\r' {
                    self.finish_buffered_line()?;
                    self.start_of_line = true;
                } else {
                    self.line_buffer.push(byte);
                }
                continue;
            }

            match byte {
                b'0'..=b'9' => {
                    self.in_lit = true;
                    let digit = (byte - b'0') as usize;

                    const CAN_OVERFLOW: usize = Var::max_count() / 10;
                    const OVERFLOW_DIGIT: usize = Var::max_count() % 10;

                    if CAN_OVERFLOW <= self.partial_lit {
                        let carry = (digit <= OVERFLOW_DIGIT) as usize;
                        if CAN_OVERFLOW + carry <= self.partial_lit {
                            return Err(self.fail(ParserError::LiteralTooLarge {
                                line: self.line_number,
                                index: self.partial_lit,
                                final_digit: digit,
                            }));
                        }
                    }

                    self.partial_lit = self.partial_lit * 10 + digit;
                    self.start_of_line = false
                }
                b'-' if !self.negate_next_lit && !self.in_lit => {
                    self.negate_next_lit = true;
                    self.start_of_line = false
                }
                b' ' | b'\t' | b'\n' | b'\r' if !self.negate_next_lit || self.in_lit => {
                    self.finish_literal();
                    self.negate_next_lit = false;
                    self.in_lit = false;
                    self.partial_lit = 0;
                    self.start_of_line = byte == b'\n' || byte == b'\r';
                }
                b'c' if self.start_of_line => {
                    self.mode = LineMode::Comment;
                }
                b'p' if self.start_of_line && self.header.is_none() => {
                    self.mode = LineMode::Header;
                    self.line_buffer.push(b'p');
                }
                b'x' if self.start_of_line && self.partial_lits.is_empty() => {
                    self.partial_is_xor = true;
                    self.start_of_line = false;
                }
                _ => {
                    return Err(self.fail(ParserError::UnexpectedInput {
                        line: self.line_number,
                        unexpected: byte as char,
                    }));
                }
            }
        }

        Ok(())
    }

    /// Finish parsing the input.
    ///
    /// Header counts are checked separately by [`check_header`](DimacsParser::check_header).
    pub fn eof(&mut self) -> Result<(), ParserError> {
        if self.mode != LineMode::Literals {
            self.finish_buffered_line()?;
        }

        self.finish_literal();

        if !self.partial_lits.is_empty() || self.partial_is_xor {
            return Err(ParserError::UnterminatedClause {
                line: self.line_number,
            });
        }

        Ok(())
    }

    /// Compare the parsed formula against the header, if there was one.
    pub fn check_header(&self) -> Result<(), ParserError> {
        if let Some(header) = self.header {
            let var_count = self.formula.var_count();
            if var_count != header.var_count {
                return Err(ParserError::VarCount {
                    var_count,
                    header_var_count: header.var_count,
                });
            }

            if self.constraint_count != header.clause_count {
                return Err(ParserError::ClauseCount {
                    clause_count: self.constraint_count,
                    header_clause_count: header.clause_count,
                });
            }
        }

        Ok(())
    }

    pub fn header(&self) -> Option<DimacsHeader> {
        self.header
    }

    /// Number of clauses and XOR constraints parsed.
    pub fn clause_count(&self) -> usize {
        self.constraint_count
    }

    pub fn var_count(&self) -> usize {
        self.formula.var_count()
    }

    /// The parsed formula.
    pub fn into_formula(self) -> Formula {
        self.formula
    }

    fn fail(&mut self, err: ParserError) -> ParserError {
        self.error = true;
        err
    }

    fn finish_literal(&mut self) {
        if !self.in_lit {
            return;
        }
        if self.partial_lit == 0 {
            if self.partial_is_xor {
                self.formula
                    .add_xor_clause(XorClause::from_lits(&self.partial_lits));
                self.partial_is_xor = false;
            } else {
                self.formula.cnf.add_clause(self.partial_lits.iter().cloned());
            }
            self.partial_lits.clear();
            self.constraint_count += 1;
        } else {
            self.partial_lits
                .push(Var::from_dimacs(self.partial_lit as isize).lit(!self.negate_next_lit));
        }
    }

    fn finish_buffered_line(&mut self) -> Result<(), ParserError> {
        let line = String::from_utf8_lossy(&self.line_buffer).into_owned();
        self.line_buffer.clear();
        let mode = self.mode;
        self.mode = LineMode::Literals;
        match mode {
            LineMode::Header => self.parse_header_line(line),
            LineMode::Comment => self.parse_comment_line(line),
            LineMode::Literals => Ok(()),
        }
    }

    fn parse_header_line(&mut self, header_line: String) -> Result<(), ParserError> {
        if !header_line.starts_with("p ") {
            return Err(self.invalid_header(header_line));
        }

        let mut header_values = header_line[2..].split_whitespace();

        if header_values.next() != Some("cnf") {
            return Err(self.invalid_header(header_line));
        }

        let var_count: usize = match header_values.next().and_then(|value| value.parse().ok()) {
            None => return Err(self.invalid_header(header_line)),
            Some(value) => value,
        };

        if var_count > Var::max_count() {
            return Err(self.fail(ParserError::LiteralTooLarge {
                line: self.line_number,
                index: var_count / 10,
                final_digit: var_count % 10,
            }));
        }

        let clause_count: usize = match header_values.next().and_then(|value| value.parse().ok())
        {
            None => return Err(self.invalid_header(header_line)),
            Some(value) => value,
        };

        if header_values.next().is_some() {
            return Err(self.invalid_header(header_line));
        }

        self.header = Some(DimacsHeader {
            var_count,
            clause_count,
        });
        self.formula.set_var_count(var_count);

        Ok(())
    }

    /// Sampling set lines are comments; anything else in a comment is ignored.
    fn parse_comment_line(&mut self, comment: String) -> Result<(), ParserError> {
        let mut words = comment.split_whitespace();
        let is_sampling = match words.next() {
            Some("ind") => true,
            Some("p") => words.next() == Some("show"),
            _ => false,
        };
        if !is_sampling {
            return Ok(());
        }

        let mut vars = vec![];
        let mut terminated = false;
        for word in words {
            if terminated {
                return Err(self.invalid_sampling(comment));
            }
            match word.parse::<usize>() {
                Ok(0) => terminated = true,
                Ok(number) if number <= Var::max_count() => {
                    vars.push(Var::from_dimacs(number as isize))
                }
                _ => return Err(self.invalid_sampling(comment)),
            }
        }
        if !terminated {
            return Err(self.invalid_sampling(comment));
        }

        self.formula.add_sampling_vars(vars);
        Ok(())
    }

    fn invalid_header(&mut self, header_line: String) -> ParserError {
        self.fail(ParserError::InvalidHeader {
            line: self.line_number,
            header: header_line,
        })
    }

    fn invalid_sampling(&mut self, text: String) -> ParserError {
        self.fail(ParserError::InvalidSamplingSet {
            line: self.line_number,
            text,
        })
    }
}

/// Write a DIMACS CNF header.
pub fn write_dimacs_header(target: &mut impl io::Write, header: DimacsHeader) -> io::Result<()> {
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = header.var_count,
        clause_count = header.clause_count
    )
}

/// Write a sampling set as a `c ind` line.
pub fn write_sampling_set(
    target: &mut impl io::Write,
    vars: impl IntoIterator<Item = impl Borrow<Var>>,
) -> io::Result<()> {
    target.write_all(b"c ind ")?;
    for var in vars.into_iter() {
        itoa::write(&mut *target, var.borrow().to_dimacs())?;
        target.write_all(b" ")?;
    }
    target.write_all(b"0\n")
}

/// Write clauses without a header.
pub fn write_dimacs_clauses(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = impl IntoIterator<Item = impl Borrow<Lit>>>,
) -> io::Result<()> {
    for clause in clauses.into_iter() {
        write_lits(&mut *target, clause)?;
    }
    Ok(())
}

/// Write XOR constraints as `x` lines without a header.
///
/// A false right hand side is expressed by negating the first literal.
pub fn write_xor_clauses<'a>(
    target: &mut impl io::Write,
    xors: impl IntoIterator<Item = &'a XorClause>,
) -> io::Result<()> {
    for xor in xors.into_iter() {
        target.write_all(b"x ")?;
        let flip_first = !xor.rhs;
        write_lits(
            &mut *target,
            xor.vars
                .iter()
                .enumerate()
                .map(|(pos, var)| var.lit(!(pos == 0 && flip_first))),
        )?;
    }
    Ok(())
}

fn write_lits(
    target: &mut impl io::Write,
    lits: impl IntoIterator<Item = impl Borrow<Lit>>,
) -> io::Result<()> {
    for lit in lits.into_iter() {
        itoa::write(&mut *target, lit.borrow().to_dimacs())?;
        target.write_all(b" ")?;
    }
    target.write_all(b"0\n")
}

/// Write a formula as DIMACS CNF.
///
/// The sampling set, if any, is written as a `c ind` line right after the header. Cardinality
/// constraints have no DIMACS representation and are rejected.
pub fn write_dimacs(target: &mut impl io::Write, formula: &Formula) -> io::Result<()> {
    if !formula.cards.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cardinality constraints cannot be written as DIMACS CNF",
        ));
    }
    write_dimacs_header(
        &mut *target,
        DimacsHeader {
            var_count: formula.var_count(),
            clause_count: formula.cnf.len() + formula.xors.len(),
        },
    )?;
    if let Some(sampling_set) = &formula.sampling_set {
        write_sampling_set(&mut *target, sampling_set)?;
    }
    write_dimacs_clauses(&mut *target, formula.cnf.iter())?;
    write_xor_clauses(&mut *target, formula.xors.iter())
}
