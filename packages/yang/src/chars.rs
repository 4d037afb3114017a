//! A single lexical constant `util.rs`'s identifier grammar needs by name
//! rather than as a bare `'_'` literal, kept as its own module since the
//! front end's lexer may grow more of these as it's replaced by a real
//! standalone front end later.

pub const UNDERSCORE: char = '_';
