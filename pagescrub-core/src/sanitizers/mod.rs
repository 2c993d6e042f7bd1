//! Rule compilation and application.
//!
//! Scrub rules are compiled into case-insensitive regular expressions and
//! applied strictly in list order, each rule scanning the output of the one
//! before it. This module works closely with `config` (rule definitions) and
//! `sanitizer` (which decides where in a document the rules run).

pub mod compiler;
