// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX shell escaping for command lines sent to remote shells

/// Characters POSIX requires to be quoted:
/// `| & ; < > ( ) $ ` \ " '`, space, tab and newline.
const SPECIAL: &[char] = &['|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', ' ', '\t', '\n'];

/// Backslash-escape every shell-special character of `s`.
pub fn shell_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Program name followed by escaped arguments, separated by spaces.
///
/// The program name is not escaped: it is either a command chosen by the job
/// author or a path the runner built itself.
pub fn shell_join(name: &str, args: &[String]) -> String {
    let mut line = String::from(name);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_escape(arg));
    }
    line
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
