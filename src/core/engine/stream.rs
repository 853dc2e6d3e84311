//! Index-addressable token stream with push-back.
//!
//! Tokens live in one vector with a cursor. Pushing back `k` tokens
//! rewrites the already-consumed slots in front of the cursor when there
//! are at least `k` of them and splices otherwise, so re-scanning a macro
//! expansion costs `O(k)`.

use super::token::{TexToken, TokenList};

#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<TexToken>,
    pos: usize,
    /// Tokens handed out by `next`, push-backs included. Never decreases,
    /// so runaway expansion shows up in the budget checks.
    consumed: usize,
}

impl TokenStream {
    pub fn new(tokens: TokenList) -> Self {
        Self {
            tokens: tokens.into_inner(),
            pos: 0,
            consumed: 0,
        }
    }

    /// Total tokens consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Tokens still ahead of the cursor.
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&TexToken> {
        self.tokens.get(self.pos)
    }

    /// Look `n` tokens ahead; `peek_nth(0)` is `peek()`.
    pub fn peek_nth(&self, n: usize) -> Option<&TexToken> {
        self.tokens.get(self.pos + n)
    }

    /// Consume one token.
    pub fn next(&mut self) -> Option<TexToken> {
        let slot = self.tokens.get_mut(self.pos)?;
        let token = std::mem::replace(slot, TexToken::Space);
        self.pos += 1;
        self.consumed += 1;
        Some(token)
    }

    /// Un-consume `tokens`; the first of them is the next one read.
    pub fn push_back(&mut self, tokens: Vec<TexToken>) {
        let k = tokens.len();
        if k == 0 {
            return;
        }
        if k <= self.pos {
            let start = self.pos - k;
            for (slot, token) in self.tokens[start..self.pos].iter_mut().zip(tokens) {
                *slot = token;
            }
            self.pos = start;
        } else {
            self.tokens.splice(self.pos..self.pos, tokens);
        }
    }

    pub fn push_back_one(&mut self, token: TexToken) {
        if self.pos > 0 {
            self.pos -= 1;
            self.tokens[self.pos] = token;
        } else {
            self.tokens.insert(0, token);
        }
    }

    /// Consume space tokens at the cursor.
    pub fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(TexToken::Space)) {
            self.next();
        }
    }

    /// Index of the first non-space token at or after the cursor.
    pub fn peek_past_spaces(&self) -> Option<(usize, &TexToken)> {
        self.tokens[self.pos..]
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_space())
    }

    /// Peek a braced name (`{proof*}`) starting `offset` tokens ahead
    /// without consuming it. Returns the name and the number of tokens it
    /// spans, braces included.
    pub fn peek_group_name(&self, offset: usize) -> Option<(String, usize)> {
        let mut i = self.pos + offset;
        while matches!(self.tokens.get(i), Some(TexToken::Space)) {
            i += 1;
        }
        if !matches!(self.tokens.get(i), Some(TexToken::BeginGroup)) {
            return None;
        }
        let mut name = String::new();
        i += 1;
        loop {
            match self.tokens.get(i)? {
                TexToken::EndGroup => break,
                TexToken::Char(c) => name.push(*c),
                TexToken::Space => {}
                _ => return None,
            }
            i += 1;
        }
        Some((name, i + 1 - (self.pos + offset)))
    }

    /// Consume a `{name}` group previously seen by `peek_group_name`.
    pub fn skip_tokens(&mut self, n: usize) {
        for _ in 0..n {
            if self.next().is_none() {
                break;
            }
        }
    }
}
