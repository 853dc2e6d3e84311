//! User definitions: `\newcommand`, `\def`, `\let`, `\newenvironment`,
//! `\newif` and friends.

use super::macros::{EnvironmentDef, MacroDef};
use super::token::{TexToken, TokenList};
use super::{Engine, EngineWarning};
use crate::data::commands::{effect_of, is_if_primitive, DefinitionKind};
use crate::data::environments::is_proof_environment;
use crate::utils::error::ScanResult;

/// Parameter text longer than this is not a definition being parsed but
/// a misread; the rest is left to the main loop.
const MAX_PARAMETER_TEXT: usize = 256;

impl Engine<'_> {
    pub(crate) fn define(&mut self, kind: DefinitionKind) -> ScanResult<()> {
        match kind {
            DefinitionKind::NewCommand => self.define_command(false),
            DefinitionKind::ProvideCommand => self.define_command(true),
            DefinitionKind::Def => self.define_def(),
            DefinitionKind::Let => self.define_let(),
            DefinitionKind::NewEnvironment => self.define_environment(false),
            DefinitionKind::ProvideEnvironment => self.define_environment(true),
            DefinitionKind::NewIf => {
                if let Some(TexToken::ControlSeq(name)) = self.stream.next() {
                    if let Some(flag) = name.strip_prefix("if").filter(|f| !f.is_empty()) {
                        self.state.macros.declare_conditional(flag);
                    }
                }
                Ok(())
            }
            DefinitionKind::NewBoolean => {
                let flag = self.get_arg()?.to_plain_text();
                if !flag.is_empty() {
                    self.state.macros.declare_conditional(&flag);
                }
                Ok(())
            }
            DefinitionKind::MathOperator => self.define_math_operator(),
            DefinitionKind::PairedDelimiter => self.define_paired_delimiter(),
        }
    }

    fn record(&mut self, name: &str, def: MacroDef) {
        if let Err(reason) = self.state.macros.define(name, def) {
            self.warn(EngineWarning::DefinitionRejected {
                name: name.to_string(),
                reason,
            });
        }
    }

    /// `[n]`, defaulting to zero parameters.
    fn read_arity(&mut self) -> ScanResult<usize> {
        Ok(self
            .get_optional()?
            .and_then(|n| n.to_plain_text().parse::<usize>().ok())
            .map_or(0, |n| n.min(9)))
    }

    /// `\newcommand*{\name}[n][default]{body}`
    fn define_command(&mut self, provide: bool) -> ScanResult<()> {
        self.consume_star();
        let target = self.get_arg()?;
        let arity = self.read_arity()?;
        let default = self.get_optional()?;
        let body = self.get_arg()?;
        let name = match target.first_control_seq() {
            Some(name) => name.to_string(),
            None => return Ok(()),
        };
        if provide && self.state.macros.is_defined(&name) {
            return Ok(());
        }
        let def = match default {
            Some(default) => MacroDef::with_default(arity, default, body),
            None => MacroDef::simple(arity, body),
        };
        self.record(&name, def);
        Ok(())
    }

    /// `\def\name<parameter text>{body}`; the parameter text gives the
    /// prefix and one delimiter per parameter.
    fn define_def(&mut self) -> ScanResult<()> {
        let name = match self.stream.next() {
            Some(TexToken::ControlSeq(name)) => Some(name),
            Some(TexToken::ActiveChar(_)) => None,
            Some(other) => {
                self.stream.push_back_one(other);
                return Ok(());
            }
            None => return Err(self.eof_interrupt("definition")),
        };

        let mut prefix = Vec::new();
        let mut params: Vec<Vec<TexToken>> = Vec::new();
        let mut seen = Vec::new();
        loop {
            if seen.len() > MAX_PARAMETER_TEXT {
                self.stream.push_back(seen);
                return Ok(());
            }
            let token = match self.stream.next() {
                Some(token) => token,
                None => return Err(self.eof_interrupt("definition")),
            };
            match &token {
                TexToken::BeginGroup => break,
                TexToken::Param(_) => params.push(Vec::new()),
                other => match params.last_mut() {
                    Some(delimiter) => delimiter.push(other.clone()),
                    None => prefix.push(other.clone()),
                },
            }
            seen.push(token);
        }
        let body = self.read_balanced("definition")?;

        if let Some(name) = name {
            let def = MacroDef {
                prefix,
                params,
                optional: None,
                body,
            };
            self.record(&name, def);
        }
        Ok(())
    }

    /// `\let\new = \old`
    fn define_let(&mut self) -> ScanResult<()> {
        let new = match self.stream.next() {
            Some(token) => token,
            None => return Err(self.eof_interrupt("\\let")),
        };
        self.stream.skip_spaces();
        if matches!(self.stream.peek(), Some(TexToken::Char('='))) {
            self.stream.next();
            if matches!(self.stream.peek(), Some(TexToken::Space)) {
                self.stream.next();
            }
        }
        let target = match self.stream.next() {
            Some(token) => token,
            None => return Err(self.eof_interrupt("\\let")),
        };
        let new = match new {
            TexToken::ControlSeq(name) => name,
            _ => return Ok(()),
        };
        match target {
            TexToken::ControlSeq(old) => {
                if let Some(def) = self.state.macros.lookup(&old).cloned() {
                    self.record(&new, def);
                } else if is_builtin(&old) {
                    if let Err(reason) = self.state.macros.alias_builtin(&new, &old) {
                        self.warn(EngineWarning::DefinitionRejected { name: new, reason });
                    }
                } else if new != old {
                    self.record(&new, MacroDef::alias(vec![TexToken::ControlSeq(old)]));
                }
            }
            other => self.record(&new, MacroDef::alias(vec![other])),
        }
        Ok(())
    }

    /// `\newenvironment{name}[n][default]{begin}{end}`. Proof
    /// environments keep their meaning.
    fn define_environment(&mut self, provide: bool) -> ScanResult<()> {
        self.consume_star();
        let name = self.get_arg()?.to_plain_text();
        let arity = self.read_arity()?;
        let default = self.get_optional()?;
        let begin = self.get_arg()?;
        let end = self.get_arg()?;
        if name.is_empty() {
            return Ok(());
        }
        if is_proof_environment(&name) {
            self.warn(EngineWarning::ProofRedefinitionIgnored { name });
            return Ok(());
        }
        if provide && self.state.macros.has_environment(&name) {
            return Ok(());
        }
        let begin = match default {
            Some(default) => MacroDef::with_default(arity, default, begin),
            None => MacroDef::simple(arity, begin),
        };
        self.state
            .macros
            .define_environment(&name, EnvironmentDef { begin, end });
        Ok(())
    }

    /// `\DeclareMathOperator*{\name}{text}`
    fn define_math_operator(&mut self) -> ScanResult<()> {
        self.consume_star();
        let target = self.get_arg()?;
        let text = self.get_arg()?;
        if let Some(name) = target.first_control_seq() {
            let mut body = vec![TexToken::ControlSeq("operatorname".into()), TexToken::BeginGroup];
            body.extend(text.into_inner());
            body.push(TexToken::EndGroup);
            let name = name.to_string();
            self.record(&name, MacroDef::simple(0, TokenList::from_vec(body)));
        }
        Ok(())
    }

    /// `\DeclarePairedDelimiter{\name}{left}{right}`: `\name{x}` becomes
    /// `\left<left> x \right<right>`.
    fn define_paired_delimiter(&mut self) -> ScanResult<()> {
        let target = self.get_arg()?;
        let left = self.get_arg()?;
        let right = self.get_arg()?;
        if let Some(name) = target.first_control_seq() {
            let mut body = vec![TexToken::ControlSeq("left".into())];
            body.extend(left.into_inner());
            body.push(TexToken::Param(1));
            body.push(TexToken::ControlSeq("right".into()));
            body.extend(right.into_inner());
            let name = name.to_string();
            self.record(&name, MacroDef::simple(1, TokenList::from_vec(body)));
        }
        Ok(())
    }
}

/// A name the interpreter gives meaning to without a user definition.
pub(crate) fn is_builtin(name: &str) -> bool {
    effect_of(name).is_some() || is_if_primitive(name) || super::dispatch::is_special(name)
}
