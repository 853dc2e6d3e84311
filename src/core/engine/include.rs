//! `\input`, `\include`, `\usepackage` and `\documentclass`
//!
//! A followed include is lexed and spliced into the stream in front of the
//! cursor, closed by an end-of-input marker that pops the include stack.

use super::lexer::lex_source;
use super::token::TexToken;
use super::{Engine, EngineWarning};
use crate::data::commands::IncludeKind;
use crate::utils::decode::decode_source;
use crate::utils::error::ScanResult;
use crate::utils::files::{include_candidates, FileResolveError};

impl Engine<'_> {
    pub(crate) fn include(&mut self, kind: IncludeKind) -> ScanResult<()> {
        match kind {
            IncludeKind::DocumentClass => {
                self.consume_signature("om")?;
                self.get_optional()?;
            }
            IncludeKind::Package => {
                self.get_optional()?;
                let names = self.get_arg()?.to_plain_text();
                self.get_optional()?;
                let names: Vec<&str> = names.split(',').map(str::trim).collect();
                self.follow_packages(&names);
            }
            IncludeKind::Input => {
                let target = self.input_target()?;
                self.follow_include(&target, kind);
            }
        }
        Ok(())
    }

    /// `\input{file}` or `\input file`.
    fn input_target(&mut self) -> ScanResult<String> {
        self.stream.skip_spaces();
        if matches!(self.stream.peek(), Some(TexToken::BeginGroup)) {
            return Ok(self.get_arg()?.to_plain_text());
        }
        let mut target = String::new();
        while let Some(TexToken::Char(c)) = self.stream.peek() {
            target.push(*c);
            self.stream.next();
        }
        Ok(target)
    }

    fn current_file(&self) -> &str {
        self.state.includes.last().map_or("", String::as_str)
    }

    /// Splice `target` into the stream if it is a local file worth reading.
    fn follow_include(&mut self, target: &str, kind: IncludeKind) {
        if let Some((path, tokens)) = self.load_include(target, kind) {
            self.splice_include(path, tokens);
        }
    }

    /// `\usepackage{a,b,c}` reads the packages left to right. Once `a` is
    /// spliced in, `\usepackage{b,c}` is queued behind its end of input, so
    /// `b` is read after `a` and resolved against the including file.
    fn follow_packages(&mut self, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            if let Some((path, mut tokens)) = self.load_include(name, IncludeKind::Package) {
                let rest = &names[i + 1..];
                if !rest.is_empty() {
                    tokens.push(TexToken::ControlSeq("usepackage".into()));
                    tokens.push(TexToken::BeginGroup);
                    tokens.extend(rest.join(",").chars().map(TexToken::Char));
                    tokens.push(TexToken::EndGroup);
                }
                self.splice_include(path, tokens);
                return;
            }
        }
    }

    fn splice_include(&mut self, path: String, tokens: Vec<TexToken>) {
        self.stream.push_back(tokens);
        self.state.includes.push(path);
    }

    /// The resolved path and tokens of `target`, closed by an end-of-input
    /// marker. `None` when it is not followed or cannot be read.
    fn load_include(
        &mut self,
        target: &str,
        kind: IncludeKind,
    ) -> Option<(String, Vec<TexToken>)> {
        if target.is_empty() || !self.config.follow_includes {
            return None;
        }
        if self.config.stdlib.is_known(target) {
            log::trace!("not descending into distribution file '{}'", target);
            return None;
        }
        let depth = self.state.includes.len().saturating_sub(1);
        if depth >= self.config.max_include_depth {
            self.warn(EngineWarning::IncludeDepthExceeded {
                target: target.to_string(),
                depth,
            });
            return None;
        }

        let base = self.current_file().to_string();
        for candidate in include_candidates(target, kind) {
            let path = self.resolver.resolve(&base, &candidate);
            match self.resolver.read_bytes(&path) {
                Ok(bytes) => {
                    log::debug!("{}: including {}", base, path);
                    let text = decode_source(&bytes);
                    let mut tokens = lex_source(&text, &path, &self.config.fixups).into_inner();
                    tokens.push(TexToken::EndOfInput);
                    return Some((path, tokens));
                }
                Err(FileResolveError::NotFound(_)) => continue,
                Err(err) => {
                    log::warn!("{}: cannot read {}: {}", base, path, err);
                    self.warn(EngineWarning::IncludeUnreadable {
                        path,
                        message: err.to_string(),
                    });
                    return None;
                }
            }
        }
        log::warn!("{}: cannot find include target '{}'", base, target);
        self.warn(EngineWarning::IncludeMissing {
            target: target.to_string(),
            from: base,
        });
        None
    }

    /// End of an included file.
    pub(crate) fn leave_include(&mut self) {
        if self.state.includes.len() > 1 {
            self.state.includes.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ExtractOptions;
    use crate::core::engine::Closer;
    use crate::utils::files::MemoryFileResolver;
    use pretty_assertions::assert_eq;

    fn defined_after(
        source: &str,
        resolver: &MemoryFileResolver,
        options: &ExtractOptions,
    ) -> Vec<String> {
        let mut engine = Engine::new(source, "paper/main.tex", options, resolver);
        engine.scan(&Closer::EndOfFile).unwrap();
        let mut names: Vec<String> = ["A", "B", "C"]
            .iter()
            .filter(|n| engine.state.macros.lookup(n).is_some())
            .map(|n| n.to_string())
            .collect();
        names.extend(engine.context.warnings.iter().map(|w| format!("{:?}", w)));
        names
    }

    #[test]
    fn test_input_relative_to_including_file() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("paper/defs.tex", "\\newcommand{\\A}{a}\\input{sub/more}");
        resolver.add_file("paper/sub/more.tex", "\\newcommand{\\B}{b}");
        let options = ExtractOptions::default();
        assert_eq!(
            defined_after("\\input{defs}", &resolver, &options),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn test_input_bare_name_and_package() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("paper/defs.tex", "\\newcommand{\\A}{a}");
        resolver.add_file(
            "paper/mystyle.sty",
            "\\ProvidesPackage{mystyle}\\newcommand{\\B}{b}",
        );
        let options = ExtractOptions::default();
        assert_eq!(
            defined_after(
                "\\input defs \\usepackage[opt]{amsmath,mystyle}",
                &resolver,
                &options
            ),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn test_packages_read_in_order() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file(
            "paper/mydefs.sty",
            "\\newcommand{\\A}{alpha}\\newcommand{\\B}{one}",
        );
        resolver.add_file("paper/myfix.sty", "\\renewcommand{\\B}{beta}");
        resolver.add_file("paper/sub/nested.sty", "");
        resolver.add_file("paper/sub/ourstyle.sty", "\\newcommand{\\C}{stray}");
        let options = ExtractOptions::default();
        let mut engine = Engine::new(
            "\\usepackage{sub/nested,ourstyle}\\usepackage{mydefs,myfix}",
            "paper/main.tex",
            &options,
            &resolver,
        );
        engine.scan(&Closer::EndOfFile).unwrap();
        assert_eq!(
            engine.state.macros.lookup("B").map(|d| d.body.to_string()),
            Some("beta".to_string())
        );
        assert!(engine.state.macros.lookup("A").is_some());
        assert!(engine.state.macros.lookup("C").is_none());
        assert_eq!(engine.state.includes, vec!["paper/main.tex".to_string()]);
    }

    #[test]
    fn test_missing_include_warns_and_continues() {
        let resolver = MemoryFileResolver::new();
        let options = ExtractOptions::default();
        let source = "\\input{nothere} \\newcommand{\\C}{c}";
        let mut engine = Engine::new(source, "main.tex", &options, &resolver);
        engine.scan(&Closer::EndOfFile).unwrap();
        assert!(engine.state.macros.lookup("C").is_some());
        assert_eq!(
            engine.context.warnings,
            vec![EngineWarning::IncludeMissing {
                target: "nothere".into(),
                from: "main.tex".into()
            }]
        );
    }

    #[test]
    fn test_include_depth_limit() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("loop.tex", "\\input{loop}");
        let options = ExtractOptions::default();
        let mut engine = Engine::new("\\input{loop}", "main.tex", &options, &resolver);
        engine.scan(&Closer::EndOfFile).unwrap();
        assert_eq!(
            engine.context.warnings,
            vec![EngineWarning::IncludeDepthExceeded {
                target: "loop".into(),
                depth: 5
            }]
        );
        assert_eq!(engine.state.includes.len(), 1);
    }

    #[test]
    fn test_includes_disabled() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("defs.tex", "\\newcommand{\\A}{a}");
        let options = ExtractOptions::no_includes();
        let mut engine = Engine::new("\\input{defs}", "main.tex", &options, &resolver);
        engine.scan(&Closer::EndOfFile).unwrap();
        assert!(engine.state.macros.lookup("A").is_none());
        assert!(engine.context.warnings.is_empty());
    }
}
