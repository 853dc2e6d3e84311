//! Built-in command effect table.
//!
//! Every command the dispatcher knows maps to one effect class. Argument
//! shapes use xparse-style signature letters:
//!
//! | letter | consumes                                   |
//! |--------|--------------------------------------------|
//! | `s`    | an optional `*`                            |
//! | `o`    | an optional `[...]` argument               |
//! | `m`    | one mandatory argument                     |
//! | `d`    | a TeX dimension or glue (`3pt plus 1fil`)  |
//! | `n`    | a TeX number                               |
//! | `=`    | an optional `=`                            |
//! | `t`    | one raw token                              |
//!
//! Commands missing from the table are no-ops, which is how formatting
//! commands like `\textbf{...}` keep their argument text.

use super::accents::{accent_mark, special_letter};
use phf::{phf_map, phf_set};

/// The five output markers consumed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Math,
    Ref,
    Cite,
    Case,
    Name,
}

impl Placeholder {
    pub fn as_str(self) -> &'static str {
        match self {
            Placeholder::Math => "MATH",
            Placeholder::Ref => "REF",
            Placeholder::Cite => "CITE",
            Placeholder::Case => "CASE:",
            Placeholder::Name => "NAME",
        }
    }
}

/// Macro and environment definition commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// `\newcommand`, `\renewcommand`, `\DeclareRobustCommand`
    NewCommand,
    /// `\providecommand`: defines only when absent
    ProvideCommand,
    /// `\def` and friends
    Def,
    /// `\let`
    Let,
    /// `\newenvironment`, `\renewenvironment`
    NewEnvironment,
    /// `\provideenvironment`
    ProvideEnvironment,
    /// `\newif\iffoo`
    NewIf,
    /// `\newboolean{foo}`, `\newtoggle{foo}`
    NewBoolean,
    /// `\DeclareMathOperator{\foo}{text}`
    MathOperator,
    /// `\DeclarePairedDelimiter{\abs}{\lvert}{\rvert}`
    PairedDelimiter,
}

/// Package conditionals evaluated on their literal arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalKind {
    /// `\ifthenelse{cond}{then}{else}`
    IfThenElse,
    /// `\ifstrequal{a}{b}{then}{else}` and the xstring forms
    IfStrEqual,
    /// `\ifstrempty{a}{then}{else}`, `\ifblank`
    IfStrEmpty,
    /// `\ifbool{name}{then}{else}`, `\iftoggle`
    IfBool,
    /// `\setboolean{name}{true}`, `\settoggle`
    SetBoolean,
    /// `\booltrue{name}` (true) or `\boolfalse{name}` (false)
    SetFlag(bool),
    /// `\ifdef{\cs}{then}{else}` and `\ifcsdef{cs}{then}{else}`; `defined`
    /// is false for the `undef` forms
    IfDefined { by_name: bool, defined: bool },
    /// etoolbox tests on values the interpreter does not track: consume
    /// the operands per signature, then take the false branch
    Untested(&'static str),
}

/// File inclusion commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// `\input`, `\include`, `\subfile`: `.tex` sources
    Input,
    /// `\usepackage`, `\RequirePackage`: comma-separated `.sty` names
    Package,
    /// `\documentclass`: consumed, never descended into
    DocumentClass,
}

/// What a built-in command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandEffect {
    /// Consume arguments per signature, emit nothing.
    Silent(&'static str),
    /// Consume arguments per signature, emit a placeholder.
    Placeholder(Placeholder, &'static str),
    /// Emit literal text.
    Literal(&'static str),
    /// Consume arguments per signature, emit a word gap.
    Space(&'static str),
    /// Attach a combining mark to the argument.
    Accent(char),
    Definition(DefinitionKind),
    Conditional(ConditionalKind),
    Include(IncludeKind),
    /// Text inside math (`\text`, `\mbox`): read without interpretation,
    /// feeding the final-period rule. A no-op in text mode.
    MathText,
    /// Only valid in math mode; seeing it in prose means a missing `$`.
    MathOnly,
}

/// Look up a built-in command.
pub fn effect_of(name: &str) -> Option<CommandEffect> {
    if let Some(effect) = COMMANDS.get(name) {
        return Some(*effect);
    }
    if MATH_ONLY.contains(name) {
        return Some(CommandEffect::MathOnly);
    }
    if let Some(mark) = accent_mark(name) {
        return Some(CommandEffect::Accent(mark));
    }
    special_letter(name).map(CommandEffect::Literal)
}

/// Arity a redefinition must NOT have for the command to keep its
/// placeholder behaviour. Only reference, citation and name commands are
/// protected.
pub fn protected_arity(name: &str) -> Option<usize> {
    match COMMANDS.get(name) {
        Some(CommandEffect::Placeholder(
            Placeholder::Ref | Placeholder::Cite | Placeholder::Name,
            sig,
        )) => Some(sig.chars().filter(|c| *c == 'm').count()),
        _ => None,
    }
}

/// Conditionals closed by `\fi` and decided without looking at their
/// operands: the TeX primitives, and any other `\if...` word the table
/// has no entry for. Flags from class and package files that are never
/// read (`\ifCLASSOPTIONcompsoc`) fall in the second group.
pub fn is_if_primitive(name: &str) -> bool {
    IF_PRIMITIVES.contains(name) || (name.starts_with("if") && effect_of(name).is_none())
}

static IF_PRIMITIVES: phf::Set<&'static str> = phf_set! {
    "if", "ifcat", "ifnum", "ifdim", "ifodd", "ifvmode", "ifhmode", "ifmmode",
    "ifinner", "ifvoid", "ifhbox", "ifvbox", "ifx", "ifeof", "iftrue", "iffalse",
    "ifcase", "ifdefined", "ifcsname", "iffontchar", "ifincsname", "ifpdf",
    "ifpdftex", "ifxetex", "ifluatex", "ifabsnum", "ifabsdim", "ifpdfprimitive",
    "if@twocolumn", "if@twoside", "if@filesw", "if@tempswa", "if@nobreak",
};

use CommandEffect::{
    Conditional as Cond, Definition as Def, Include as Inc, Literal as Lit, MathText,
    Placeholder as Ph, Silent as S, Space as Sp,
};

static COMMANDS: phf::Map<&'static str, CommandEffect> = phf_map! {
    // ---- References ----
    "ref" => Ph(Placeholder::Ref, "sm"),
    "eqref" => Ph(Placeholder::Ref, "m"),
    "pageref" => Ph(Placeholder::Ref, "sm"),
    "autoref" => Ph(Placeholder::Ref, "sm"),
    "Autoref" => Ph(Placeholder::Ref, "sm"),
    "cref" => Ph(Placeholder::Ref, "sm"),
    "Cref" => Ph(Placeholder::Ref, "sm"),
    "cpageref" => Ph(Placeholder::Ref, "sm"),
    "labelcref" => Ph(Placeholder::Ref, "m"),
    "crefrange" => Ph(Placeholder::Ref, "mm"),
    "Crefrange" => Ph(Placeholder::Ref, "mm"),
    "vref" => Ph(Placeholder::Ref, "sm"),
    "Vref" => Ph(Placeholder::Ref, "sm"),
    "subref" => Ph(Placeholder::Ref, "sm"),
    "thref" => Ph(Placeholder::Ref, "m"),

    // ---- Citations ----
    "cite" => Ph(Placeholder::Cite, "soom"),
    "Cite" => Ph(Placeholder::Cite, "soom"),
    "citep" => Ph(Placeholder::Cite, "soom"),
    "Citep" => Ph(Placeholder::Cite, "soom"),
    "citet" => Ph(Placeholder::Cite, "soom"),
    "Citet" => Ph(Placeholder::Cite, "soom"),
    "citealp" => Ph(Placeholder::Cite, "soom"),
    "citealt" => Ph(Placeholder::Cite, "soom"),
    "citeyear" => Ph(Placeholder::Cite, "soom"),
    "citeyearpar" => Ph(Placeholder::Cite, "soom"),
    "citenum" => Ph(Placeholder::Cite, "m"),
    "parencite" => Ph(Placeholder::Cite, "soom"),
    "Parencite" => Ph(Placeholder::Cite, "soom"),
    "textcite" => Ph(Placeholder::Cite, "soom"),
    "Textcite" => Ph(Placeholder::Cite, "soom"),
    "autocite" => Ph(Placeholder::Cite, "soom"),
    "Autocite" => Ph(Placeholder::Cite, "soom"),
    "footcite" => Ph(Placeholder::Cite, "soom"),
    "smartcite" => Ph(Placeholder::Cite, "soom"),
    "supercite" => Ph(Placeholder::Cite, "soom"),

    // ---- Names ----
    "citeauthor" => Ph(Placeholder::Name, "soom"),
    "Citeauthor" => Ph(Placeholder::Name, "soom"),
    "citename" => Ph(Placeholder::Name, "soom"),
    "nameref" => Ph(Placeholder::Name, "sm"),
    "Nameref" => Ph(Placeholder::Name, "sm"),

    // ---- Math and structure markers ----
    "ensuremath" => Ph(Placeholder::Math, "m"),
    "part" => Ph(Placeholder::Case, "som"),
    "chapter" => Ph(Placeholder::Case, "som"),
    "section" => Ph(Placeholder::Case, "som"),
    "subsection" => Ph(Placeholder::Case, "som"),
    "subsubsection" => Ph(Placeholder::Case, "som"),
    "paragraph" => Ph(Placeholder::Case, "som"),
    "subparagraph" => Ph(Placeholder::Case, "som"),
    "item" => Ph(Placeholder::Case, "o"),

    // ---- Labels, notes, front matter ----
    "label" => S("m"),
    "tag" => S("sm"),
    "nonumber" => S(""),
    "notag" => S(""),
    "footnote" => S("om"),
    "footnotemark" => S("o"),
    "footnotetext" => S("om"),
    "marginpar" => S("om"),
    "thanks" => S("m"),
    "title" => S("om"),
    "author" => S("om"),
    "date" => S("m"),
    "address" => S("m"),
    "email" => S("m"),
    "affiliation" => S("om"),
    "keywords" => S("m"),
    "subjclass" => S("om"),
    "maketitle" => S(""),
    "index" => S("m"),
    "glossary" => S("m"),
    "url" => S("m"),
    "href" => S("m"),
    "hyperref" => S("o"),
    "hypersetup" => S("m"),
    "urlstyle" => S("m"),
    "caption" => S("som"),
    "includegraphics" => S("som"),
    "bibliography" => S("m"),
    "bibliographystyle" => S("m"),
    "addbibresource" => S("om"),
    "nocite" => S("m"),
    "newtheorem" => S("somo"),
    "theoremstyle" => S("m"),
    "crefname" => S("mmm"),
    "Crefname" => S("mmm"),
    "tableofcontents" => S(""),
    "appendix" => S(""),
    "frontmatter" => S(""),
    "mainmatter" => S(""),
    "backmatter" => S(""),
    "qed" => S(""),
    "qedhere" => S(""),
    "qedsymbol" => S(""),

    // ---- Counters and lengths ----
    "setlength" => S("mm"),
    "addtolength" => S("mm"),
    "settowidth" => S("mm"),
    "settoheight" => S("mm"),
    "newlength" => S("m"),
    "setcounter" => S("mm"),
    "addtocounter" => S("mm"),
    "stepcounter" => S("m"),
    "refstepcounter" => S("m"),
    "newcounter" => S("mo"),
    "numberwithin" => S("omm"),
    "counterwithin" => S("smm"),
    "parindent" => S("=d"),
    "parskip" => S("=d"),
    "baselineskip" => S("=d"),
    "textwidth" => S("=d"),
    "linewidth" => S("=d"),
    "columnsep" => S("=d"),
    "tolerance" => S("=n"),
    "hbadness" => S("=n"),
    "clubpenalty" => S("=n"),
    "widowpenalty" => S("=n"),

    // ---- Spacing, boxes, glue ----
    "hspace" => S("sm"),
    "vspace" => S("sm"),
    "addvspace" => S("m"),
    "hskip" => S("d"),
    "vskip" => S("d"),
    "kern" => S("d"),
    "mkern" => S("d"),
    "penalty" => S("n"),
    "vfill" => S(""),
    "vfil" => S(""),
    "hss" => S(""),
    "!" => S(""),
    "/" => S(""),
    "-" => S(""),
    "@" => S(""),
    "phantom" => S("m"),
    "hphantom" => S("m"),
    "vphantom" => S("m"),
    "rule" => S("omm"),
    "raisebox" => S("moo"),
    "newpage" => S(""),
    "clearpage" => S(""),
    "cleardoublepage" => S(""),
    "pagebreak" => S("o"),
    "nopagebreak" => S("o"),
    "nolinebreak" => S("o"),
    "noindent" => S(""),
    "indent" => S(""),
    "centering" => S(""),
    "raggedright" => S(""),
    "raggedleft" => S(""),
    "allowdisplaybreaks" => S("o"),
    "pagestyle" => S("m"),
    "thispagestyle" => S("m"),
    "pagenumbering" => S("m"),
    "hline" => S(""),
    "cline" => S("m"),
    "multicolumn" => S("mm"),

    // ---- Colors and fonts ----
    "color" => S("om"),
    "textcolor" => S("om"),
    "colorbox" => S("om"),
    "pagecolor" => S("om"),
    "definecolor" => S("mmm"),
    "selectfont" => S(""),
    "fontsize" => S("mm"),
    "fontfamily" => S("m"),
    "usefont" => S("mmmm"),

    // ---- Package and class plumbing ----
    "ProvidesPackage" => S("mo"),
    "ProvidesFile" => S("mo"),
    "ProvidesClass" => S("mo"),
    "NeedsTeXFormat" => S("mo"),
    "DeclareOption" => S("smm"),
    "ProcessOptions" => S("s"),
    "ExecuteOptions" => S("m"),
    "PassOptionsToPackage" => S("mm"),
    "PassOptionsToClass" => S("mm"),
    "AtBeginDocument" => S("m"),
    "AtEndDocument" => S("m"),
    "usetikzlibrary" => S("m"),
    "graphicspath" => S("m"),
    "DeclareGraphicsExtensions" => S("m"),
    "hyphenation" => S("m"),
    "includeonly" => S("m"),

    // ---- Literal text ----
    "ldots" => Lit("..."),
    "dots" => Lit("..."),
    "textellipsis" => Lit("..."),
    "&" => Lit("&"),
    "%" => Lit("%"),
    "$" => Lit("$"),
    "#" => Lit("#"),
    "_" => Lit("_"),
    "{" => Lit("{"),
    "}" => Lit("}"),
    "S" => Lit("\u{a7}"),
    "P" => Lit("\u{b6}"),
    "textbackslash" => Lit("\\"),
    "textasciitilde" => Lit("~"),
    "textasciicircum" => Lit("^"),
    "textbar" => Lit("|"),
    "textless" => Lit("<"),
    "textgreater" => Lit(">"),
    "textendash" => Lit("\u{2013}"),
    "textemdash" => Lit("\u{2014}"),
    "textquoteleft" => Lit("\u{2018}"),
    "textquoteright" => Lit("\u{2019}"),
    "textquotedblleft" => Lit("\""),
    "textquotedblright" => Lit("\""),
    "copyright" => Lit("\u{a9}"),
    "textregistered" => Lit("\u{ae}"),
    "texttrademark" => Lit("\u{2122}"),
    "dag" => Lit("\u{2020}"),
    "ddag" => Lit("\u{2021}"),
    "pounds" => Lit("\u{a3}"),
    "euro" => Lit("\u{20ac}"),
    "textdegree" => Lit("\u{b0}"),
    "slash" => Lit("/"),
    "TeX" => Lit("TeX"),
    "LaTeX" => Lit("LaTeX"),
    "LaTeXe" => Lit("LaTeX2e"),
    "BibTeX" => Lit("BibTeX"),

    // ---- Word gaps ----
    " " => Sp(""),
    "," => Sp(""),
    ";" => Sp(""),
    ":" => Sp(""),
    "\\" => Sp("so"),
    "quad" => Sp(""),
    "qquad" => Sp(""),
    "enspace" => Sp(""),
    "enskip" => Sp(""),
    "thinspace" => Sp(""),
    "newline" => Sp(""),
    "linebreak" => Sp("o"),
    "par" => Sp(""),
    "smallskip" => Sp(""),
    "medskip" => Sp(""),
    "bigskip" => Sp(""),
    "hfill" => Sp(""),
    "hfil" => Sp(""),

    // ---- Definitions ----
    "newcommand" => Def(DefinitionKind::NewCommand),
    "renewcommand" => Def(DefinitionKind::NewCommand),
    "DeclareRobustCommand" => Def(DefinitionKind::NewCommand),
    "providecommand" => Def(DefinitionKind::ProvideCommand),
    "def" => Def(DefinitionKind::Def),
    "gdef" => Def(DefinitionKind::Def),
    "edef" => Def(DefinitionKind::Def),
    "xdef" => Def(DefinitionKind::Def),
    "let" => Def(DefinitionKind::Let),
    "newenvironment" => Def(DefinitionKind::NewEnvironment),
    "renewenvironment" => Def(DefinitionKind::NewEnvironment),
    "provideenvironment" => Def(DefinitionKind::ProvideEnvironment),
    "newif" => Def(DefinitionKind::NewIf),
    "newboolean" => Def(DefinitionKind::NewBoolean),
    "provideboolean" => Def(DefinitionKind::NewBoolean),
    "newtoggle" => Def(DefinitionKind::NewBoolean),
    "providetoggle" => Def(DefinitionKind::NewBoolean),
    "DeclareMathOperator" => Def(DefinitionKind::MathOperator),
    "DeclarePairedDelimiter" => Def(DefinitionKind::PairedDelimiter),

    // ---- Package conditionals ----
    "ifthenelse" => Cond(ConditionalKind::IfThenElse),
    "ifstrequal" => Cond(ConditionalKind::IfStrEqual),
    "IfStrEq" => Cond(ConditionalKind::IfStrEqual),
    "IfEq" => Cond(ConditionalKind::IfStrEqual),
    "ifstrempty" => Cond(ConditionalKind::IfStrEmpty),
    "ifblank" => Cond(ConditionalKind::IfStrEmpty),
    "ifbool" => Cond(ConditionalKind::IfBool),
    "iftoggle" => Cond(ConditionalKind::IfBool),
    "ifdef" => Cond(ConditionalKind::IfDefined { by_name: false, defined: true }),
    "ifundef" => Cond(ConditionalKind::IfDefined { by_name: false, defined: false }),
    "ifcsdef" => Cond(ConditionalKind::IfDefined { by_name: true, defined: true }),
    "ifcsundef" => Cond(ConditionalKind::IfDefined { by_name: true, defined: false }),
    "ifdefempty" => Cond(ConditionalKind::Untested("m")),
    "ifdefvoid" => Cond(ConditionalKind::Untested("m")),
    "ifdefmacro" => Cond(ConditionalKind::Untested("m")),
    "ifdefstring" => Cond(ConditionalKind::Untested("mm")),
    "ifcsempty" => Cond(ConditionalKind::Untested("m")),
    "ifcsstring" => Cond(ConditionalKind::Untested("mm")),
    "ifboolexpr" => Cond(ConditionalKind::Untested("m")),
    "ifinlist" => Cond(ConditionalKind::Untested("mm")),
    "ifnumcomp" => Cond(ConditionalKind::Untested("mmm")),
    "ifnumequal" => Cond(ConditionalKind::Untested("mm")),
    "ifnumgreater" => Cond(ConditionalKind::Untested("mm")),
    "ifnumless" => Cond(ConditionalKind::Untested("mm")),
    "ifnumodd" => Cond(ConditionalKind::Untested("m")),
    "ifdimcomp" => Cond(ConditionalKind::Untested("mmm")),
    "ifdimequal" => Cond(ConditionalKind::Untested("mm")),
    "setboolean" => Cond(ConditionalKind::SetBoolean),
    "setbool" => Cond(ConditionalKind::SetBoolean),
    "settoggle" => Cond(ConditionalKind::SetBoolean),
    "booltrue" => Cond(ConditionalKind::SetFlag(true)),
    "toggletrue" => Cond(ConditionalKind::SetFlag(true)),
    "boolfalse" => Cond(ConditionalKind::SetFlag(false)),
    "togglefalse" => Cond(ConditionalKind::SetFlag(false)),

    // ---- Includes ----
    "input" => Inc(IncludeKind::Input),
    "include" => Inc(IncludeKind::Input),
    "subfile" => Inc(IncludeKind::Input),
    "usepackage" => Inc(IncludeKind::Package),
    "RequirePackage" => Inc(IncludeKind::Package),
    "documentclass" => Inc(IncludeKind::DocumentClass),
    "documentstyle" => Inc(IncludeKind::DocumentClass),
    "LoadClass" => Inc(IncludeKind::DocumentClass),

    // ---- Text inside math ----
    "text" => MathText,
    "mbox" => MathText,
    "hbox" => MathText,
    "fbox" => MathText,
    "textrm" => MathText,
    "textit" => MathText,
    "textbf" => MathText,
    "textsf" => MathText,
    "texttt" => MathText,
    "textup" => MathText,
    "textsl" => MathText,
    "textsc" => MathText,
    "textnormal" => MathText,
    "emph" => MathText,
    "intertext" => MathText,
    "shortintertext" => MathText,
};

static MATH_ONLY: phf::Set<&'static str> = phf_set! {
    // structures
    "frac", "dfrac", "tfrac", "cfrac", "sqrt", "binom", "dbinom", "tbinom",
    "sum", "prod", "coprod", "int", "iint", "iiint", "oint", "lim", "limsup",
    "liminf", "sup", "inf", "log", "ln", "exp", "sin", "cos", "tan", "det",
    "left", "right", "big", "Big", "bigg", "Bigg", "bigl", "bigr", "Bigl", "Bigr",
    "overline", "overbrace", "underbrace", "hat", "widehat", "bar", "tilde",
    "widetilde", "vec", "dot", "ddot", "overrightarrow", "displaystyle",
    "pmod", "bmod", "operatorname", "mathop", "limits", "nolimits",
    // fonts
    "mathbb", "mathcal", "mathfrak", "mathscr", "mathrm", "mathbf", "mathit",
    "mathsf", "mathtt", "boldsymbol",
    // relations and operators
    "leq", "geq", "le", "ge", "neq", "ne", "ll", "gg", "in", "notin", "ni",
    "subset", "subseteq", "subsetneq", "supset", "supseteq", "cup", "cap",
    "bigcup", "bigcap", "setminus", "times", "cdot", "cdots", "vdots", "ddots",
    "infty", "partial", "nabla", "forall", "exists", "nexists", "to", "mapsto",
    "rightarrow", "Rightarrow", "leftarrow", "Leftarrow", "leftrightarrow",
    "Leftrightarrow", "longrightarrow", "Longrightarrow", "iff", "implies",
    "equiv", "approx", "sim", "simeq", "cong", "propto", "perp", "parallel",
    "pm", "mp", "circ", "oplus", "otimes", "bigoplus", "bigotimes", "wedge",
    "vee", "neg", "lnot", "emptyset", "varnothing", "langle", "rangle",
    "lfloor", "rfloor", "lceil", "rceil", "mid", "nmid", "ell", "prec", "succ",
    "preceq", "succeq", "vdash", "models",
    // greek
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta",
    "theta", "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "pi",
    "varpi", "rho", "varrho", "sigma", "varsigma", "tau", "upsilon", "phi",
    "varphi", "chi", "psi", "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi",
    "Pi", "Sigma", "Upsilon", "Phi", "Psi", "Omega",
};
