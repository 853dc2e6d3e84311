//! Environment classification tables.

use phf::{phf_map, phf_set};

/// How the interpreter treats `\begin{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentClass {
    /// Collected as proof text.
    Proof,
    /// Skipped; a `MATH` placeholder stands in for the content.
    Math,
    /// Skipped without a trace (floats, tables, bibliographies).
    Delete,
    /// Skipped raw, up to its own `\end`.
    Verbatim,
    /// Content passes through; the signature's arguments are dropped.
    Transparent(&'static str),
}

/// Classify an environment name.
pub fn classify_environment(name: &str) -> EnvironmentClass {
    if is_proof_environment(name) {
        return EnvironmentClass::Proof;
    }
    let base = name.trim_end_matches('*');
    if MATH_ENVIRONMENTS.contains(base) {
        EnvironmentClass::Math
    } else if DELETE_ENVIRONMENTS.contains(base) {
        EnvironmentClass::Delete
    } else if VERBATIM_ENVIRONMENTS.contains(base) {
        EnvironmentClass::Verbatim
    } else {
        EnvironmentClass::Transparent(ENVIRONMENT_ARGUMENTS.get(base).copied().unwrap_or(""))
    }
}

/// `proof`, `proof*`, `proofof`, `IEEEproof`, `pf`, ...
pub fn is_proof_environment(name: &str) -> bool {
    name.starts_with("proof") || matches!(name, "IEEEproof" | "pf" | "pf*")
}

static MATH_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "equation", "align", "alignat", "gather", "multline", "flalign", "eqnarray",
    "displaymath", "math", "array", "cases", "dcases", "matrix", "pmatrix",
    "bmatrix", "Bmatrix", "vmatrix", "Vmatrix", "smallmatrix", "split",
    "aligned", "alignedat", "gathered", "subequations", "dmath", "dgroup",
    "empheq", "IEEEeqnarray", "xalignat", "xxalignat",
};

static DELETE_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "figure", "table", "tabular", "tabularx", "tabulary", "longtable",
    "supertabular", "thebibliography", "tikzpicture", "picture", "pspicture",
    "algorithm", "algorithmic", "algorithm2e", "wrapfigure", "wraptable",
    "subfigure", "sidewaysfigure", "sidewaystable", "tikzcd", "xy", "diagram",
    "tabbing", "filecontents", "keyword", "keywords", "abstract", "acknowledgments",
    "acknowledgements",
};

static VERBATIM_ENVIRONMENTS: phf::Set<&'static str> = phf_set! {
    "verbatim", "Verbatim", "lstlisting", "minted", "comment", "alltt",
    "code", "BVerbatim", "LVerbatim",
};

static ENVIRONMENT_ARGUMENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "minipage" => "om",
    "list" => "mm",
    "enumerate" => "o",
    "itemize" => "o",
    "description" => "o",
    "multicols" => "m",
    "thmbox" => "o",
    "center" => "",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_like_names() {
        assert!(is_proof_environment("proof"));
        assert!(is_proof_environment("proof*"));
        assert!(is_proof_environment("proofof"));
        assert!(is_proof_environment("IEEEproof"));
        assert!(!is_proof_environment("lemma"));
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify_environment("align*"), EnvironmentClass::Math);
        assert_eq!(classify_environment("figure"), EnvironmentClass::Delete);
        assert_eq!(classify_environment("lstlisting"), EnvironmentClass::Verbatim);
        assert_eq!(classify_environment("minipage"), EnvironmentClass::Transparent("om"));
        assert_eq!(classify_environment("lemma"), EnvironmentClass::Transparent(""));
    }
}
