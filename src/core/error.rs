// =============================================================================
// ERROR — Les erreurs de l'algèbre de relations
// =============================================================================
//
// Quatre familles d'erreurs seulement :
//   - InvalidDepth      → profondeur négative à la construction
//   - TypeMismatch      → une valeur ne correspond pas à la profondeur déclarée
//   - NonDiagonalGround → paire (a, b), a != b, à la profondeur 0
//   - DepthUnderflow    → eval/codomain sur une relation de profondeur 0
//
// La composition de profondeurs différentes n'est PAS une erreur : elle
// retourne EMPTY (l'élément absorbant). L'algèbre reste totale.
//
// =============================================================================

use thiserror::Error;

/// Erreur de construction ou d'opération sur une relation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    /// Profondeur négative demandée à la construction
    #[error("profondeur invalide : {depth} (une relation a une profondeur >= 0)")]
    InvalidDepth { depth: i64 },

    /// Une valeur ne peut pas être lue comme une relation de la profondeur attendue
    #[error("valeur incompatible avec la profondeur {depth} : attendu {expected}, trouvé {found}")]
    TypeMismatch {
        depth: usize,
        expected: String,
        found: String,
    },

    /// Paire `(a, b)` avec `a != b` dans une relation de profondeur 0.
    ///
    /// Une relation terminale est une identité partielle `{(a, a)}`.
    #[error("paire non diagonale à la profondeur 0 (identité partielle attendue)")]
    NonDiagonalGround,

    /// Opération qui descend d'un niveau, appliquée à une relation terminale
    #[error("{operation} impossible sur une relation de profondeur 0")]
    DepthUnderflow { operation: &'static str },
}

pub type Result<T> = std::result::Result<T, RelationError>;

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = RelationError::InvalidDepth { depth: -2 };
        assert!(e.to_string().contains("-2"));

        let e = RelationError::DepthUnderflow { operation: "eval" };
        assert_eq!(e.to_string(), "eval impossible sur une relation de profondeur 0");

        let e = RelationError::TypeMismatch {
            depth: 1,
            expected: "un atome".into(),
            found: "une paire".into(),
        };
        assert!(e.to_string().contains("profondeur 1"));
        assert!(e.to_string().contains("une paire"));

        let e = RelationError::NonDiagonalGround;
        assert!(e.to_string().contains("profondeur 0"));
    }
}
