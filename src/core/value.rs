// =============================================================================
// VALUE — Les valeurs qu'on associe à une clé
// =============================================================================
//
// Dans une relation de profondeur N, chaque paire (clé, valeur) porte une
// valeur qui doit se LIRE comme une relation de profondeur N-1 :
//
//   Atom(a)       → le singleton terminal {a}           (profondeur 0)
//   Pair(k, v)    → le singleton {(k, v)}               (profondeur >= 1)
//   Nested(r)     → la relation r elle-même             (profondeur de r)
//
// EXEMPLE (la "lentille" de profondeur 2) :
//   (1, (5, 5)), (1, (6, 6)), (2, (5, 6)), (2, (6, 5))
//   eval(1) = {(5, 5), (6, 6)}  — une relation de profondeur 1
//
// La vérification se fait à la construction (invariant de profondeur),
// jamais à l'usage.
//
// =============================================================================

use super::relation::Relation;

/// Une valeur associée à une clé, avant sa mise en forme canonique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value<A> {
    /// Valeur terminale (atome)
    Atom(A),
    /// Paire (clé, valeur) : un singleton d'une profondeur >= 1
    Pair(A, Box<Value<A>>),
    /// Relation déjà construite
    Nested(Relation<A>),
}

impl<A> Value<A> {
    /// Construit une paire `(key, value)`
    pub fn pair(key: A, value: impl Into<Value<A>>) -> Self {
        Value::Pair(key, Box::new(value.into()))
    }

    /// Décrit la forme de la valeur (pour les messages d'erreur)
    pub fn describe(&self) -> String {
        match self {
            Value::Atom(_) => "un atome".to_string(),
            Value::Pair(..) => "une paire".to_string(),
            Value::Nested(r) => format!("une relation de profondeur {}", r.depth()),
        }
    }
}

/// `(a, b)` → `Pair(a, Atom(b))`, la forme des paires de la lentille.
impl<A> From<(A, A)> for Value<A> {
    fn from((key, value): (A, A)) -> Self {
        Value::Pair(key, Box::new(Value::Atom(value)))
    }
}

impl<A> From<Relation<A>> for Value<A> {
    fn from(relation: Relation<A>) -> Self {
        Value::Nested(relation)
    }
}
