// =============================================================================
// CATREL — Algèbre de relations hiérarchiques en Rust
// =============================================================================
//
// Catrel modélise des relations FINIES et MULTI-VALUÉES comme des valeurs
// de premier ordre, qui peuvent elles-mêmes être les valeurs d'autres
// relations. On obtient une hiérarchie indexée par la profondeur :
//
//   profondeur 0 → ensemble d'atomes (identité partielle)
//   profondeur 1 → atome ↦ atomes              (relation binaire)
//   profondeur N → atome ↦ relation de profondeur N-1
//
// Opérations : domain, codomain, eval, compose (+ union, preimage...).
//
// Architecture :
//   core/ → l'algèbre pure (relations, valeurs, erreurs)
//   main  → une démonstration qui construit et affiche des relations
//
// =============================================================================

pub mod core;

pub use crate::core::error::{RelationError, Result};
pub use crate::core::relation::Relation;
pub use crate::core::value::Value;
