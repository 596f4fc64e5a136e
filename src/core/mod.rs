// =============================================================================
// CORE — Le cœur algébrique : relations hiérarchiques
// =============================================================================
//
// Ce module regroupe toute la logique pure :
// pas d'E/S, pas d'état partagé — uniquement des valeurs immuables.
//
// Architecture :
//   error    → les erreurs (profondeur invalide, type incompatible, sous-profondeur)
//   value    → les valeurs associées aux clés, avant mise en forme canonique
//   relation → la relation indexée par sa profondeur (domain, codomain, eval)
//              et sa composition (relation/compose.rs)
//
// =============================================================================

pub mod error;
pub mod value;
pub mod relation;
