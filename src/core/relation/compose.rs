// =============================================================================
// COMPOSE — Composition relationnelle, union et identité
// =============================================================================
//
// (f ∘ g)(x) : on applique g à x, puis f à chaque clé obtenue, et on réunit
// les résultats. C'est la composition RELATIONNELLE (multi-valuée), pas la
// composition de fonctions.
//
// Par profondeur :
//   - profondeurs différentes → EMPTY (l'algèbre reste totale)
//   - profondeur 0            → identités partielles : f ∘ g = f ∩ g
//   - profondeur 1            → {(a, c) : (a, b) ∈ g, (b, c) ∈ f}
//   - profondeur N >= 2       → (f ∘ g)(x) = ⋃ { f(y) : y ∈ dom(g(x)) }
//
// ASSOCIATIVITÉ : dom(⋃ rᵢ) = ⋃ dom(rᵢ), donc
//   ((f ∘ g) ∘ h)(x) = ⋃_{y ∈ dom h(x)} ⋃_{z ∈ dom g(y)} f(z) = (f ∘ (g ∘ h))(x)
// et la forme canonique rend l'égalité structurelle.
//
// =============================================================================

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{Node, Relation};

impl<A: Ord + Clone> Relation<A> {
    /// L'identité de profondeur 1 sur un ensemble d'atomes : `{(a, a)}`.
    pub fn identity(points: impl IntoIterator<Item = A>) -> Self {
        let children = points
            .into_iter()
            .map(|a| (a.clone(), Relation::ground([a])))
            .collect();
        Relation {
            depth: 1,
            node: Node::Branch(children),
        }
    }

    /// Compose `self ∘ other` : appliquer `other`, puis `self`.
    ///
    /// Fonction totale : si les profondeurs diffèrent, le résultat est
    /// [`Relation::EMPTY`].
    pub fn compose(&self, other: &Relation<A>) -> Relation<A> {
        if self.depth != other.depth {
            debug!(
                left = self.depth,
                right = other.depth,
                "profondeurs différentes : composition absorbée par EMPTY"
            );
            return Relation::EMPTY;
        }

        let composed = match (&self.node, &other.node) {
            (Node::Ground(mine), Node::Ground(theirs)) => {
                Relation::ground(mine.intersection(theirs).cloned())
            }
            (Node::Branch(mine), Node::Branch(theirs)) => {
                let mut children = BTreeMap::new();
                for (x, image) in theirs {
                    let mut acc = Relation::empty(self.depth - 1);
                    for y in image.domain() {
                        if let Some(next) = mine.get(&y) {
                            acc.absorb(next);
                        }
                    }
                    if !acc.is_empty() {
                        children.insert(x.clone(), acc);
                    }
                }
                Relation {
                    depth: self.depth,
                    node: Node::Branch(children),
                }
            }
            _ => Relation::empty(self.depth),
        };

        trace!(depth = composed.depth, tuples = composed.len(), "composition");
        composed
    }

    /// Union de deux relations de même profondeur.
    ///
    /// Comme pour [`Relation::compose`], des profondeurs différentes donnent EMPTY.
    pub fn union(&self, other: &Relation<A>) -> Relation<A> {
        if self.depth != other.depth {
            debug!(
                left = self.depth,
                right = other.depth,
                "profondeurs différentes : union absorbée par EMPTY"
            );
            return Relation::EMPTY;
        }
        let mut merged = self.clone();
        merged.absorb(other);
        merged
    }
}
