// =============================================================================
// RELATION — Une relation multi-valuée, indexée par sa profondeur
// =============================================================================
//
// Une relation de profondeur N est un ensemble FINI de paires (clé, valeur) :
//   - profondeur 0 : un ensemble d'atomes terminaux {a, b, ...}
//     (on la lit comme l'identité partielle {(a, a), (b, b), ...})
//   - profondeur N : chaque clé est associée à une relation de profondeur N-1
//
// Une même clé peut apparaître plusieurs fois : c'est une RELATION, pas une
// fonction. Les valeurs d'une même clé sont réunies (union) à la construction.
//
// FORME CANONIQUE :
//   On stocke un arbre (trie) : clé → sous-relation (éventuellement vide :
//   une clé fournie avec une valeur vide reste dans le domaine).
//   Deux relations sont égales SSI elles ont la même profondeur et le même
//   contenu. L'égalité est donc STRUCTURELLE, ce qui rend le dédoublonnage
//   du codomaine correct.
//
//   Extensionnellement, une relation de profondeur N est un ensemble de
//   (N+1)-uplets d'atomes :
//     {(1, (5, 5)), (1, (6, 6))}  ≅  {[1, 5, 5], [1, 6, 6]}
//
// OPÉRATIONS :
//   domain()   → les clés distinctes
//   codomain() → les images distinctes {eval(k) : k ∈ domain}
//   eval(k)    → la sous-relation associée à k (vide si k est absente)
//   compose()  → voir compose.rs
//
// Une relation est IMMUABLE : toutes les opérations retournent de nouvelles
// valeurs.
//
// =============================================================================

mod compose;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, trace};

use super::error::{RelationError, Result};
use super::value::Value;

/// Contenu canonique d'une relation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Node<A> {
    /// Profondeur 0 : atomes terminaux
    Ground(BTreeSet<A>),
    /// Profondeur >= 1 : clé → sous-relation de profondeur N-1
    Branch(BTreeMap<A, Relation<A>>),
}

/// Une relation finie, multi-valuée, de profondeur `depth`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Relation<A> {
    depth: usize,
    node: Node<A>,
}

impl<A> Relation<A> {
    /// La relation vide de profondeur 0 : élément absorbant de la composition.
    pub const EMPTY: Self = Relation {
        depth: 0,
        node: Node::Ground(BTreeSet::new()),
    };

    /// Profondeur de la relation
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Nombre de (N+1)-uplets contenus
    pub fn len(&self) -> usize {
        match &self.node {
            Node::Ground(points) => points.len(),
            Node::Branch(children) => children.values().map(Relation::len).sum(),
        }
    }

    /// La relation est-elle vide (aucun atome, ou aucune clé) ?
    pub fn is_empty(&self) -> bool {
        match &self.node {
            Node::Ground(points) => points.is_empty(),
            Node::Branch(children) => children.is_empty(),
        }
    }

    /// Les atomes d'une relation de profondeur 0.
    ///
    /// C'est le codomaine terminal : pour l'identité partielle {(a, a)},
    /// l'ensemble des secondes composantes. `None` si la profondeur est > 0.
    pub fn points(&self) -> Option<&BTreeSet<A>> {
        match &self.node {
            Node::Ground(points) => Some(points),
            Node::Branch(_) => None,
        }
    }
}

impl<A> Default for Relation<A> {
    fn default() -> Self {
        Relation::EMPTY
    }
}

impl<A: Ord + Clone> Relation<A> {
    /// Relation vide d'une profondeur donnée
    pub fn empty(depth: usize) -> Self {
        let node = if depth == 0 {
            Node::Ground(BTreeSet::new())
        } else {
            Node::Branch(BTreeMap::new())
        };
        Relation { depth, node }
    }

    /// Relation terminale (profondeur 0) à partir d'un ensemble d'atomes
    pub fn ground(points: impl IntoIterator<Item = A>) -> Self {
        Relation {
            depth: 0,
            node: Node::Ground(points.into_iter().collect()),
        }
    }

    /// Construit une relation à partir de paires (clé, valeur) et d'une profondeur.
    ///
    /// Chaque valeur doit se lire comme une relation de profondeur `depth - 1`
    /// (voir [`Value`]). Les valeurs d'une même clé sont réunies, les paires
    /// identiques fusionnent. Une clé dont la valeur est vide reste dans le
    /// domaine : `{(2, {})}` n'est pas `{}`.
    ///
    /// À la profondeur 0 seules les paires diagonales `(a, Atom(a))` sont
    /// acceptées : une relation terminale est une identité partielle.
    /// Une paire `(a, Atom(b))` avec `a != b` donne
    /// [`RelationError::NonDiagonalGround`].
    pub fn new<I>(pairs: I, depth: i64) -> Result<Self>
    where
        I: IntoIterator<Item = (A, Value<A>)>,
    {
        let depth = checked_depth(depth)?;

        let mut relation = Relation::empty(depth);
        let mut count = 0usize;

        for (key, value) in pairs {
            count += 1;
            match &mut relation.node {
                Node::Ground(points) => match value {
                    Value::Atom(b) if b == key => {
                        points.insert(key);
                    }
                    Value::Atom(_) => {
                        debug!("paire non diagonale refusée à la profondeur 0");
                        return Err(RelationError::NonDiagonalGround);
                    }
                    other => {
                        return Err(mismatch(0, "un atome".into(), other.describe()));
                    }
                },
                Node::Branch(children) => {
                    let image = Self::lower(value, depth - 1)?;
                    children
                        .entry(key)
                        .or_insert_with(|| Relation::empty(depth - 1))
                        .absorb(&image);
                }
            }
        }

        trace!(depth, pairs = count, tuples = relation.len(), "relation construite");
        Ok(relation)
    }

    /// Construit une relation à partir de ses (depth+1)-uplets à plat.
    ///
    /// `[[1, 5, 5], [1, 6, 6]]` à la profondeur 2 donne `{(1, (5, 5)), (1, (6, 6))}`.
    /// Comme [`Relation::new`], une profondeur négative donne `InvalidDepth`.
    pub fn from_tuples<I>(tuples: I, depth: i64) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<A>>,
    {
        let depth = checked_depth(depth)?;
        let mut relation = Relation::empty(depth);
        for tuple in tuples {
            if tuple.len() != depth + 1 {
                return Err(mismatch(
                    depth,
                    format!("un uplet de longueur {}", depth + 1),
                    format!("un uplet de longueur {}", tuple.len()),
                ));
            }
            relation.insert_tuple(&tuple);
        }
        Ok(relation)
    }

    /// Lit une valeur comme une relation de profondeur `depth`.
    fn lower(value: Value<A>, depth: usize) -> Result<Self> {
        match value {
            Value::Atom(a) if depth == 0 => Ok(Relation::ground([a])),
            Value::Pair(key, rest) if depth > 0 => {
                let inner = Self::lower(*rest, depth - 1)?;
                let children = BTreeMap::from([(key, inner)]);
                Ok(Relation {
                    depth,
                    node: Node::Branch(children),
                })
            }
            Value::Nested(relation) if relation.depth == depth => Ok(relation),
            other => {
                let expected = if depth == 0 {
                    "un atome ou une relation de profondeur 0".to_string()
                } else {
                    format!("une paire ou une relation de profondeur {}", depth)
                };
                Err(mismatch(depth, expected, other.describe()))
            }
        }
    }

    /// Insère un uplet dont la longueur a déjà été vérifiée
    fn insert_tuple(&mut self, tuple: &[A]) {
        let child_depth = self.depth.saturating_sub(1);
        match (&mut self.node, tuple.split_first()) {
            (Node::Ground(points), Some((a, _))) => {
                points.insert(a.clone());
            }
            (Node::Branch(children), Some((key, rest))) => {
                children
                    .entry(key.clone())
                    .or_insert_with(|| Relation::empty(child_depth))
                    .insert_tuple(rest);
            }
            _ => {}
        }
    }

    /// Union en place avec une relation de même profondeur
    fn absorb(&mut self, other: &Relation<A>) {
        let child_depth = self.depth.saturating_sub(1);
        match (&mut self.node, &other.node) {
            (Node::Ground(mine), Node::Ground(theirs)) => {
                mine.extend(theirs.iter().cloned());
            }
            (Node::Branch(mine), Node::Branch(theirs)) => {
                for (key, sub) in theirs {
                    mine.entry(key.clone())
                        .or_insert_with(|| Relation::empty(child_depth))
                        .absorb(sub);
                }
            }
            // Profondeurs différentes : exclu par les appelants
            _ => {}
        }
    }

    /// L'ensemble des clés distinctes.
    ///
    /// Pour une relation de profondeur 0, ce sont ses atomes (identité partielle).
    pub fn domain(&self) -> BTreeSet<A> {
        match &self.node {
            Node::Ground(points) => points.clone(),
            Node::Branch(children) => children.keys().cloned().collect(),
        }
    }

    /// La clé appartient-elle au domaine ?
    pub fn contains_key(&self, key: &A) -> bool {
        match &self.node {
            Node::Ground(points) => points.contains(key),
            Node::Branch(children) => children.contains_key(key),
        }
    }

    /// L'uplet (de longueur depth+1) appartient-il à la relation ?
    pub fn contains_tuple(&self, tuple: &[A]) -> bool {
        match (&self.node, tuple.split_first()) {
            (Node::Ground(points), Some((a, []))) => points.contains(a),
            (Node::Branch(children), Some((key, rest))) => children
                .get(key)
                .is_some_and(|sub| sub.contains_tuple(rest)),
            _ => false,
        }
    }

    /// Évalue la relation en `key` : la sous-relation de profondeur N-1
    /// formée de toutes les valeurs associées à `key`.
    ///
    /// Une clé absente donne la relation vide (pas une erreur).
    pub fn eval(&self, key: &A) -> Result<Relation<A>> {
        match &self.node {
            Node::Ground(_) => Err(RelationError::DepthUnderflow { operation: "eval" }),
            Node::Branch(children) => Ok(children
                .get(key)
                .cloned()
                .unwrap_or_else(|| Relation::empty(self.depth - 1))),
        }
    }

    /// Les images distinctes `{eval(k) : k ∈ domain}`, de profondeur N-1.
    ///
    /// Deux clés de même image ne comptent qu'une fois (égalité structurelle).
    /// À la profondeur 0, voir [`Relation::points`].
    pub fn codomain(&self) -> Result<BTreeSet<Relation<A>>> {
        match &self.node {
            Node::Ground(_) => Err(RelationError::DepthUnderflow { operation: "codomain" }),
            Node::Branch(children) => Ok(children.values().cloned().collect()),
        }
    }

    /// Les clés dont l'image contient `value` dans son domaine.
    pub fn preimage(&self, value: &A) -> Result<BTreeSet<A>> {
        match &self.node {
            Node::Ground(_) => Err(RelationError::DepthUnderflow { operation: "preimage" }),
            Node::Branch(children) => Ok(children
                .iter()
                .filter(|(_, sub)| sub.contains_key(value))
                .map(|(key, _)| key.clone())
                .collect()),
        }
    }

    /// Chaque clé a-t-elle exactement une image (un seul uplet) ?
    pub fn is_functional(&self) -> Result<bool> {
        match &self.node {
            Node::Ground(_) => Err(RelationError::DepthUnderflow { operation: "is_functional" }),
            Node::Branch(children) => Ok(children.values().all(|sub| sub.len() == 1)),
        }
    }

    /// Les (N+1)-uplets de la relation, dans l'ordre croissant
    pub fn tuples(&self) -> Vec<Vec<A>> {
        match &self.node {
            Node::Ground(points) => points.iter().map(|a| vec![a.clone()]).collect(),
            Node::Branch(children) => children
                .iter()
                .flat_map(|(key, sub)| {
                    sub.tuples().into_iter().map(move |mut tuple| {
                        tuple.insert(0, key.clone());
                        tuple
                    })
                })
                .collect(),
        }
    }
}

/// Profondeur signée (entrée publique) → profondeur interne
fn checked_depth(depth: i64) -> Result<usize> {
    usize::try_from(depth).map_err(|_| {
        debug!(depth, "profondeur négative refusée");
        RelationError::InvalidDepth { depth }
    })
}

fn mismatch(depth: usize, expected: String, found: String) -> RelationError {
    debug!(depth, %expected, %found, "valeur incompatible avec la profondeur");
    RelationError::TypeMismatch {
        depth,
        expected,
        found,
    }
}

/// Affichage déterministe : `{(1, (5, 5)), (1, (6, 6))}`, ou `{3}` à la profondeur 0.
///
/// Une clé de valeur vide s'affiche `(2, {})`.
impl<A: fmt::Display + Ord + Clone> fmt::Display for Relation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.entries().join(", "))
    }
}

impl<A: fmt::Display> Relation<A> {
    /// Les éléments rendus un à un, dans l'ordre croissant
    fn entries(&self) -> Vec<String> {
        match &self.node {
            Node::Ground(points) => points.iter().map(ToString::to_string).collect(),
            Node::Branch(children) => children
                .iter()
                .flat_map(|(key, sub)| {
                    if sub.is_empty() {
                        vec![format!("({}, {{}})", key)]
                    } else {
                        sub.entries()
                            .into_iter()
                            .map(|entry| format!("({}, {})", key, entry))
                            .collect()
                    }
                })
                .collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Paires à valeurs atomiques (profondeur 1)
    fn atoms(pairs: &[(i64, i64)]) -> Vec<(i64, Value<i64>)> {
        pairs.iter().map(|&(k, v)| (k, Value::Atom(v))).collect()
    }

    /// TEST_FUNC : {(1, 1), (2, 3), (3, 2)} à la profondeur 1
    fn test_func() -> Relation<i64> {
        Relation::new(atoms(&[(1, 1), (2, 3), (3, 2)]), 1).unwrap()
    }

    /// TEST_LENS : la lentille de profondeur 2
    fn test_lens() -> Relation<i64> {
        Relation::new(
            vec![
                (1, Value::from((5, 5))),
                (1, Value::from((6, 6))),
                (2, Value::from((5, 6))),
                (2, Value::from((6, 5))),
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_func_domain_and_eval() {
        let f = test_func();
        assert_eq!(f.domain(), BTreeSet::from([1, 2, 3]));

        let image = f.eval(&2).unwrap();
        assert_eq!(image.depth(), 0);
        assert_eq!(image.points(), Some(&BTreeSet::from([3])));
    }

    #[test]
    fn test_func_codomain() {
        let f = test_func();
        let codomain = f.codomain().unwrap();
        assert_eq!(
            codomain,
            BTreeSet::from([
                Relation::ground([1]),
                Relation::ground([2]),
                Relation::ground([3]),
            ])
        );
    }

    #[test]
    fn test_lens_eval() {
        let lens = test_lens();
        let image = lens.eval(&1).unwrap();
        assert_eq!(image.depth(), 1);
        assert_eq!(image, Relation::from_tuples(vec![vec![5, 5], vec![6, 6]], 1).unwrap());
        assert_eq!(image.domain(), BTreeSet::from([5, 6]));
    }

    #[test]
    fn test_lens_codomain() {
        let lens = test_lens();
        let codomain = lens.codomain().unwrap();
        assert_eq!(codomain.len(), 2);
        assert!(codomain.contains(&lens.eval(&1).unwrap()));
        assert!(codomain.contains(&lens.eval(&2).unwrap()));
        assert!(codomain.iter().all(|r| r.depth() == 1));
    }

    #[test]
    fn test_codomain_deduplicates_equal_images() {
        let r = Relation::new(atoms(&[(1, 7), (2, 7), (3, 8)]), 1).unwrap();
        let codomain = r.codomain().unwrap();
        assert_eq!(codomain.len(), 2);
    }

    #[test]
    fn test_multi_valued_key() {
        let r = Relation::new(atoms(&[(1, 2), (1, 3), (1, 2)]), 1).unwrap();
        assert_eq!(r.len(), 2); // la paire (1, 2) en double fusionne
        assert_eq!(r.domain().len(), 1);
        assert_eq!(r.eval(&1).unwrap(), Relation::ground([2, 3]));
        assert!(!r.is_functional().unwrap());
    }

    #[test]
    fn test_eval_absent_key_is_empty() {
        let f = test_func();
        let image = f.eval(&42).unwrap();
        assert!(image.is_empty());
        assert_eq!(image.depth(), 0);

        let lens = test_lens();
        assert_eq!(lens.eval(&42).unwrap(), Relation::empty(1));
    }

    #[test]
    fn test_depth_underflow() {
        let g = Relation::ground([1, 2]);
        assert_eq!(g.eval(&1), Err(RelationError::DepthUnderflow { operation: "eval" }));
        assert_eq!(
            g.codomain(),
            Err(RelationError::DepthUnderflow { operation: "codomain" })
        );
        assert!(g.preimage(&1).is_err());
        assert!(g.is_functional().is_err());
        // Le codomaine terminal reste accessible
        assert_eq!(g.points(), Some(&BTreeSet::from([1, 2])));
    }

    #[test]
    fn test_invalid_depth() {
        let r = Relation::<i64>::new(vec![], -1);
        assert_eq!(r, Err(RelationError::InvalidDepth { depth: -1 }));
    }

    #[test]
    fn test_type_mismatch_atom_too_deep() {
        // Un atome ne peut pas être une relation de profondeur 1
        let r = Relation::new(atoms(&[(1, 1)]), 2);
        assert!(matches!(r, Err(RelationError::TypeMismatch { depth: 1, .. })));
    }

    #[test]
    fn test_type_mismatch_pair_too_shallow() {
        let r = Relation::new(vec![(1, Value::from((5, 5)))], 1);
        assert!(matches!(r, Err(RelationError::TypeMismatch { depth: 0, .. })));
    }

    #[test]
    fn test_type_mismatch_nested_depth() {
        let inner = Relation::ground([1]);
        let r = Relation::new(vec![(1, Value::Nested(inner))], 3);
        assert!(matches!(r, Err(RelationError::TypeMismatch { depth: 2, .. })));
    }

    #[test]
    fn test_depth_zero_rejects_relations_and_non_diagonal() {
        let nested = Relation::new(vec![(1, Value::Nested(Relation::ground([1])))], 0);
        assert!(matches!(nested, Err(RelationError::TypeMismatch { depth: 0, .. })));

        let skew = Relation::new(atoms(&[(1, 2)]), 0);
        assert_eq!(skew, Err(RelationError::NonDiagonalGround));

        let diagonal = Relation::new(atoms(&[(1, 1), (2, 2)]), 0).unwrap();
        assert_eq!(diagonal, Relation::ground([1, 2]));
    }

    #[test]
    fn test_nested_values_are_merged() {
        let a = Relation::from_tuples(vec![vec![5, 5]], 1).unwrap();
        let b = Relation::from_tuples(vec![vec![6, 6]], 1).unwrap();
        let r = Relation::new(vec![(1, Value::Nested(a)), (1, Value::Nested(b))], 2).unwrap();
        assert_eq!(r, Relation::from_tuples(vec![vec![1, 5, 5], vec![1, 6, 6]], 2).unwrap());
    }

    #[test]
    fn test_empty_value_keeps_key() {
        let r = Relation::new(vec![(2, Value::Nested(Relation::<i64>::EMPTY))], 1).unwrap();
        assert_eq!(r.domain(), BTreeSet::from([2]));
        assert_eq!(r.codomain().unwrap(), BTreeSet::from([Relation::EMPTY]));
        assert_eq!(r.eval(&2).unwrap(), Relation::EMPTY);
        assert_ne!(r, Relation::empty(1));
        assert!(!r.is_empty());
        assert_eq!(r.len(), 0);
        assert_eq!(r.to_string(), "{(2, {})}");
    }

    #[test]
    fn test_empty_value_next_to_other_values() {
        let lens = Relation::new(
            vec![
                (1, Value::from((5, 5))),
                (2, Value::Nested(Relation::empty(1))),
                (3, Value::pair(7, Value::Nested(Relation::EMPTY))),
            ],
            2,
        )
        .unwrap();
        assert_eq!(lens.domain(), BTreeSet::from([1, 2, 3]));
        assert_eq!(lens.eval(&2).unwrap(), Relation::empty(1));
        assert_eq!(lens.eval(&3).unwrap().domain(), BTreeSet::from([7]));
        assert_eq!(lens.codomain().unwrap().len(), 3);
        assert_eq!(lens.to_string(), "{(1, (5, 5)), (2, {}), (3, (7, {}))}");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(test_lens(), test_lens());
        // Même contenu vide, profondeurs différentes
        assert_ne!(Relation::<i64>::empty(1), Relation::empty(2));
        assert_eq!(Relation::<i64>::empty(0), Relation::EMPTY);
        assert_eq!(Relation::<i64>::default(), Relation::EMPTY);
    }

    #[test]
    fn test_clone_is_a_deep_copy() {
        let lens = test_lens();
        let copy = lens.clone();
        assert_eq!(copy.depth(), lens.depth());
        assert_eq!(copy.tuples(), lens.tuples());
    }

    #[test]
    fn test_reads_do_not_mutate() {
        let lens = test_lens();
        let before = lens.clone();
        let _ = lens.domain();
        let _ = lens.codomain();
        let _ = lens.eval(&1);
        assert_eq!(lens, before);
        assert_eq!(lens.codomain(), before.codomain());
    }

    #[test]
    fn test_from_tuples_invalid_depth() {
        let r = Relation::<i64>::from_tuples(vec![], -3);
        assert_eq!(r, Err(RelationError::InvalidDepth { depth: -3 }));
    }

    #[test]
    fn test_from_tuples_arity() {
        let r = Relation::from_tuples(vec![vec![1, 2, 3]], 1);
        assert!(matches!(r, Err(RelationError::TypeMismatch { depth: 1, .. })));
    }

    #[test]
    fn test_tuples_and_contains() {
        let lens = test_lens();
        assert_eq!(lens.len(), 4);
        assert_eq!(lens.tuples()[0], vec![1, 5, 5]);
        assert!(lens.contains_tuple(&[2, 6, 5]));
        assert!(!lens.contains_tuple(&[2, 6, 6]));
        assert!(!lens.contains_tuple(&[2, 6]));
    }

    #[test]
    fn test_preimage() {
        let f = Relation::new(atoms(&[(1, 1), (2, 3), (3, 3)]), 1).unwrap();
        assert_eq!(f.preimage(&3).unwrap(), BTreeSet::from([2, 3]));
        assert!(f.preimage(&9).unwrap().is_empty());
        assert!(f.is_functional().unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(test_func().to_string(), "{(1, 1), (2, 3), (3, 2)}");
        assert_eq!(
            test_lens().to_string(),
            "{(1, (5, 5)), (1, (6, 6)), (2, (5, 6)), (2, (6, 5))}"
        );
        assert_eq!(test_func().eval(&2).unwrap().to_string(), "{3}");
        assert_eq!(Relation::<i64>::EMPTY.to_string(), "{}");
    }

    #[test]
    fn test_concurrent_reads() {
        use std::sync::Arc;
        use std::thread;

        let lens = Arc::new(test_lens());
        let handles: Vec<_> = (1..=2)
            .map(|key| {
                let lens = Arc::clone(&lens);
                thread::spawn(move || lens.eval(&key).unwrap())
            })
            .collect();
        let images: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(images[0], lens.eval(&1).unwrap());
        assert_eq!(images[1], lens.eval(&2).unwrap());
    }
}
